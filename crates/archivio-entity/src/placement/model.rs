//! Placement entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::target::TargetKind;

/// Records that an external object resides (or resided) in a location.
///
/// For a given `(target_kind, target_id)` at most one placement is
/// `active` at any time; closed placements form the history trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Placement {
    /// Unique placement identifier.
    pub id: Uuid,
    /// Which external entity type the target belongs to.
    pub target_kind: TargetKind,
    /// The external entity's stable identifier.
    pub target_id: i64,
    /// The location the target sits in.
    pub location_id: Uuid,
    /// Whether this is the target's current placement.
    pub active: bool,
    /// When the target was shelved here.
    pub valid_from: DateTime<Utc>,
    /// When the target left (null while active).
    pub valid_to: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Placement {
    /// Whether this placement is the current one for its target.
    pub fn is_current(&self) -> bool {
        self.active && self.valid_to.is_none()
    }
}

/// Data required to persist a new placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlacement {
    /// Target entity type.
    pub target_kind: TargetKind,
    /// Target entity id.
    pub target_id: i64,
    /// Destination location.
    pub location_id: Uuid,
    /// When the target is shelved.
    pub valid_from: DateTime<Utc>,
    /// Free-form notes.
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(active: bool, valid_to: Option<DateTime<Utc>>) -> Placement {
        Placement {
            id: Uuid::nil(),
            target_kind: TargetKind::Dossier,
            target_id: 1,
            location_id: Uuid::nil(),
            active,
            valid_from: Utc::now(),
            valid_to,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_current_requires_active_open_interval() {
        assert!(placement(true, None).is_current());
        assert!(!placement(false, Some(Utc::now())).is_current());
        assert!(!placement(true, Some(Utc::now())).is_current());
    }
}
