//! Location node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::LocationKind;

/// One physical container in the archive hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationNode {
    /// Unique node identifier.
    pub id: Uuid,
    /// What kind of container this is.
    pub kind: LocationKind,
    /// Allocation key used to form the code (e.g. `BOX`).
    pub prefix: String,
    /// Sequence number assigned by the code allocator.
    pub sequence: i32,
    /// Human-readable code: prefix + zero-padded sequence (e.g. `BOX001`).
    /// Globally unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Sibling ordering hint for display.
    pub sort_order: i32,
    /// Whether the container is in active use.
    pub active: bool,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Slash-joined codes from root to this node (e.g. `OFF001/ROOM001/BOX001`).
    pub full_path: String,
    /// Parent node ID (null for offices).
    pub parent_id: Option<Uuid>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl LocationNode {
    /// Check if this is a root node (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The full path a child with `code` would have under this node.
    pub fn child_path(&self, code: &str) -> String {
        format!("{}/{}", self.full_path, code)
    }
}

/// Data required to persist a new location node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    /// Container kind.
    pub kind: LocationKind,
    /// Allocation prefix.
    pub prefix: String,
    /// Allocated sequence.
    pub sequence: i32,
    /// Rendered code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Sibling ordering hint.
    pub sort_order: i32,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Computed full path.
    pub full_path: String,
    /// Parent node (None for offices).
    pub parent_id: Option<Uuid>,
}
