//! Placement target kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of externally-owned entity a placement refers to.
///
/// The placement subsystem only needs a stable identifier per target;
/// content and lifecycle of the target entities live elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "target_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A case file grouping entity.
    Dossier,
    /// A single document.
    Document,
}

impl TargetKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dossier => "dossier",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dossier" => Ok(Self::Dossier),
            "document" => Ok(Self::Document),
            other => Err(format!("Unknown target kind: {other}")),
        }
    }
}
