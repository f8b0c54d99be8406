//! One line of the flattened printable inventory.
//!
//! Rows mix three node kinds: archive units (location nodes), dossiers,
//! and documents. Ordering is driven entirely by string sort keys: tier
//! markers make dossiers sort before documents at the same nesting point,
//! and zero-padded order tokens make lexicographic order equal numeric
//! order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier marker prepended to dossier sort-key segments.
/// Sorts after the owning unit row and before document siblings.
pub const DOSSIER_TIER: &str = "10F";
/// Tier marker prepended to document sort-key segments.
pub const DOCUMENT_TIER: &str = "20D";

/// Width of zero-padded numeric order tokens.
const ORDER_TOKEN_WIDTH: usize = 6;

/// The kind of entity an inventory row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    /// A physical container node.
    Unit,
    /// A case file listed under a unit.
    Dossier,
    /// A document listed under a dossier or directly under a unit.
    Document,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "unit"),
            Self::Dossier => write!(f, "dossier"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// One row of the flattened inventory listing. Transient, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRow {
    /// Unique row key (`U:<uuid>`, `F:<id>`, or `D:<id>`).
    pub node_key: String,
    /// What the row represents.
    pub kind: RowKind,
    /// Depth from the owning root unit (unit rows are level 0).
    pub level: u32,
    /// Sort key within the owning unit subtree.
    pub sort_key: String,
    /// Full path of the owning root unit, the primary sort criterion.
    pub unit_path: String,
    /// Printable label.
    pub label: String,
    /// Row key of the parent row, if nested.
    pub parent_node_key: Option<String>,
    /// Code of the underlying entity (may be empty for dossiers/documents).
    pub code: String,
}

/// Deterministic ordering token for a dossier or document.
///
/// The entity's own code wins when present; otherwise the zero-padded
/// numeric progressive, and as a last resort the zero-padded id. Every
/// entity therefore sorts deterministically even when codes are missing.
pub fn order_token(code: &str, progressive: Option<i64>, id: i64) -> String {
    let trimmed = code.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    let n = progressive.unwrap_or(id);
    format!("{n:0ORDER_TOKEN_WIDTH$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_token_prefers_code() {
        assert_eq!(order_token("D001", Some(7), 42), "D001");
        assert_eq!(order_token("  ", Some(7), 42), "000007");
        assert_eq!(order_token("", None, 42), "000042");
    }

    #[test]
    fn test_zero_padding_matches_numeric_order() {
        let a = order_token("", None, 9);
        let b = order_token("", None, 10);
        assert!(a < b);
    }

    #[test]
    fn test_dossier_tier_sorts_before_document_tier() {
        assert!(DOSSIER_TIER < DOCUMENT_TIER);
    }
}
