//! Display projections of dossiers and documents.
//!
//! The archive core does not own these entities; it only reads the
//! handful of fields needed to place them in the printed inventory.
//! `unit_id` is the explicit "primary unit" association used for
//! listing, independent of any fine-grained shelf placement.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Minimal view of a dossier for inventory listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DossierRef {
    /// The dossier's stable identifier in the owning system.
    pub id: i64,
    /// Dossier code (may be empty).
    pub code: String,
    /// Display title.
    pub title: String,
    /// The top-level unit this dossier is listed under.
    pub unit_id: Uuid,
    /// Parent dossier for nesting (sub-dossiers), if any.
    pub parent_id: Option<i64>,
    /// Numeric progressive used as an ordering fallback.
    pub progressive: Option<i64>,
}

/// Minimal view of a document for inventory listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRef {
    /// The document's stable identifier in the owning system.
    pub id: i64,
    /// Document code (may be empty).
    pub code: String,
    /// Display title.
    pub title: String,
    /// The top-level unit this document is listed under.
    pub unit_id: Uuid,
    /// The dossier the document belongs to, if any; None means the
    /// document hangs directly off the unit.
    pub dossier_id: Option<i64>,
    /// Numeric progressive used as an ordering fallback.
    pub progressive: Option<i64>,
}
