//! Read-only lookup interface over the externally-owned catalog.

use async_trait::async_trait;
use uuid::Uuid;

use archivio_core::result::AppResult;

use super::refs::{DocumentRef, DossierRef};
use crate::placement::target::TargetKind;

/// Read-only view of the dossier/document catalog.
///
/// Implemented by the database crate against the host application's
/// tables. The archive core never writes through this interface.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Dossiers listed under a unit, or the whole catalog when `None`.
    async fn dossiers(&self, unit_id: Option<Uuid>) -> AppResult<Vec<DossierRef>>;

    /// Documents listed under a unit, or the whole catalog when `None`.
    async fn documents(&self, unit_id: Option<Uuid>) -> AppResult<Vec<DocumentRef>>;

    /// The top-level unit an entity is listed under, if any.
    async fn owning_unit(&self, kind: TargetKind, id: i64) -> AppResult<Option<Uuid>>;

    /// A dossier's parent dossier, if nested.
    async fn parent_dossier(&self, dossier_id: i64) -> AppResult<Option<i64>>;
}
