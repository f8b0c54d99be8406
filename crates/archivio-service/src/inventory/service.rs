//! Loads the forest and catalog and runs the flattening algorithm.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use archivio_core::error::AppError;
use archivio_core::result::AppResult;
use archivio_database::repositories::location::LocationRepository;
use archivio_entity::catalog::source::CatalogSource;

use super::flatten::{FlattenReport, flatten};

/// Produces the printable inventory listing. Read-only; safe to run
/// against a replica without locking.
#[derive(Clone)]
pub struct InventoryService {
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// Catalog lookups for dossiers and documents.
    catalog: Arc<dyn CatalogSource>,
}

impl InventoryService {
    /// Creates a new inventory service.
    pub fn new(location_repo: Arc<LocationRepository>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            location_repo,
            catalog,
        }
    }

    /// Flatten the whole archive, or a single top-level unit subtree
    /// when `root_unit_id` is given ("print this archive room").
    pub async fn flatten(&self, root_unit_id: Option<Uuid>) -> AppResult<FlattenReport> {
        let units = match root_unit_id {
            Some(unit_id) => {
                let unit = self
                    .location_repo
                    .find_by_id(unit_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Unit {unit_id} not found")))?;
                if !unit.is_root() {
                    return Err(AppError::validation(format!(
                        "Location '{}' is not a top-level unit",
                        unit.code
                    )));
                }
                vec![unit]
            }
            None => self.location_repo.find_roots().await?,
        };

        let dossiers = self.catalog.dossiers(root_unit_id).await?;
        let documents = self.catalog.documents(root_unit_id).await?;

        let report = flatten(&units, &dossiers, &documents);
        for bad in &report.malformed {
            warn!(
                unit_id = %bad.unit_id,
                dossier_ids = ?bad.dossier_ids,
                "Skipped malformed dossier subtree during flattening"
            );
        }
        Ok(report)
    }
}
