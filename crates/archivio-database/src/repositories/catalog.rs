//! Read-only catalog lookups for dossiers and documents.
//!
//! The case-management side owns these tables; this repository reads the
//! display columns needed for inventory printing and nothing else.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;
use archivio_entity::catalog::refs::{DocumentRef, DossierRef};
use archivio_entity::catalog::source::CatalogSource;
use archivio_entity::placement::target::TargetKind;

/// sqlx-backed implementation of [`CatalogSource`].
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn dossiers(&self, unit_id: Option<Uuid>) -> AppResult<Vec<DossierRef>> {
        let query = match unit_id {
            Some(_) => {
                "SELECT id, code, title, unit_id, parent_id, progressive \
                 FROM dossiers WHERE unit_id = $1 ORDER BY id ASC"
            }
            None => {
                "SELECT id, code, title, unit_id, parent_id, progressive \
                 FROM dossiers ORDER BY id ASC"
            }
        };
        let mut q = sqlx::query_as::<_, DossierRef>(query);
        if let Some(unit) = unit_id {
            q = q.bind(unit);
        }
        q.fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list dossiers", e))
    }

    async fn documents(&self, unit_id: Option<Uuid>) -> AppResult<Vec<DocumentRef>> {
        let query = match unit_id {
            Some(_) => {
                "SELECT id, code, title, unit_id, dossier_id, progressive \
                 FROM documents WHERE unit_id = $1 ORDER BY id ASC"
            }
            None => {
                "SELECT id, code, title, unit_id, dossier_id, progressive \
                 FROM documents ORDER BY id ASC"
            }
        };
        let mut q = sqlx::query_as::<_, DocumentRef>(query);
        if let Some(unit) = unit_id {
            q = q.bind(unit);
        }
        q.fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list documents", e))
    }

    async fn owning_unit(&self, kind: TargetKind, id: i64) -> AppResult<Option<Uuid>> {
        let query = match kind {
            TargetKind::Dossier => "SELECT unit_id FROM dossiers WHERE id = $1",
            TargetKind::Document => "SELECT unit_id FROM documents WHERE id = $1",
        };
        sqlx::query_scalar::<_, Uuid>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to resolve owning unit", e)
            })
    }

    async fn parent_dossier(&self, dossier_id: i64) -> AppResult<Option<i64>> {
        let parent: Option<Option<i64>> =
            sqlx::query_scalar("SELECT parent_id FROM dossiers WHERE id = $1")
                .bind(dossier_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to resolve parent dossier", e)
                })?;
        Ok(parent.flatten())
    }
}
