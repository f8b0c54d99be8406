//! Placement repository.
//!
//! The partial unique index `placements_one_active_per_target` is the
//! authoritative guard: no two placements for the same target can be
//! active simultaneously, regardless of application-level races.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;
use archivio_entity::placement::model::{CreatePlacement, Placement};
use archivio_entity::placement::target::TargetKind;

/// Repository for placement records.
#[derive(Debug, Clone)]
pub struct PlacementRepository {
    pool: PgPool,
}

impl PlacementRepository {
    /// Create a new placement repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find the active placement for a target, if any.
    pub async fn find_active(
        &self,
        target_kind: TargetKind,
        target_id: i64,
    ) -> AppResult<Option<Placement>> {
        sqlx::query_as::<_, Placement>(
            "SELECT * FROM placements \
             WHERE target_kind = $1 AND target_id = $2 AND active",
        )
        .bind(target_kind)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active placement", e)
        })
    }

    /// Find the active placement inside an open transaction, locking the
    /// row so a concurrent assign serializes behind us.
    pub async fn find_active_for_update(
        &self,
        conn: &mut PgConnection,
        target_kind: TargetKind,
        target_id: i64,
    ) -> AppResult<Option<Placement>> {
        sqlx::query_as::<_, Placement>(
            "SELECT * FROM placements \
             WHERE target_kind = $1 AND target_id = $2 AND active FOR UPDATE",
        )
        .bind(target_kind)
        .bind(target_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to lock active placement", e)
        })
    }

    /// Close a placement: clear the active flag and stamp `valid_to`.
    pub async fn close(
        &self,
        conn: &mut PgConnection,
        placement_id: Uuid,
        valid_to: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE placements SET active = FALSE, valid_to = $2 WHERE id = $1",
        )
        .bind(placement_id)
        .bind(valid_to)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to close placement", e))?;
        Ok(())
    }

    /// Insert a new active placement. A violation of the one-active
    /// partial index means a concurrent assign raced us; surfaced as
    /// `AllocationConflict` so the caller retries the close step.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        data: &CreatePlacement,
    ) -> AppResult<Placement> {
        sqlx::query_as::<_, Placement>(
            "INSERT INTO placements (target_kind, target_id, location_id, active, valid_from, notes) \
             VALUES ($1, $2, $3, TRUE, $4, $5) RETURNING *",
        )
        .bind(data.target_kind)
        .bind(data.target_id)
        .bind(data.location_id)
        .bind(data.valid_from)
        .bind(&data.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("placements_one_active_per_target") =>
            {
                AppError::allocation_conflict(format!(
                    "Target {}:{} already has an active placement",
                    data.target_kind, data.target_id
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert placement", e),
        })
    }

    /// Full placement history for a target, most recent first.
    pub async fn history(
        &self,
        target_kind: TargetKind,
        target_id: i64,
    ) -> AppResult<Vec<Placement>> {
        sqlx::query_as::<_, Placement>(
            "SELECT * FROM placements \
             WHERE target_kind = $1 AND target_id = $2 \
             ORDER BY valid_from DESC, created_at DESC",
        )
        .bind(target_kind)
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load placement history", e)
        })
    }

    /// Count active placements pointing at a location. Used to refuse
    /// location deletion while objects still sit there.
    pub async fn count_active_at(
        &self,
        conn: &mut PgConnection,
        location_id: Uuid,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM placements WHERE location_id = $1 AND active",
        )
        .bind(location_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count placements", e)
        })?;
        Ok(count as u64)
    }
}
