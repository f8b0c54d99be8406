//! Code allocation repository.
//!
//! Backs the allocator with two tables: `allocation_buckets` holds the
//! per-bucket high-water mark (one row per scope/prefix, locked
//! `FOR UPDATE` for the duration of an allocating transaction) and
//! `code_allocations` records every used sequence. The unique constraint
//! on `(scope, prefix, sequence)` is the final backstop against races
//! that bypass the bucket lock.

use sqlx::{PgConnection, PgPool};

use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;

/// Repository for allocation buckets and used-sequence bookkeeping.
#[derive(Debug, Clone)]
pub struct AllocationRepository {
    pool: PgPool,
}

impl AllocationRepository {
    /// Create a new allocation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lock the bucket row for this (scope, prefix) and return its
    /// high-water mark, creating the row on first use. Must run inside
    /// a transaction; the lock is held until commit/rollback.
    pub async fn lock_bucket(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
    ) -> AppResult<i32> {
        sqlx::query(
            "INSERT INTO allocation_buckets (scope, prefix, next_sequence) \
             VALUES ($1, $2, 0) ON CONFLICT (scope, prefix) DO NOTHING",
        )
        .bind(scope)
        .bind(prefix)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to seed bucket", e))?;

        sqlx::query_scalar::<_, i32>(
            "SELECT next_sequence FROM allocation_buckets \
             WHERE scope = $1 AND prefix = $2 FOR UPDATE",
        )
        .bind(scope)
        .bind(prefix)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock bucket", e))
    }

    /// Advance the bucket's high-water mark.
    pub async fn set_high_water(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        next_sequence: i32,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE allocation_buckets SET next_sequence = $3 \
             WHERE scope = $1 AND prefix = $2",
        )
        .bind(scope)
        .bind(prefix)
        .bind(next_sequence)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to advance bucket", e))?;
        Ok(())
    }

    /// Whether a sequence is already recorded as used in the bucket.
    pub async fn is_used(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        sequence: i32,
    ) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM code_allocations \
             WHERE scope = $1 AND prefix = $2 AND sequence = $3",
        )
        .bind(scope)
        .bind(prefix)
        .bind(sequence)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to probe sequence", e))?;
        Ok(found.is_some())
    }

    /// Record a sequence as used. A unique-constraint violation means a
    /// concurrent allocator won the value and surfaces as
    /// `AllocationConflict` so the caller can retry with a fresh sequence.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        sequence: i32,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO code_allocations (scope, prefix, sequence) VALUES ($1, $2, $3)",
        )
        .bind(scope)
        .bind(prefix)
        .bind(sequence)
        .execute(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("code_allocations_bucket_sequence_key") =>
            {
                AppError::allocation_conflict(format!(
                    "Sequence {sequence} already allocated in bucket {scope}/{prefix}"
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to record allocation", e),
        })?;
        Ok(())
    }

    /// Release a previously used sequence (node deletion). The value
    /// becomes available again for preferred re-allocation.
    pub async fn release(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        sequence: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM code_allocations \
             WHERE scope = $1 AND prefix = $2 AND sequence = $3",
        )
        .bind(scope)
        .bind(prefix)
        .bind(sequence)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release allocation", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// All used sequences in a bucket, in ascending insertion (id) order
    /// so re-derivation of allocator state is repeatable.
    pub async fn used_sequences(&self, scope: &str, prefix: &str) -> AppResult<Vec<i32>> {
        sqlx::query_scalar::<_, i32>(
            "SELECT sequence FROM code_allocations \
             WHERE scope = $1 AND prefix = $2 ORDER BY id ASC",
        )
        .bind(scope)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list used sequences", e)
        })
    }
}
