//! Database-backed code allocator.

use std::sync::Arc;

use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use archivio_core::config::archive::ArchiveConfig;
use archivio_core::result::AppResult;
use archivio_database::repositories::allocation::AllocationRepository;

use super::state::{BucketState, MAX_SEQUENCE, render};
use archivio_core::error::AppError;

/// Sentinel scope for nodes without a parent (offices).
pub const ROOT_SCOPE: &str = "root";

/// Allocation scope key for a parent node.
pub fn scope_for(parent_id: Option<Uuid>) -> String {
    match parent_id {
        Some(id) => id.to_string(),
        None => ROOT_SCOPE.to_string(),
    }
}

/// Assigns collision-free sequences within (scope, prefix) buckets and
/// renders human-readable codes.
///
/// Callers must run [`CodeAllocator::allocate_in`] inside a transaction:
/// the bucket row lock serializes concurrent allocators, and the unique
/// constraint on recorded sequences is the backstop for anything that
/// bypasses the lock.
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    /// Allocation bookkeeping repository.
    alloc_repo: Arc<AllocationRepository>,
    /// Archive allocation settings.
    config: ArchiveConfig,
}

impl CodeAllocator {
    /// Creates a new code allocator.
    pub fn new(alloc_repo: Arc<AllocationRepository>, config: ArchiveConfig) -> Self {
        Self { alloc_repo, config }
    }

    /// Allocate a sequence in the given bucket, inside the caller's
    /// transaction.
    ///
    /// A free `preferred` value is reused; otherwise the bucket's
    /// high-water value is taken, probing upward past manually recorded
    /// values. With `archive.gap_fill_on_create` unset (the default),
    /// plain creates never reuse gaps left by deletions.
    pub async fn allocate_in(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        preferred: Option<i32>,
    ) -> AppResult<i32> {
        let mark = self.alloc_repo.lock_bucket(conn, scope, prefix).await?;

        if let Some(p) = preferred {
            if !(0..=MAX_SEQUENCE).contains(&p) {
                return Err(AppError::code_exhausted(format!(
                    "Preferred sequence {p} overflows the code padding for prefix '{prefix}'"
                )));
            }
            if !self.alloc_repo.is_used(conn, scope, prefix, p).await? {
                self.alloc_repo.record(conn, scope, prefix, p).await?;
                if p >= mark {
                    self.alloc_repo
                        .set_high_water(conn, scope, prefix, p + 1)
                        .await?;
                }
                debug!(scope, prefix, sequence = p, "Reused preferred sequence");
                return Ok(p);
            }
        }

        let mut candidate = if self.config.gap_fill_on_create && preferred.is_none() {
            0
        } else {
            mark
        };
        while candidate <= MAX_SEQUENCE
            && self.alloc_repo.is_used(conn, scope, prefix, candidate).await?
        {
            candidate += 1;
        }
        if candidate > MAX_SEQUENCE {
            return Err(AppError::code_exhausted(format!(
                "Bucket {scope}/{prefix} exhausted: all sequences up to {MAX_SEQUENCE} are in use"
            )));
        }

        self.alloc_repo.record(conn, scope, prefix, candidate).await?;
        self.alloc_repo
            .set_high_water(conn, scope, prefix, candidate + 1)
            .await?;
        debug!(scope, prefix, sequence = candidate, "Allocated sequence");
        Ok(candidate)
    }

    /// Release a sequence inside the caller's transaction (node deletion
    /// or recode).
    pub async fn release_in(
        &self,
        conn: &mut PgConnection,
        scope: &str,
        prefix: &str,
        sequence: i32,
    ) -> AppResult<bool> {
        self.alloc_repo.release(conn, scope, prefix, sequence).await
    }

    /// Render the final human-readable code.
    pub fn render(&self, prefix: &str, sequence: i32) -> AppResult<String> {
        render(prefix, sequence)
    }

    /// Rebuild the in-memory bucket state from persisted rows, in
    /// ascending id order so re-derivation is repeatable. Used by bulk
    /// import.
    pub async fn rebuild(&self, scope: &str, prefix: &str) -> AppResult<BucketState> {
        let rows = self.alloc_repo.used_sequences(scope, prefix).await?;
        Ok(BucketState::from_used(rows))
    }
}
