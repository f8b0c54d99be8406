//! Location node repository: CRUD and tree queries.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;
use archivio_core::types::pagination::{PageRequest, PageResponse};
use archivio_entity::location::model::{CreateLocation, LocationNode};

/// Repository for the location hierarchy.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Create a new location repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a node by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LocationNode>> {
        sqlx::query_as::<_, LocationNode>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find location", e))
    }

    /// Find a node by ID inside an open transaction, locking the row.
    /// Structural changes (create under, move, recode, delete) lock the
    /// rows they derive paths from, so concurrent rewrites serialize.
    pub async fn find_by_id_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<LocationNode>> {
        sqlx::query_as::<_, LocationNode>("SELECT * FROM locations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find location", e))
    }

    /// Find a node by its globally unique code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<LocationNode>> {
        sqlx::query_as::<_, LocationNode>("SELECT * FROM locations WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find location by code", e)
            })
    }

    /// Find a node by its full path.
    pub async fn find_by_path(&self, full_path: &str) -> AppResult<Option<LocationNode>> {
        sqlx::query_as::<_, LocationNode>("SELECT * FROM locations WHERE full_path = $1")
            .bind(full_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find location by path", e)
            })
    }

    /// List root nodes (offices), ordered by code.
    pub async fn find_roots(&self) -> AppResult<Vec<LocationNode>> {
        sqlx::query_as::<_, LocationNode>(
            "SELECT * FROM locations WHERE parent_id IS NULL ORDER BY code ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roots", e))
    }

    /// List direct children of a node, paginated.
    pub async fn find_children(
        &self,
        parent_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LocationNode>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE parent_id = $1")
            .bind(parent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count children", e)
            })?;

        let nodes = sqlx::query_as::<_, LocationNode>(
            "SELECT * FROM locations WHERE parent_id = $1 \
             ORDER BY sort_order ASC, code ASC LIMIT $2 OFFSET $3",
        )
        .bind(parent_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))?;

        Ok(PageResponse::new(
            nodes,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Recursive query for all descendants of a node, ordered so that
    /// every parent appears before its children.
    pub async fn find_descendants(&self, node_id: Uuid) -> AppResult<Vec<LocationNode>> {
        sqlx::query_as::<_, LocationNode>(
            "WITH RECURSIVE tree AS ( \
                SELECT * FROM locations WHERE id = $1 \
                UNION ALL \
                SELECT l.* FROM locations l INNER JOIN tree t ON l.parent_id = t.id \
             ) SELECT * FROM tree WHERE id != $1 ORDER BY full_path ASC",
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list descendants", e))
    }

    /// The ancestor chain of a node, root first, ending with the node itself.
    pub async fn find_ancestors(&self, node_id: Uuid) -> AppResult<Vec<LocationNode>> {
        sqlx::query_as::<_, LocationNode>(
            "WITH RECURSIVE ancestors AS ( \
                SELECT l.*, 0 AS distance FROM locations l WHERE l.id = $1 \
                UNION ALL \
                SELECT l.*, a.distance + 1 FROM locations l \
                INNER JOIN ancestors a ON l.id = a.parent_id \
             ) SELECT * FROM ancestors ORDER BY distance DESC",
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    /// Insert a new node. Constraint violations on the code or on the
    /// (parent, prefix, sequence) bucket are races that bypassed the
    /// allocator and surface as `AllocationConflict` for retry.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        data: &CreateLocation,
    ) -> AppResult<LocationNode> {
        sqlx::query_as::<_, LocationNode>(
            "INSERT INTO locations \
             (kind, prefix, sequence, code, name, sort_order, notes, full_path, parent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(data.kind)
        .bind(&data.prefix)
        .bind(data.sequence)
        .bind(&data.code)
        .bind(&data.name)
        .bind(data.sort_order)
        .bind(&data.notes)
        .bind(&data.full_path)
        .bind(data.parent_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.constraint(),
                    Some("locations_code_key") | Some("locations_parent_prefix_sequence_key")
                ) =>
            {
                AppError::allocation_conflict(format!(
                    "Code '{}' was allocated concurrently",
                    data.code
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create location", e),
        })
    }

    /// Update a node's display name.
    pub async fn rename(&self, node_id: Uuid, new_name: &str) -> AppResult<LocationNode> {
        sqlx::query_as::<_, LocationNode>(
            "UPDATE locations SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(node_id)
        .bind(new_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename location", e))?
        .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))
    }

    /// Rewrite a node's parent and path fields (move).
    pub async fn reparent(
        &self,
        conn: &mut PgConnection,
        node_id: Uuid,
        new_parent_id: Option<Uuid>,
        new_full_path: &str,
    ) -> AppResult<LocationNode> {
        sqlx::query_as::<_, LocationNode>(
            "UPDATE locations SET parent_id = $2, full_path = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(node_id)
        .bind(new_parent_id)
        .bind(new_full_path)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move location", e))?
        .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))
    }

    /// Rewrite a node's allocation identity and path (recode).
    pub async fn recode(
        &self,
        conn: &mut PgConnection,
        node_id: Uuid,
        prefix: &str,
        sequence: i32,
        code: &str,
        full_path: &str,
    ) -> AppResult<LocationNode> {
        sqlx::query_as::<_, LocationNode>(
            "UPDATE locations SET prefix = $2, sequence = $3, code = $4, full_path = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(node_id)
        .bind(prefix)
        .bind(sequence)
        .bind(code)
        .bind(full_path)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.constraint(),
                    Some("locations_code_key") | Some("locations_parent_prefix_sequence_key")
                ) =>
            {
                AppError::allocation_conflict(format!("Code '{code}' was allocated concurrently"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to recode location", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))
    }

    /// Lock and return every descendant of a node, parents before
    /// children. Resolved through the parent chain rather than path
    /// matching, so rows stay reachable even mid-rewrite. Locks are held
    /// until the transaction ends, serializing concurrent cascades.
    pub async fn lock_descendants(
        &self,
        conn: &mut PgConnection,
        node_id: Uuid,
    ) -> AppResult<Vec<LocationNode>> {
        sqlx::query_as::<_, LocationNode>(
            "SELECT * FROM locations WHERE id IN ( \
                WITH RECURSIVE tree AS ( \
                    SELECT id FROM locations WHERE parent_id = $1 \
                    UNION ALL \
                    SELECT l.id FROM locations l INNER JOIN tree t ON l.parent_id = t.id \
                ) \
                SELECT id FROM tree \
             ) ORDER BY full_path ASC FOR UPDATE",
        )
        .bind(node_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock descendants", e))
    }

    /// Rewrite one node's path during a move/recode cascade.
    pub async fn set_full_path(
        &self,
        conn: &mut PgConnection,
        node_id: Uuid,
        full_path: &str,
    ) -> AppResult<()> {
        sqlx::query("UPDATE locations SET full_path = $2, updated_at = NOW() WHERE id = $1")
            .bind(node_id)
            .bind(full_path)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update location path", e)
            })?;
        Ok(())
    }

    /// Count direct children inside an open transaction.
    pub async fn count_children(&self, conn: &mut PgConnection, node_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE parent_id = $1")
            .bind(node_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count children", e)
            })?;
        Ok(count as u64)
    }

    /// Delete a node. The schema restricts deletion while children or
    /// placements still reference it.
    pub async fn delete(&self, conn: &mut PgConnection, node_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(node_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete location", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
