//! Location tree operations: create, move, rename, recode, delete.
//!
//! The only entry points that mutate the forest. Validation happens
//! before any write; every multi-node path rewrite runs inside a single
//! transaction with the affected subtree locked.

use std::sync::Arc;

use sqlx::PgConnection;
use tracing::{info, warn};
use uuid::Uuid;

use archivio_core::config::archive::ArchiveConfig;
use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;
use archivio_core::types::pagination::{PageRequest, PageResponse};
use archivio_database::repositories::location::LocationRepository;
use archivio_database::repositories::placement::PlacementRepository;
use archivio_entity::location::kind::LocationKind;
use archivio_entity::location::model::{CreateLocation, LocationNode};

use crate::allocator::{CodeAllocator, normalize_prefix, scope_for};
use super::paths;

/// Request to create a new location node.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateLocationRequest {
    /// Container kind.
    pub kind: LocationKind,
    /// Parent node (None only for offices).
    pub parent_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Code prefix; defaults to the kind's conventional abbreviation.
    pub prefix: Option<String>,
    /// Preferred sequence for import/renumbering paths.
    pub preferred_sequence: Option<i32>,
    /// Sibling ordering hint.
    pub sort_order: i32,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Maintains a valid, acyclic, type-constrained forest and keeps
/// `full_path` consistent.
#[derive(Debug, Clone)]
pub struct LocationTreeService {
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// Placement repository (delete guard).
    placement_repo: Arc<PlacementRepository>,
    /// Code allocator.
    allocator: CodeAllocator,
    /// Archive settings.
    config: ArchiveConfig,
}

impl LocationTreeService {
    /// Creates a new location tree service.
    pub fn new(
        location_repo: Arc<LocationRepository>,
        placement_repo: Arc<PlacementRepository>,
        allocator: CodeAllocator,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            location_repo,
            placement_repo,
            allocator,
            config,
        }
    }

    /// Gets a node by ID.
    pub async fn get(&self, node_id: Uuid) -> AppResult<LocationNode> {
        self.location_repo
            .find_by_id(node_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))
    }

    /// Gets a node by its globally unique code.
    pub async fn get_by_code(&self, code: &str) -> AppResult<LocationNode> {
        self.location_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No location with code '{code}'")))
    }

    /// Gets a node by its full path.
    pub async fn get_by_path(&self, full_path: &str) -> AppResult<LocationNode> {
        self.location_repo
            .find_by_path(full_path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No location at path '{full_path}'")))
    }

    /// Lists root nodes (offices).
    pub async fn list_roots(&self) -> AppResult<Vec<LocationNode>> {
        self.location_repo.find_roots().await
    }

    /// Lists direct children of a node, paginated.
    pub async fn list_children(
        &self,
        node_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<LocationNode>> {
        self.location_repo.find_children(node_id, &page).await
    }

    /// All descendants of a node, parents before children.
    pub async fn descendants(&self, node_id: Uuid) -> AppResult<Vec<LocationNode>> {
        self.location_repo.find_descendants(node_id).await
    }

    /// The chain from the root down to the node (breadcrumbs).
    pub async fn ancestors(&self, node_id: Uuid) -> AppResult<Vec<LocationNode>> {
        self.location_repo.find_ancestors(node_id).await
    }

    /// Creates a new node: validates the kind/parent combination,
    /// allocates a sequence, renders the code, and computes the full
    /// path, all in one transaction. Allocation races are retried with a
    /// fresh sequence a bounded number of times.
    pub async fn create(&self, req: CreateLocationRequest) -> AppResult<LocationNode> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("Location name cannot be empty"));
        }

        match req.parent_id {
            Some(parent_id) => {
                let parent = self.get(parent_id).await?;
                if !parent.kind.allows_child(req.kind) {
                    return Err(AppError::invalid_hierarchy(format!(
                        "A {} cannot contain a {}",
                        parent.kind, req.kind
                    )));
                }
            }
            None => {
                if !req.kind.is_root_kind() {
                    return Err(AppError::invalid_hierarchy(format!(
                        "A {} requires a parent; only offices may be roots",
                        req.kind
                    )));
                }
            }
        }

        let prefix = match &req.prefix {
            Some(p) if !p.trim().is_empty() => normalize_prefix(p)?,
            _ => req.kind.default_prefix().to_string(),
        };

        self.with_allocation_retry("create", || {
            let prefix = prefix.clone();
            let req = req.clone();
            async move { self.try_create(&req, &prefix).await }
        })
        .await
    }

    async fn try_create(
        &self,
        req: &CreateLocationRequest,
        prefix: &str,
    ) -> AppResult<LocationNode> {
        let scope = scope_for(req.parent_id);
        let mut tx = self
            .location_repo
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        // The parent row is re-read under lock inside the transaction:
        // the child's path derives from it, so any in-flight move or
        // recode of the parent must finish first.
        let parent = match req.parent_id {
            Some(parent_id) => Some(
                self.location_repo
                    .find_by_id_for_update(&mut tx, parent_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Location {parent_id} not found")))?,
            ),
            None => None,
        };

        let sequence = self
            .allocator
            .allocate_in(&mut tx, &scope, prefix, req.preferred_sequence)
            .await?;
        let code = self.allocator.render(prefix, sequence)?;
        let full_path = paths::join(parent.as_ref().map(|p| p.full_path.as_str()), &code);

        let node = self
            .location_repo
            .create(
                &mut tx,
                &CreateLocation {
                    kind: req.kind,
                    prefix: prefix.to_string(),
                    sequence,
                    code,
                    name: req.name.clone(),
                    sort_order: req.sort_order,
                    notes: req.notes.clone(),
                    full_path,
                    parent_id: req.parent_id,
                },
            )
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        info!(
            node_id = %node.id,
            kind = %node.kind,
            code = %node.code,
            path = %node.full_path,
            "Location created"
        );
        Ok(node)
    }

    /// Moves a node under a new parent, cascading the path rewrite to
    /// every descendant in the same transaction.
    pub async fn move_node(&self, node_id: Uuid, new_parent_id: Uuid) -> AppResult<LocationNode> {
        let node = self.get(node_id).await?;
        if node_id == new_parent_id {
            return Err(AppError::cyclic_hierarchy(
                "Cannot move a location into itself",
            ));
        }
        let new_parent = self.get(new_parent_id).await?;

        // Walk from the new parent upward; finding the node among the
        // ancestors means the move would create a cycle.
        let ancestors = self.location_repo.find_ancestors(new_parent_id).await?;
        if ancestors.iter().any(|a| a.id == node_id) {
            return Err(AppError::cyclic_hierarchy(
                "Cannot move a location into one of its descendants",
            ));
        }

        if !new_parent.kind.allows_child(node.kind) {
            return Err(AppError::invalid_hierarchy(format!(
                "A {} cannot contain a {}",
                new_parent.kind, node.kind
            )));
        }

        self.with_allocation_retry("move", || self.try_move(node.id, new_parent.id))
            .await
    }

    async fn try_move(&self, node_id: Uuid, new_parent_id: Uuid) -> AppResult<LocationNode> {
        let mut tx = self
            .location_repo
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        // Both endpoints are re-read under lock: either path may have
        // been rewritten since validation.
        let node = self
            .location_repo
            .find_by_id_for_update(&mut tx, node_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))?;
        let new_parent = self
            .location_repo
            .find_by_id_for_update(&mut tx, new_parent_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {new_parent_id} not found")))?;
        let descendants = self.location_repo.lock_descendants(&mut tx, node.id).await?;

        // The sequence lives in the parent-scoped bucket, so the
        // bookkeeping follows the node: release in the old bucket,
        // re-record in the new one. The code itself does not change.
        let old_scope = scope_for(node.parent_id);
        let new_scope = scope_for(Some(new_parent.id));
        self.allocator
            .release_in(&mut tx, &old_scope, &node.prefix, node.sequence)
            .await?;
        let carried = self
            .allocator
            .allocate_in(&mut tx, &new_scope, &node.prefix, Some(node.sequence))
            .await?;
        if carried != node.sequence {
            // A taken sequence under the new parent stays taken; no
            // point retrying.
            return Err(AppError::conflict(format!(
                "Sequence {} for prefix '{}' is taken under the new parent; recode first",
                node.sequence, node.prefix
            )));
        }

        let old_path = node.full_path.clone();
        let new_path = new_parent.child_path(&node.code);

        let moved = self
            .location_repo
            .reparent(&mut tx, node.id, Some(new_parent.id), &new_path)
            .await?;
        let cascaded = self
            .cascade_paths(&mut tx, &descendants, &old_path, &new_path)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        info!(
            node_id = %node.id,
            old_path = %old_path,
            new_path = %new_path,
            descendants = cascaded,
            "Location moved"
        );
        Ok(moved)
    }

    /// Renames a node. Display name only; codes and paths are untouched.
    pub async fn rename(&self, node_id: Uuid, new_name: &str) -> AppResult<LocationNode> {
        if new_name.trim().is_empty() {
            return Err(AppError::validation("Location name cannot be empty"));
        }
        let node = self.location_repo.rename(node_id, new_name).await?;
        info!(node_id = %node_id, new_name = %new_name, "Location renamed");
        Ok(node)
    }

    /// Reallocates a node's code (new prefix and/or sequence) and
    /// cascades the path rewrite to every descendant, like `move_node`.
    /// Also the administrative re-padding path: re-rendering with the
    /// same allocation semantics fixes legacy formatting.
    pub async fn recode(
        &self,
        node_id: Uuid,
        new_prefix: Option<&str>,
        preferred_sequence: Option<i32>,
    ) -> AppResult<LocationNode> {
        let node = self.get(node_id).await?;
        let prefix = match new_prefix {
            Some(p) if !p.trim().is_empty() => normalize_prefix(p)?,
            _ => node.prefix.clone(),
        };

        self.with_allocation_retry("recode", || {
            let prefix = prefix.clone();
            async move { self.try_recode(node_id, &prefix, preferred_sequence).await }
        })
        .await
    }

    async fn try_recode(
        &self,
        node_id: Uuid,
        prefix: &str,
        preferred_sequence: Option<i32>,
    ) -> AppResult<LocationNode> {
        let mut tx = self
            .location_repo
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        let node = self
            .location_repo
            .find_by_id_for_update(&mut tx, node_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))?;
        let descendants = self.location_repo.lock_descendants(&mut tx, node.id).await?;

        let scope = scope_for(node.parent_id);
        self.allocator
            .release_in(&mut tx, &scope, &node.prefix, node.sequence)
            .await?;
        let sequence = self
            .allocator
            .allocate_in(&mut tx, &scope, prefix, preferred_sequence)
            .await?;
        let code = self.allocator.render(prefix, sequence)?;

        let old_path = node.full_path.clone();
        let new_path = paths::join(paths::parent_of(&old_path), &code);

        let recoded = self
            .location_repo
            .recode(&mut tx, node.id, prefix, sequence, &code, &new_path)
            .await?;
        let cascaded = self
            .cascade_paths(&mut tx, &descendants, &old_path, &new_path)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        info!(
            node_id = %node.id,
            old_code = %node.code,
            new_code = %recoded.code,
            descendants = cascaded,
            "Location recoded"
        );
        Ok(recoded)
    }

    /// Deletes a node. Refused while children or active placements
    /// still reference it; the schema's restrict rules are the backstop.
    pub async fn delete(&self, node_id: Uuid) -> AppResult<()> {
        let mut tx = self
            .location_repo
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        // Locking the row keeps a concurrent create from slipping a new
        // child under a node that is about to disappear.
        let node = self
            .location_repo
            .find_by_id_for_update(&mut tx, node_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Location {node_id} not found")))?;

        let children = self.location_repo.count_children(&mut tx, node_id).await?;
        if children > 0 {
            return Err(AppError::conflict(format!(
                "Location '{}' still has {children} children",
                node.code
            )));
        }
        let placed = self.placement_repo.count_active_at(&mut tx, node_id).await?;
        if placed > 0 {
            return Err(AppError::conflict(format!(
                "Location '{}' still holds {placed} placed objects",
                node.code
            )));
        }

        let scope = scope_for(node.parent_id);
        self.location_repo.delete(&mut tx, node_id).await?;
        self.allocator
            .release_in(&mut tx, &scope, &node.prefix, node.sequence)
            .await?;
        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        info!(node_id = %node_id, code = %node.code, "Location deleted");
        Ok(())
    }

    /// Rewrite the paths of an already-locked descendant list after its
    /// subtree root changed from `old_path` to `new_path`. Rows arrive
    /// parents before children, so each rewrite lands on a consistent
    /// snapshot.
    async fn cascade_paths(
        &self,
        conn: &mut PgConnection,
        descendants: &[LocationNode],
        old_path: &str,
        new_path: &str,
    ) -> AppResult<u64> {
        let mut cascaded = 0u64;
        for node in descendants {
            match paths::rebase(&node.full_path, old_path, new_path) {
                Some(rebased) => {
                    self.location_repo
                        .set_full_path(&mut *conn, node.id, &rebased)
                        .await?;
                    cascaded += 1;
                }
                // Unreachable while the path identity holds; logged so a
                // damaged row surfaces instead of silently drifting.
                None => warn!(
                    node_id = %node.id,
                    path = %node.full_path,
                    "Descendant path is outside the moved subtree"
                ),
            }
        }
        Ok(cascaded)
    }

    /// Retry wrapper for allocation races. Structural errors pass
    /// through untouched; only `AllocationConflict` is retried, a
    /// bounded number of times.
    async fn with_allocation_retry<F, Fut>(&self, op: &str, mut attempt_fn: F) -> AppResult<LocationNode>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<LocationNode>>,
    {
        let attempts = self.config.allocation_retry_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match attempt_fn().await {
                Err(e) if e.kind.is_retryable() => {
                    warn!(op, attempt, error = %e, "Allocation conflict, retrying");
                    last_err = Some(e);
                }
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::internal("Retry loop without attempts")))
    }
}
