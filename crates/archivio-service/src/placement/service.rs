//! One active location per object, with a history trail.
//!
//! Assigning is an atomic close-then-open: the previous active placement
//! is closed and the new one opened in the same transaction. The partial
//! unique index on active placements makes the rule hold even when the
//! application-level locking is bypassed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use archivio_core::config::archive::ArchiveConfig;
use archivio_core::error::{AppError, ErrorKind};
use archivio_core::result::AppResult;
use archivio_database::repositories::location::LocationRepository;
use archivio_database::repositories::placement::PlacementRepository;
use archivio_entity::location::model::LocationNode;
use archivio_entity::placement::model::{CreatePlacement, Placement};
use archivio_entity::placement::target::TargetKind;

/// Request to shelve an object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssignRequest {
    /// Target entity type.
    pub target_kind: TargetKind,
    /// Target entity id.
    pub target_id: i64,
    /// Destination location.
    pub location_id: Uuid,
    /// When the object is shelved; defaults to now.
    pub valid_from: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Manages placement records.
#[derive(Debug, Clone)]
pub struct PlacementService {
    /// Placement repository.
    placement_repo: Arc<PlacementRepository>,
    /// Location repository.
    location_repo: Arc<LocationRepository>,
    /// Archive settings.
    config: ArchiveConfig,
}

impl PlacementService {
    /// Creates a new placement service.
    pub fn new(
        placement_repo: Arc<PlacementRepository>,
        location_repo: Arc<LocationRepository>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            placement_repo,
            location_repo,
            config,
        }
    }

    /// Shelves an object: closes any prior active placement and opens
    /// the new one atomically. Re-assigning to the current location is a
    /// no-op returning the existing placement.
    pub async fn assign(&self, req: AssignRequest) -> AppResult<Placement> {
        // Destination must exist before anything is written.
        self.location_repo
            .find_by_id(req.location_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Location {} not found", req.location_id))
            })?;

        let valid_from = req.valid_from.unwrap_or_else(Utc::now);

        let attempts = self.config.allocation_retry_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.try_assign(&req, valid_from).await {
                Err(e) if e.kind.is_retryable() => {
                    warn!(
                        target_kind = %req.target_kind,
                        target_id = req.target_id,
                        attempt,
                        error = %e,
                        "Placement race, retrying close step"
                    );
                    last_err = Some(e);
                }
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::internal("Retry loop without attempts")))
    }

    async fn try_assign(
        &self,
        req: &AssignRequest,
        valid_from: DateTime<Utc>,
    ) -> AppResult<Placement> {
        let mut tx = self
            .placement_repo
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        let existing = self
            .placement_repo
            .find_active_for_update(&mut tx, req.target_kind, req.target_id)
            .await?;

        if let Some(current) = existing {
            if current.location_id == req.location_id {
                // Already shelved there; nothing to write.
                return Ok(current);
            }
            self.placement_repo
                .close(&mut tx, current.id, valid_from)
                .await?;
        }

        let placement = self
            .placement_repo
            .insert(
                &mut tx,
                &CreatePlacement {
                    target_kind: req.target_kind,
                    target_id: req.target_id,
                    location_id: req.location_id,
                    valid_from,
                    notes: req.notes.clone(),
                },
            )
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        info!(
            target_kind = %req.target_kind,
            target_id = req.target_id,
            location_id = %req.location_id,
            "Object placed"
        );
        Ok(placement)
    }

    /// The node the target currently sits in, or None if never placed.
    pub async fn current_location(
        &self,
        target_kind: TargetKind,
        target_id: i64,
    ) -> AppResult<Option<LocationNode>> {
        let Some(placement) = self
            .placement_repo
            .find_active(target_kind, target_id)
            .await?
        else {
            return Ok(None);
        };
        self.location_repo.find_by_id(placement.location_id).await
    }

    /// Full placement history for a target, most recent first.
    pub async fn history(
        &self,
        target_kind: TargetKind,
        target_id: i64,
    ) -> AppResult<Vec<Placement>> {
        self.placement_repo.history(target_kind, target_id).await
    }
}
