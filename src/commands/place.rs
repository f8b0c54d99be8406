//! Placement CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use archivio_core::error::AppError;
use archivio_database::repositories::location::LocationRepository;
use archivio_database::repositories::placement::PlacementRepository;
use archivio_entity::placement::model::Placement;
use archivio_entity::placement::target::TargetKind;
use archivio_service::placement::{AssignRequest, PlacementService};

/// Arguments for placement commands
#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Placement subcommand
    #[command(subcommand)]
    pub command: PlaceCommand,
}

/// Placement subcommands
#[derive(Debug, Subcommand)]
pub enum PlaceCommand {
    /// Shelve an object into a location
    Assign {
        /// Target kind (dossier or document)
        #[arg(short, long)]
        kind: String,
        /// Target entity id
        #[arg(short, long)]
        target_id: i64,
        /// Destination location ID
        #[arg(short, long)]
        location_id: String,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show where an object currently sits
    Where {
        /// Target kind (dossier or document)
        #[arg(short, long)]
        kind: String,
        /// Target entity id
        #[arg(short, long)]
        target_id: i64,
    },
    /// Show an object's placement history
    History {
        /// Target kind (dossier or document)
        #[arg(short, long)]
        kind: String,
        /// Target entity id
        #[arg(short, long)]
        target_id: i64,
    },
}

/// Placement display row
#[derive(Debug, Serialize, Tabled)]
struct PlacementRow {
    /// Placement ID
    id: String,
    /// Location ID
    location_id: String,
    /// Current placement marker
    current: bool,
    /// Valid from
    valid_from: String,
    /// Valid to
    valid_to: String,
}

impl From<&Placement> for PlacementRow {
    fn from(p: &Placement) -> Self {
        Self {
            id: p.id.to_string(),
            location_id: p.location_id.to_string(),
            current: p.is_current(),
            valid_from: p.valid_from.format("%Y-%m-%d %H:%M").to_string(),
            valid_to: p
                .valid_to
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Execute placement commands
pub async fn execute(args: &PlaceArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let placement_repo = Arc::new(PlacementRepository::new(pool.clone()));
    let location_repo = Arc::new(LocationRepository::new(pool));
    let service = PlacementService::new(placement_repo, location_repo, config.archive.clone());

    match &args.command {
        PlaceCommand::Assign {
            kind,
            target_id,
            location_id,
            notes,
        } => {
            let kind: TargetKind = kind.parse().map_err(|e: String| AppError::validation(e))?;
            let location_id = Uuid::parse_str(location_id)
                .map_err(|e| AppError::validation(format!("Invalid UUID: {e}")))?;
            let placement = service
                .assign(AssignRequest {
                    target_kind: kind,
                    target_id: *target_id,
                    location_id,
                    valid_from: None,
                    notes: notes.clone(),
                })
                .await?;
            output::print_item(&PlacementRow::from(&placement), format);
            output::print_success(&format!("Placed {kind} {target_id}"));
        }
        PlaceCommand::Where { kind, target_id } => {
            let kind: TargetKind = kind.parse().map_err(|e: String| AppError::validation(e))?;
            match service.current_location(kind, *target_id).await? {
                Some(node) => println!("{} ({})", node.full_path, node.name),
                None => output::print_warning("Never placed."),
            }
        }
        PlaceCommand::History { kind, target_id } => {
            let kind: TargetKind = kind.parse().map_err(|e: String| AppError::validation(e))?;
            let history = service.history(kind, *target_id).await?;
            let rows: Vec<PlacementRow> = history.iter().map(PlacementRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
