//! Location hierarchy CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use archivio_core::error::AppError;
use archivio_core::types::pagination::PageRequest;
use archivio_database::repositories::allocation::AllocationRepository;
use archivio_database::repositories::location::LocationRepository;
use archivio_database::repositories::placement::PlacementRepository;
use archivio_entity::location::kind::LocationKind;
use archivio_entity::location::model::LocationNode;
use archivio_service::allocator::CodeAllocator;
use archivio_service::location::{CreateLocationRequest, LocationTreeService};

/// Arguments for location commands
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Location subcommand
    #[command(subcommand)]
    pub command: LocationCommand,
}

/// Location subcommands
#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// List root offices, or the children of a node
    List {
        /// Parent node ID (omit for roots)
        #[arg(short, long)]
        parent_id: Option<String>,
    },
    /// Create a new location node
    Create {
        /// Container kind (office, room, shelf, cabinet, door, shelf_level, box, folder)
        #[arg(short, long)]
        kind: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Parent node ID (omit for offices)
        #[arg(short, long)]
        parent_id: Option<String>,
        /// Code prefix (defaults to the kind's abbreviation)
        #[arg(long)]
        prefix: Option<String>,
        /// Preferred sequence (import/renumbering)
        #[arg(long)]
        sequence: Option<i32>,
    },
    /// Move a node under a new parent
    Move {
        /// Node ID
        id: String,
        /// New parent node ID
        #[arg(short, long)]
        new_parent_id: String,
    },
    /// Reallocate a node's code
    Recode {
        /// Node ID
        id: String,
        /// New prefix (defaults to the current one)
        #[arg(long)]
        prefix: Option<String>,
        /// Preferred sequence
        #[arg(long)]
        sequence: Option<i32>,
    },
    /// Rename a node
    Rename {
        /// Node ID
        id: String,
        /// New display name
        #[arg(short, long)]
        name: String,
    },
    /// Delete an empty node
    Delete {
        /// Node ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Show the chain from the root down to a node
    Path {
        /// Node ID
        id: String,
    },
    /// Print a node's subtree as an indented listing
    Tree {
        /// Root node ID
        id: String,
    },
}

/// Location display row
#[derive(Debug, Serialize, Tabled)]
struct LocationRow {
    /// Node ID
    id: String,
    /// Kind
    kind: String,
    /// Code
    code: String,
    /// Name
    name: String,
    /// Full path
    full_path: String,
    /// Active
    active: bool,
}

impl From<&LocationNode> for LocationRow {
    fn from(node: &LocationNode) -> Self {
        Self {
            id: node.id.to_string(),
            kind: node.kind.to_string(),
            code: node.code.clone(),
            name: node.name.clone(),
            full_path: node.full_path.clone(),
            active: node.active,
        }
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|e| AppError::validation(format!("Invalid UUID: {e}")))
}

/// Build the location tree service from a pool.
pub fn tree_service(
    pool: sqlx::PgPool,
    config: &archivio_core::config::AppConfig,
) -> LocationTreeService {
    let location_repo = Arc::new(LocationRepository::new(pool.clone()));
    let placement_repo = Arc::new(PlacementRepository::new(pool.clone()));
    let alloc_repo = Arc::new(AllocationRepository::new(pool));
    let allocator = CodeAllocator::new(alloc_repo, config.archive.clone());
    LocationTreeService::new(location_repo, placement_repo, allocator, config.archive.clone())
}

/// Execute location commands
pub async fn execute(
    args: &LocationArgs,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let tree = tree_service(pool, &config);

    match &args.command {
        LocationCommand::List { parent_id } => {
            let nodes = match parent_id {
                Some(parent) => {
                    tree.list_children(parse_uuid(parent)?, PageRequest::default())
                        .await?
                        .items
                }
                None => tree.list_roots().await?,
            };
            let rows: Vec<LocationRow> = nodes.iter().map(LocationRow::from).collect();
            output::print_list(&rows, format);
        }
        LocationCommand::Create {
            kind,
            name,
            parent_id,
            prefix,
            sequence,
        } => {
            let kind: LocationKind = kind
                .parse()
                .map_err(|e: String| AppError::validation(e))?;
            let parent_id = parent_id.as_deref().map(parse_uuid).transpose()?;
            let node = tree
                .create(CreateLocationRequest {
                    kind,
                    parent_id,
                    name: name.clone(),
                    prefix: prefix.clone(),
                    preferred_sequence: *sequence,
                    sort_order: 0,
                    notes: None,
                })
                .await?;
            output::print_item(&LocationRow::from(&node), format);
            output::print_success(&format!("Created {} at {}", node.code, node.full_path));
        }
        LocationCommand::Move { id, new_parent_id } => {
            let node = tree
                .move_node(parse_uuid(id)?, parse_uuid(new_parent_id)?)
                .await?;
            output::print_success(&format!("Moved {} to {}", node.code, node.full_path));
        }
        LocationCommand::Recode {
            id,
            prefix,
            sequence,
        } => {
            let node = tree
                .recode(parse_uuid(id)?, prefix.as_deref(), *sequence)
                .await?;
            output::print_success(&format!("Recoded to {} at {}", node.code, node.full_path));
        }
        LocationCommand::Rename { id, name } => {
            let node = tree.rename(parse_uuid(id)?, name).await?;
            output::print_success(&format!("Renamed {} to '{}'", node.code, node.name));
        }
        LocationCommand::Delete { id, force } => {
            let node_id = parse_uuid(id)?;
            if !force {
                let node = tree.get(node_id).await?;
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete {} ('{}')? Its allocated code is freed for reuse.",
                        node.code, node.name
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;
                if !confirm {
                    output::print_warning("Aborted.");
                    return Ok(());
                }
            }
            tree.delete(node_id).await?;
            output::print_success("Location deleted.");
        }
        LocationCommand::Path { id } => {
            let chain = tree.ancestors(parse_uuid(id)?).await?;
            let rows: Vec<LocationRow> = chain.iter().map(LocationRow::from).collect();
            output::print_list(&rows, format);
        }
        LocationCommand::Tree { id } => {
            let root = tree.get(parse_uuid(id)?).await?;
            let depth_of = |node: &LocationNode| {
                node.full_path.matches('/').count() - root.full_path.matches('/').count()
            };
            println!("{} ({})", root.code, root.name);
            for node in tree.descendants(root.id).await? {
                let indent = "  ".repeat(depth_of(&node));
                println!("{indent}{} ({})", node.code, node.name);
            }
        }
    }

    Ok(())
}
