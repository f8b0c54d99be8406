//! Inventory printing CLI commands.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use archivio_core::error::AppError;
use archivio_database::repositories::catalog::CatalogRepository;
use archivio_database::repositories::location::LocationRepository;
use archivio_entity::inventory::row::InventoryRow;
use archivio_service::inventory::InventoryService;

/// Arguments for the inventory command
#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Restrict to a single top-level unit subtree
    #[arg(short, long)]
    pub unit: Option<String>,
}

/// Inventory display row
#[derive(Debug, Serialize, Tabled)]
struct PrintRow {
    /// Kind
    kind: String,
    /// Indented label
    entry: String,
    /// Code
    code: String,
    /// Owning unit path
    unit: String,
}

impl From<&InventoryRow> for PrintRow {
    fn from(row: &InventoryRow) -> Self {
        Self {
            kind: row.kind.to_string(),
            entry: format!("{}{}", "  ".repeat(row.level as usize), row.label),
            code: row.code.clone(),
            unit: row.unit_path.clone(),
        }
    }
}

/// Execute the inventory command
pub async fn execute(args: &InventoryArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let location_repo = Arc::new(LocationRepository::new(pool.clone()));
    let catalog = Arc::new(CatalogRepository::new(pool));
    let service = InventoryService::new(location_repo, catalog);

    let unit_id = args
        .unit
        .as_deref()
        .map(|u| {
            Uuid::parse_str(u).map_err(|e| AppError::validation(format!("Invalid UUID: {e}")))
        })
        .transpose()?;

    let report = service.flatten(unit_id).await?;
    for bad in &report.malformed {
        output::print_warning(&format!(
            "Skipped malformed dossier chain under unit {}: {:?}",
            bad.unit_id, bad.dossier_ids
        ));
    }

    let rows: Vec<PrintRow> = report.rows.iter().map(PrintRow::from).collect();
    output::print_list(&rows, format);

    Ok(())
}
