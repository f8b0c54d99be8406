//! CLI command definitions and dispatch.

pub mod inventory;
pub mod location;
pub mod migrate;
pub mod place;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use archivio_core::config::AppConfig;
use archivio_core::error::AppError;

/// Archivio: physical archive location and inventory management
#[derive(Debug, Parser)]
#[command(name = "archivio", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (reads config/<env>.toml over config/default.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Location hierarchy management
    Location(location::LocationArgs),
    /// Placement management
    Place(place::PlaceArgs),
    /// Inventory printing
    Inventory(inventory::InventoryArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.env).await,
            Commands::Location(args) => location::execute(args, &self.env, self.format).await,
            Commands::Place(args) => place::execute(args, &self.env, self.format).await,
            Commands::Inventory(args) => inventory::execute(args, &self.env, self.format).await,
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    let pool = archivio_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
