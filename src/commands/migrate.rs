//! Database migration management commands.

use clap::{Args, Subcommand};

use crate::output;
use archivio_core::error::AppError;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Check database connectivity
    Ping,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;

    match &args.command {
        MigrateCommand::Run => {
            let pool = super::create_db_pool(&config).await?;
            archivio_database::migration::run_migrations(&pool).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Ping => {
            let db = archivio_database::connection::DatabasePool::connect(&config.database).await?;
            if db.health_check().await? {
                output::print_success("Database is reachable.");
            } else {
                output::print_warning("Database responded unexpectedly.");
            }
        }
    }

    Ok(())
}
