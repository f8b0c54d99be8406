//! Archivio CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli.env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.kind, e.message);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    if let Err(e) = cli.execute().await {
        eprintln!("Error [{}]: {}", e.kind, e.message);
        std::process::exit(1);
    }
}
