//! Nutrition Sync CLI
//!
//! Exports the nutrition database to CSV, imports it back in foreign-key
//! order, or rebuilds the schema from migrations before importing.

use anyhow::Result;
use clap::Parser;
use nutrition_sync::cli::{Cli, Command};
use nutrition_sync::config::AppConfig;
use nutrition_sync::db::Database;
use nutrition_sync::models::ModelRegistry;
use nutrition_sync::services::{CommandMigrator, SyncOptions, SyncService};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command.name(),
        "Starting nutrition-sync"
    );

    let db = Database::connect(&config.database).await?;
    db.health_check().await?;

    let registry = ModelRegistry::nutrition();
    let migrator = CommandMigrator::from_config(&config.migrations);
    let mut options = SyncOptions::from_config(&config);
    if cli.skip_migrations {
        options.migrate_before_import = false;
    }

    let service = SyncService::new(&db, &registry, &migrator, options);
    let dir = cli.command.data_dir(&config.sync.data_dir);

    let result = match cli.command {
        Command::Export { .. } => service.export(&dir).await,
        Command::Import { .. } => service.import(&dir).await,
        Command::Rebuild { .. } => service.rebuild(&dir).await,
    };

    db.close().await;

    let summary = result?;
    info!(
        tables = summary.processed.len(),
        rows = summary.total_rows(),
        dir = %dir.display(),
        "Done"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nutrition_sync=info,sqlx=warn".into());

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
