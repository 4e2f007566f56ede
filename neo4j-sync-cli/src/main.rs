//! Copy a Neo4j database into another Neo4j database

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use neo4j_sync_cli::logging::init_run_log;
use neo4j_sync_cli::{Args, Neo4jExecutor, SyncSettings};
use neo4j_sync_core::{BoundedDispatcher, PhaseContext, QueryExecutor, SyncEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = SyncSettings::resolve(Args::parse())?;
    let log_path = init_run_log(&settings.log_dir, &settings.log_level)?;
    println!("Logging to {}", log_path.display());
    tracing::info!(?settings, "Starting neo4j-sync");

    let result = run(&settings).await;
    if let Err(e) = &result {
        tracing::error!("Sync failed: {e:#}");
    }
    result
}

async fn run(settings: &SyncSettings) -> Result<()> {
    let source = Neo4jExecutor::connect(&settings.source, settings.max_concurrency)
        .await
        .context("Failed to connect to the source database")?;
    let destination = Neo4jExecutor::connect(&settings.destination, settings.max_concurrency)
        .await
        .context("Failed to connect to the destination database")?;

    let engine = SyncEngine::new(PhaseContext {
        source: Arc::new(source) as Arc<dyn QueryExecutor>,
        source_database: settings.source.database.clone(),
        destination: Arc::new(destination) as Arc<dyn QueryExecutor>,
        destination_database: settings.destination.database.clone(),
        dispatcher: BoundedDispatcher::new(settings.max_concurrency)?,
        write_mode: settings.write_mode,
        dry_run: settings.dry_run,
        progress_interval: settings.progress_interval,
    });

    tracing::info!(
        "Syncing {} to {}",
        settings.source.uri,
        settings.destination.uri
    );
    let report = engine.run(&settings.plan).await.context("Sync aborted")?;
    report.print_summary();

    if settings.validate {
        let validation = engine
            .validate(&report)
            .await
            .context("Failed to validate destination counts")?;
        validation.print();
        if !validation.overall_passed {
            bail!("Destination counts do not match the planned totals");
        }
    }

    tracing::info!("Sync completed successfully");
    Ok(())
}
