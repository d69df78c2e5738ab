mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use gametrack_core::{
    config::{self, AppConfig},
    ingest::{IngestReport, IngestSettings, Ingestor, RawgClient},
    LocalStore,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir())?;
    info!(user = %config.username, data_dir = %config.data_dir.display(), "configuration loaded");

    let store = LocalStore::open(config.store_path())?;
    let ingest_status = match ingest_catalog(&config, store.clone()).await {
        Ok(Some(report)) => format!("Catalog ingested: {} new games", report.inserted),
        Ok(None) => "Ready".to_string(),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "catalog ingestion aborted");
            format!("Catalog ingestion failed: {err}")
        }
    };

    let mut app = app::GametrackApp::new(store, config.username.clone(), &config.browse);
    app.set_status(ingest_status);
    app.run().await
}

/// Populate an empty catalog before the UI starts.
async fn ingest_catalog(config: &AppConfig, store: LocalStore) -> Result<Option<IngestReport>> {
    if !config.rawg.is_enabled() {
        warn!("no RAWG API key configured, skipping catalog ingestion");
        return Ok(None);
    }

    let rawg = config.rawg.clone();
    tokio::task::spawn_blocking(move || {
        let client = RawgClient::new(&rawg)?;
        Ingestor::new(IngestSettings::from(&rawg), client, store).run_if_empty()
    })
    .await
    .context("catalog ingestion task failed")?
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gametrack.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so stdout logging is opt-in.
    let stdout_layer = std::env::var_os("GAMETRACK_LOG_STDOUT").map(|_| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .with_writer(std::io::stdout)
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
