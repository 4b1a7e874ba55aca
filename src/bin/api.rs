//! docval API Server
//!
//! Run with: cargo run --bin docval-api -- --config ./config.toml
//!
//! # Configuration
//!
//! Settings come from the TOML file given with `--config`, or the first of
//! `~/.config/docval/config.toml`, `/etc/docval/config.toml` and
//! `./config.toml`. `DOCVAL_*` environment variables override the file, and
//! `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::Parser;
use docval::api::{serve, AppState};
use docval::config::{Config, LoadedConfig, LoggingConfig};
use docval::navigation;
use docval::ocr::{HttpOcrEngine, OcrClientConfig};
use docval::storage::{Database, FileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docval-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "docval OCR validation server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => LoadedConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    init_tracing(&loaded.config.logging);

    tracing::info!("Starting docval API server v{}", env!("CARGO_PKG_VERSION"));
    loaded.log();
    let config = loaded.config;

    navigation::validate_table().context("UI route table is invalid")?;

    let data_dir = config.storage.data_path();
    let storage_dir = config.storage.storage_path();
    tracing::info!("Data directory: {:?}", data_dir);
    tracing::info!("Storage directory: {:?}", storage_dir);

    let db = Arc::new(Database::open(&data_dir).context("opening database")?);
    let files = Arc::new(FileStore::new(&storage_dir).context("preparing file store")?);
    let ocr = Arc::new(
        HttpOcrEngine::new(OcrClientConfig {
            timeout_secs: config.ocr.timeout_secs,
        })
        .context("building OCR client")?,
    );
    tracing::info!("OCR timeout: {}s", config.ocr.timeout_secs);

    let ui_dist = config.ui.dist_path();
    match &ui_dist {
        Some(dist) => tracing::info!("Serving UI from {:?}", dist),
        None => tracing::info!("No UI dist directory configured, serving built-in shell"),
    }

    let state = AppState::new(db, files, ocr, config.api.clone()).with_ui_dist(ui_dist);

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("docval API server stopped");
    Ok(())
}

/// Install the global subscriber: pretty or JSON output, filtered by
/// `RUST_LOG` or the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("docval={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
