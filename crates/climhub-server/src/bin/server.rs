//! climhub server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP.
//!
//! # Seeding
//!
//! To replace the database contents with a JSON document and exit:
//!
//! ```
//! cargo run -p climhub-server --bin server -- --seed data/seed.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use climhub_core::{seed::SeedData, store::HubStore};
use climhub_server::ServerConfig;
use climhub_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Climate policy hub API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Replace all data with the contents of this JSON file, then exit.
  #[arg(long, value_name = "FILE")]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CLIMHUB"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path, server_cfg.store_options())
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;
  store
    .ping()
    .await
    .context("store is not reachable")?;

  // Helper mode: bulk load and exit.
  if let Some(path) = cli.seed {
    seed(&store, &path).await?;
    store.close().await.context("failed to close store")?;
    return Ok(());
  }

  let app = climhub_server::app(Arc::new(store.clone()));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  store.close().await.context("failed to close store")?;
  tracing::info!("store closed, bye");
  Ok(())
}

/// Load a [`SeedData`] document and replace the store's contents with it.
async fn seed(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  let data: SeedData = serde_json::from_str(&text)
    .with_context(|| format!("failed to parse seed file {path:?}"))?;
  let report = store
    .replace_all(data)
    .await
    .context("bulk load failed")?;
  println!(
    "loaded {} items, {} analyses, {} climate rows",
    report.items, report.analyses, report.climate
  );
  Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to install Ctrl-C handler");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
