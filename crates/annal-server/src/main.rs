//! annal server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `ANNAL_*` environment variables, opens the SQLite store, and serves the
//! JSON API under `/api`.

use std::{path::PathBuf, sync::Arc};

use annal_core::Protocol;
use annal_server::{ServerConfig, expand_tilde};
use annal_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "annal history ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load server configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let protocol = Arc::new(Protocol::with_notification_buffer(
    store,
    server_cfg.notification_buffer,
  ));
  let event_count = protocol
    .event_count()
    .await
    .context("failed to read the event count")?;
  tracing::info!(store = ?store_path, event_count, "store opened");

  let app = annal_server::router(protocol);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
