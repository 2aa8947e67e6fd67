//! HTTP server for annal.
//!
//! Wires a [`Protocol`] into the JSON API under `/api` and carries the
//! server's runtime configuration.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use annal_core::{Protocol, protocol::DEFAULT_NOTIFICATION_BUFFER, store::HistoryStore};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ANNAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_notification_buffer")]
  pub notification_buffer: usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("annal.db") }

fn default_notification_buffer() -> usize { DEFAULT_NOTIFICATION_BUFFER }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `ANNAL_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::from_sources(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ANNAL").try_parsing(true)),
    )
  }

  fn from_sources(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> Result<Self, config::ConfigError> {
    builder.build()?.try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's top-level [`Router`]: the API nested under `/api`,
/// with request tracing.
pub fn router<S>(protocol: Arc<Protocol<S>>) -> Router
where
  S: HistoryStore + 'static,
{
  Router::new()
    .nest("/api", annal_api::api_router(protocol))
    .layer(TraceLayer::new_for_http())
}
