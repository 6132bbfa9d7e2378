//! Server wiring for the herd API: runtime configuration and the top-level
//! router.

use std::path::PathBuf;

use axum::Router;
use herd_core::store::HerdStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HERD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("herd.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router over `store`, with request tracing.
pub fn app<S>(store: S) -> Router
where
  S: HerdStore + 'static,
{
  herd_api::api_router(store).layer(TraceLayer::new_for_http())
}
