//! HTTP server assembly for the climate policy hub.
//!
//! Wraps the JSON API from `climhub-api` with request tracing and CORS, and
//! owns the runtime configuration.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use climhub_core::store::HubStore;
use climhub_store_sqlite::StoreOptions;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLIMHUB_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// How long a statement waits on a locked database, in milliseconds.
  pub busy_timeout_ms: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "0.0.0.0".to_owned(),
      port:            3000,
      store_path:      PathBuf::from("data/climate_hub.db"),
      busy_timeout_ms: 5000,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      busy_timeout: Duration::from_millis(self.busy_timeout_ms),
      ..StoreOptions::default()
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application: the API mounted at `/api`, with HTTP tracing
/// and permissive CORS for the browser dashboard.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: HubStore + 'static,
{
  Router::new()
    .nest("/api", climhub_api::api_router(store))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use climhub_store_sqlite::SqliteStore;
  use tower::ServiceExt;

  use super::*;

  #[test]
  fn config_defaults_apply_when_nothing_is_set() {
    let cfg: ServerConfig = config::Config::builder()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:3000");
    assert_eq!(cfg.store_path, PathBuf::from("data/climate_hub.db"));
    assert_eq!(cfg.store_options().busy_timeout, Duration::from_secs(5));
  }

  #[test]
  fn config_overrides_are_layered() {
    let cfg: ServerConfig = config::Config::builder()
      .set_override("port", 8080)
      .unwrap()
      .set_override("busy_timeout_ms", 250)
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.store_options().busy_timeout, Duration::from_millis(250));
  }

  #[tokio::test]
  async fn health_is_mounted_under_api_with_cors() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let req = Request::builder()
      .uri("/api/health")
      .header(header::ORIGIN, "http://localhost:5173")
      .body(Body::empty())
      .unwrap();
    let resp = app(Arc::new(store)).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[tokio::test]
  async fn unknown_path_is_404() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let resp = app(Arc::new(store)).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
