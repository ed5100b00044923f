//! Handlers for `/stats` and `/health`.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use climhub_core::{stats::StatsOverview, store::HubStore};
use serde_json::json;

use crate::error::ApiError;

/// `GET /stats/overview`
pub async fn overview<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<StatsOverview>, ApiError>
where
  S: HubStore,
{
  let stats = store.stats_overview().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /health`
///
/// Unlike other handlers, a store failure here reports the error text: the
/// endpoint exists to diagnose connectivity.
pub async fn health<S>(State(store): State<Arc<S>>) -> Response
where
  S: HubStore,
{
  match store.ping().await {
    Ok(()) => Json(json!({
      "status":    "healthy",
      "database":  "connected",
      "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
    .into_response(),
    Err(e) => {
      tracing::warn!(error = %e, "health check failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
          "status":   "unhealthy",
          "database": "disconnected",
          "error":    e.to_string(),
        })),
      )
        .into_response()
    }
  }
}
