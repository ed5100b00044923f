//! Handlers for `/climate` endpoints.
//!
//! Reads are served from the cache table only. A miss returns the placeholder
//! response; no upstream provider is contacted.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use climhub_core::{
  climate::{ClimateLookup, ClimateQuery},
  store::HubStore,
};
use serde::Deserialize;

use crate::{error::ApiError, params::parse_opt};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub year:  Option<String>,
  pub month: Option<String>,
}

/// `GET /climate/:country/:metric[?year=&month=]`
pub async fn lookup<S>(
  State(store): State<Arc<S>>,
  Path((country, metric)): Path<(String, String)>,
  Query(params): Query<LookupParams>,
) -> Result<Json<ClimateLookup>, ApiError>
where
  S: HubStore,
{
  let month = parse_opt::<u8>("month", params.month)?;
  if month.is_some_and(|m| !(1..=12).contains(&m)) {
    return Err(ApiError::BadRequest("month must be between 1 and 12".to_owned()));
  }

  let query = ClimateQuery {
    country,
    metric,
    year: parse_opt("year", params.year)?,
    month,
  };
  let lookup = store.climate_lookup(&query).await.map_err(ApiError::store)?;
  tracing::debug!(
    country = %query.country,
    metric = %query.metric,
    hit = lookup.is_hit(),
    "climate cache lookup"
  );
  Ok(Json(lookup))
}

/// `GET /climate/metrics`
pub async fn metrics<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: HubStore,
{
  let metrics = store.climate_metrics().await.map_err(ApiError::store)?;
  Ok(Json(metrics))
}
