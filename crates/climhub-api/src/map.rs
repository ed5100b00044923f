//! Handlers for the dashboard map: `/map/regions` and
//! `/map/climate-indicators/:country`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use climhub_core::{
  climate::ClimateIndicator,
  stats::SectorSummary,
  store::HubStore,
};

use crate::error::ApiError;

/// `GET /map/regions`
pub async fn regions<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<SectorSummary>>, ApiError>
where
  S: HubStore,
{
  let sectors = store.sector_summaries().await.map_err(ApiError::store)?;
  Ok(Json(sectors))
}

/// `GET /map/climate-indicators/:country`
pub async fn climate_indicators<S>(
  State(store): State<Arc<S>>,
  Path(country): Path<String>,
) -> Result<Json<Vec<ClimateIndicator>>, ApiError>
where
  S: HubStore,
{
  let indicators = store
    .climate_indicators(country)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(indicators))
}
