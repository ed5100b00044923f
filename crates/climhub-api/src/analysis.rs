//! Handlers for `/policy-analysis` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/policy-analysis` | Optional `?country=&source=` |
//! | `GET`  | `/policy-analysis/:country` | 404 if the country has no rows |
//! | `GET`  | `/policy-analysis/compare` | `?countries=Kenya,Rwanda`; 400 if missing |
//! | `GET`  | `/policy-analysis/ranking/:metric` | 400 unless metric is a score column |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use climhub_core::{
  analysis::{AnalysisFilter, PolicyAnalysis, RankingEntry, ScoreMetric},
  store::HubStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  params::{csv, non_blank},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub country: Option<String>,
  pub source:  Option<String>,
}

/// `GET /policy-analysis[?country=&source=]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PolicyAnalysis>>, ApiError>
where
  S: HubStore,
{
  let filter = AnalysisFilter {
    country: non_blank(params.country),
    source:  non_blank(params.source),
  };
  let rows = store.list_analyses(&filter).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /policy-analysis/:country`
pub async fn by_country<S>(
  State(store): State<Arc<S>>,
  Path(country): Path<String>,
) -> Result<Json<Vec<PolicyAnalysis>>, ApiError>
where
  S: HubStore,
{
  let rows = store
    .analyses_for_country(country)
    .await
    .map_err(ApiError::store)?;
  if rows.is_empty() {
    return Err(ApiError::NotFound(
      "No analysis data found for this country".to_owned(),
    ));
  }
  Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
  pub countries: Option<String>,
}

/// `GET /policy-analysis/compare?countries=<csv>`
pub async fn compare<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<CompareParams>,
) -> Result<Json<Vec<PolicyAnalysis>>, ApiError>
where
  S: HubStore,
{
  let countries = csv(params.countries.as_deref());
  if countries.is_empty() {
    return Err(ApiError::BadRequest("Countries parameter required".to_owned()));
  }
  let rows = store
    .compare_countries(countries)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /policy-analysis/ranking/:metric`
pub async fn ranking<S>(
  State(store): State<Arc<S>>,
  Path(metric): Path<String>,
) -> Result<Json<Vec<RankingEntry>>, ApiError>
where
  S: HubStore,
{
  let metric = ScoreMetric::parse(&metric).map_err(|_| {
    ApiError::BadRequest(
      "Invalid metric. Use: governance_score, mitigation_score, \
       adaptation_score, or overall_index"
        .to_owned(),
    )
  })?;
  let rows = store.ranking(metric).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}
