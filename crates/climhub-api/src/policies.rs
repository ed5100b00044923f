//! Handlers for `/policies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/policies/compare` | `?ids=1,2,3`; 400 if missing |
//! | `GET`  | `/policies/:country` | Exact country match |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use climhub_core::{item::RepositoryItem, store::HubStore};
use serde::Deserialize;

use crate::{error::ApiError, params::csv_ids};

#[derive(Debug, Deserialize)]
pub struct CompareParams {
  pub ids: Option<String>,
}

/// `GET /policies/compare?ids=<csv>`
pub async fn compare<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<CompareParams>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let ids = csv_ids(params.ids.as_deref(), "Policy IDs required")?;
  let items = store.compare_policies(ids).await.map_err(ApiError::store)?;
  Ok(Json(items))
}

/// `GET /policies/:country`
pub async fn by_country<S>(
  State(store): State<Arc<S>>,
  Path(country): Path<String>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let items = store
    .policies_by_country(country)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}
