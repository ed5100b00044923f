//! Handlers for `/repository` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/repository/items` | `?type=&country=&year=&search=&sector=&page=&limit=` |
//! | `GET`  | `/repository/items/:id` | 404 if not found |
//! | `GET`  | `/repository/policies` | Optional `?country=` |
//! | `GET`  | `/repository/reports` | |
//! | `GET`  | `/repository/research` | |
//! | `GET`  | `/repository/countries` | Distinct, trimmed, sorted |
//! | `GET`  | `/repository/sectors` | Distinct, trimmed, sorted |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use climhub_core::{
  item::{ItemFilter, ItemType, PageRequest, RepositoryItem},
  store::HubStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  params::{non_blank, parse_item_type, parse_opt},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ItemParams {
  #[serde(rename = "type")]
  pub item_type: Option<String>,
  pub country:   Option<String>,
  pub year:      Option<String>,
  pub search:    Option<String>,
  pub sector:    Option<String>,
  pub page:      Option<String>,
  pub limit:     Option<String>,
}

impl ItemParams {
  fn into_filter(self) -> Result<ItemFilter, ApiError> {
    let page = parse_opt::<u32>("page", self.page)?;
    let limit = parse_opt::<u32>("limit", self.limit)?;
    Ok(ItemFilter {
      item_type: parse_item_type(self.item_type)?,
      country:   non_blank(self.country),
      year:      parse_opt("year", self.year)?,
      search:    non_blank(self.search),
      sector:    non_blank(self.sector),
      page:      (page.is_some() || limit.is_some())
        .then(|| PageRequest::new(page, limit)),
    })
  }
}

/// `GET /repository/items`
pub async fn list_items<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ItemParams>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let filter = params.into_filter()?;
  let items = store.list_items(&filter).await.map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /repository/items/:id`
pub async fn get_item<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<RepositoryItem>, ApiError>
where
  S: HubStore,
{
  let id: i64 = id
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("invalid item id: {id:?}")))?;
  let item = store
    .get_item(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Item not found".to_owned()))?;
  Ok(Json(item))
}

// ─── Fixed-type listings ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CountryParam {
  pub country: Option<String>,
}

/// `GET /repository/policies[?country=]`
pub async fn policies<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<CountryParam>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let items = store
    .list_by_type(ItemType::Policy, non_blank(params.country))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

/// `GET /repository/reports`
pub async fn reports<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let items = store
    .list_by_type(ItemType::Report, None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

/// `GET /repository/research`
pub async fn research<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<RepositoryItem>>, ApiError>
where
  S: HubStore,
{
  let items = store
    .list_by_type(ItemType::Research, None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── Distinct values ──────────────────────────────────────────────────────────

/// `GET /repository/countries`
pub async fn countries<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: HubStore,
{
  let countries = store.distinct_countries().await.map_err(ApiError::store)?;
  Ok(Json(countries))
}

/// `GET /repository/sectors`
pub async fn sectors<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: HubStore,
{
  let sectors = store.distinct_sectors().await.map_err(ApiError::store)?;
  Ok(Json(sectors))
}
