//! JSON REST API for the climate policy hub.
//!
//! Exposes an axum [`Router`] backed by any [`climhub_core::store::HubStore`].
//! TLS, CORS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", climhub_api::api_router(store.clone()))
//! ```

pub mod analysis;
pub mod climate;
pub mod error;
pub mod map;
pub mod params;
pub mod policies;
pub mod repository;
pub mod stats;

use std::sync::Arc;

use axum::{Router, routing::get};
use climhub_core::store::HubStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: HubStore + 'static,
{
  Router::new()
    // Repository
    .route("/repository/items", get(repository::list_items::<S>))
    .route("/repository/items/{id}", get(repository::get_item::<S>))
    .route("/repository/policies", get(repository::policies::<S>))
    .route("/repository/reports", get(repository::reports::<S>))
    .route("/repository/research", get(repository::research::<S>))
    .route("/repository/countries", get(repository::countries::<S>))
    .route("/repository/sectors", get(repository::sectors::<S>))
    // Policies
    .route("/policies/compare", get(policies::compare::<S>))
    .route("/policies/{country}", get(policies::by_country::<S>))
    // Climate cache
    .route("/climate/metrics", get(climate::metrics::<S>))
    .route("/climate/{country}/{metric}", get(climate::lookup::<S>))
    // Policy analysis
    .route("/policy-analysis", get(analysis::list::<S>))
    .route("/policy-analysis/compare", get(analysis::compare::<S>))
    .route("/policy-analysis/ranking/{metric}", get(analysis::ranking::<S>))
    .route("/policy-analysis/{country}", get(analysis::by_country::<S>))
    // Map
    .route("/map/regions", get(map::regions::<S>))
    .route(
      "/map/climate-indicators/{country}",
      get(map::climate_indicators::<S>),
    )
    // Dashboard
    .route("/stats/overview", get(stats::overview::<S>))
    .route("/health", get(stats::health::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
