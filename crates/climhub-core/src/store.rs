//! The `HubStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `climhub-store-sqlite`). The JSON API depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  analysis::{AnalysisFilter, PolicyAnalysis, RankingEntry, ScoreMetric},
  climate::{ClimateIndicator, ClimateLookup, ClimateQuery, ClimateRecord, NewClimateMetric},
  item::{ItemFilter, ItemType, RepositoryItem},
  seed::{SeedData, SeedReport},
  stats::{SectorSummary, StatsOverview},
};

/// Abstraction over a climate hub store backend.
///
/// Repository items and policy analyses are read-only at request time; they
/// are written only by [`HubStore::replace_all`], which is an offline bulk
/// load. The climate cache is the one table with a request-time write path.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait HubStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Round-trip a trivial statement to prove the store is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Repository items ──────────────────────────────────────────────────

  /// Items matching `filter`, ordered by year then creation time, newest
  /// first. Paginated when `filter.page` is set.
  fn list_items<'a>(
    &'a self,
    filter: &'a ItemFilter,
  ) -> impl Future<Output = Result<Vec<RepositoryItem>, Self::Error>> + Send + 'a;

  /// Retrieve an item by id. Returns `None` if not found.
  fn get_item(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<RepositoryItem>, Self::Error>> + Send + '_;

  /// All items of one type, year descending, optionally for one country.
  fn list_by_type(
    &self,
    item_type: ItemType,
    country: Option<String>,
  ) -> impl Future<Output = Result<Vec<RepositoryItem>, Self::Error>> + Send + '_;

  /// Distinct trimmed countries, sorted, nulls excluded.
  fn distinct_countries(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Distinct trimmed sectors, sorted, nulls excluded.
  fn distinct_sectors(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Policies among `ids`, year descending. Non-policy ids are skipped.
  fn compare_policies(
    &self,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<RepositoryItem>, Self::Error>> + Send + '_;

  /// Policies for an exact country, year descending.
  fn policies_by_country(
    &self,
    country: String,
  ) -> impl Future<Output = Result<Vec<RepositoryItem>, Self::Error>> + Send + '_;

  // ── Policy analysis ───────────────────────────────────────────────────

  /// Analyses ordered by overall index descending, then country.
  fn list_analyses<'a>(
    &'a self,
    filter: &'a AnalysisFilter,
  ) -> impl Future<Output = Result<Vec<PolicyAnalysis>, Self::Error>> + Send + 'a;

  /// Every analysis for an exact country; empty when there are none.
  fn analyses_for_country(
    &self,
    country: String,
  ) -> impl Future<Output = Result<Vec<PolicyAnalysis>, Self::Error>> + Send + '_;

  /// Analyses for any of `countries`, overall index descending.
  fn compare_countries(
    &self,
    countries: Vec<String>,
  ) -> impl Future<Output = Result<Vec<PolicyAnalysis>, Self::Error>> + Send + '_;

  /// Rows with a non-null `metric`, highest first.
  fn ranking(
    &self,
    metric: ScoreMetric,
  ) -> impl Future<Output = Result<Vec<RankingEntry>, Self::Error>> + Send + '_;

  // ── Climate cache ─────────────────────────────────────────────────────

  /// Unexpired cache rows matching `query`, newest period first.
  fn climate_lookup<'a>(
    &'a self,
    query: &'a ClimateQuery,
  ) -> impl Future<Output = Result<ClimateLookup, Self::Error>> + Send + 'a;

  /// Distinct metric names present in the cache.
  fn climate_metrics(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Insert or replace the row for `(country, metric, year, month)`, purging
  /// expired rows for the same country and metric.
  fn upsert_climate_metric(
    &self,
    input: NewClimateMetric,
  ) -> impl Future<Output = Result<ClimateRecord, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Per-sector item counts, sector ascending.
  fn sector_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<SectorSummary>, Self::Error>> + Send + '_;

  /// The latest twelve readings for a country, most recent first.
  fn climate_indicators(
    &self,
    country: String,
  ) -> impl Future<Output = Result<Vec<ClimateIndicator>, Self::Error>> + Send + '_;

  fn stats_overview(
    &self,
  ) -> impl Future<Output = Result<StatsOverview, Self::Error>> + Send + '_;

  // ── Bulk load ─────────────────────────────────────────────────────────

  /// Delete every row of every table and load `seed` in its place.
  ///
  /// Destructive; must not run against a store that is serving traffic.
  fn replace_all(
    &self,
    seed: SeedData,
  ) -> impl Future<Output = Result<SeedReport, Self::Error>> + Send + '_;
}
