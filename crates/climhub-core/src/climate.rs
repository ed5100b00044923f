//! Cached external climate metrics.
//!
//! Rows are time-boxed: a row whose `expires_at` has passed is treated as
//! absent by every cache read, even though it stays on disk until the next
//! write for the same country and metric.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached measurement. `month` is `None` for annual aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
  pub id:          i64,
  pub country:     String,
  pub metric:      String,
  pub year:        i32,
  pub month:       Option<u8>,
  pub value:       Option<f64>,
  pub data_source: Option<String>,
  /// The provider's original response, kept for auditing.
  pub raw_data:    Option<serde_json::Value>,
  pub cached_at:   DateTime<Utc>,
  pub expires_at:  Option<DateTime<Utc>>,
}

/// Input to [`crate::store::HubStore::upsert_climate_metric`] and the bulk
/// loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClimateMetric {
  pub country:     String,
  pub metric:      String,
  pub year:        i32,
  #[serde(default)]
  pub month:       Option<u8>,
  #[serde(default)]
  pub value:       Option<f64>,
  #[serde(default)]
  pub data_source: Option<String>,
  #[serde(default)]
  pub raw_data:    Option<serde_json::Value>,
  #[serde(default)]
  pub expires_at:  Option<DateTime<Utc>>,
}

impl NewClimateMetric {
  pub fn new(
    country: impl Into<String>,
    metric: impl Into<String>,
    year: i32,
    value: f64,
  ) -> Self {
    Self {
      country: country.into(),
      metric: metric.into(),
      year,
      month: None,
      value: Some(value),
      data_source: None,
      raw_data: None,
      expires_at: None,
    }
  }
}

/// Parameters for [`crate::store::HubStore::climate_lookup`].
#[derive(Debug, Clone)]
pub struct ClimateQuery {
  pub country: String,
  pub metric:  String,
  pub year:    Option<i32>,
  pub month:   Option<u8>,
}

/// Where a [`ClimateLookup`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupSource {
  #[serde(rename = "cache")]
  Cache,
  /// No unexpired cache rows; live provider fetching is not wired up.
  #[serde(rename = "external-api-placeholder")]
  ExternalApiPlaceholder,
}

/// Result of a cache read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateLookup {
  pub source:  LookupSource,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  pub data:    Vec<ClimateRecord>,
}

impl ClimateLookup {
  pub const PLACEHOLDER_MESSAGE: &'static str =
    "External API integration pending. Sample data available in cache.";

  /// Tag `rows` as a cache hit, or produce the placeholder when empty.
  pub fn from_rows(rows: Vec<ClimateRecord>) -> Self {
    if rows.is_empty() {
      Self {
        source:  LookupSource::ExternalApiPlaceholder,
        message: Some(Self::PLACEHOLDER_MESSAGE.to_owned()),
        data:    rows,
      }
    } else {
      Self { source: LookupSource::Cache, message: None, data: rows }
    }
  }

  pub fn is_hit(&self) -> bool { self.source == LookupSource::Cache }
}

/// A compact reading for the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateIndicator {
  pub metric: String,
  pub year:   i32,
  pub month:  Option<u8>,
  pub value:  Option<f64>,
}
