//! Aggregates for the map and dashboard views.

use serde::{Deserialize, Serialize};

/// Item counts for one sector, broken out by item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSummary {
  pub sector:         String,
  pub total_items:    i64,
  pub total_policies: i64,
  pub total_reports:  i64,
  pub total_research: i64,
}

/// Dashboard headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsOverview {
  pub total_policies:     i64,
  pub total_reports:      i64,
  pub total_research:     i64,
  /// Distinct non-null countries across repository items.
  pub total_countries:    i64,
  /// Distinct countries with at least one analysis row.
  pub countries_analyzed: i64,
  pub avg_overall_index:  Option<f64>,
  pub highest_index:      Option<f64>,
  pub lowest_index:       Option<f64>,
}
