//! Per-country policy analysis scores and the ranking metrics over them.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use strum::{AsRefStr, Display, EnumString};

use crate::Error;

// ─── ScoreMetric ─────────────────────────────────────────────────────────────

/// The closed set of score columns a ranking may be ordered by.
///
/// This enum is the only source of a column name that is ever spliced into
/// SQL text; everything else is bound as a parameter.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreMetric {
  GovernanceScore,
  MitigationScore,
  AdaptationScore,
  OverallIndex,
}

impl ScoreMetric {
  pub const ALL: [ScoreMetric; 4] = [
    ScoreMetric::GovernanceScore,
    ScoreMetric::MitigationScore,
    ScoreMetric::AdaptationScore,
    ScoreMetric::OverallIndex,
  ];

  pub fn parse(s: &str) -> crate::Result<Self> {
    ScoreMetric::from_str(s).map_err(|_| Error::UnknownMetric(s.to_owned()))
  }

  /// The `policy_analysis` column holding this metric.
  pub fn column(self) -> &'static str {
    match self {
      Self::GovernanceScore => "governance_score",
      Self::MitigationScore => "mitigation_score",
      Self::AdaptationScore => "adaptation_score",
      Self::OverallIndex => "overall_index",
    }
  }
}

// ─── NDC classification ──────────────────────────────────────────────────────

/// Score band used by the dashboard legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NdcClassification {
  Outstanding,
  Satisfactory,
  Good,
  Average,
  Poor,
  NoData,
}

impl NdcClassification {
  /// Band an overall index. A missing or zero index counts as no data.
  pub fn from_index(index: Option<f64>) -> Self {
    match index {
      None => Self::NoData,
      Some(s) if s == 0.0 || s.is_nan() => Self::NoData,
      Some(s) if s >= 80.0 => Self::Outstanding,
      Some(s) if s >= 70.0 => Self::Satisfactory,
      Some(s) if s >= 55.0 => Self::Good,
      Some(s) if s >= 40.0 => Self::Average,
      Some(_) => Self::Poor,
    }
  }
}

// ─── PolicyAnalysis ──────────────────────────────────────────────────────────

/// A scored assessment of one country by one source. `(country, source)` is
/// unique. Scores are on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAnalysis {
  pub id:               i64,
  pub country:          String,
  pub governance_score: Option<f64>,
  pub mitigation_score: Option<f64>,
  pub adaptation_score: Option<f64>,
  pub overall_index:    Option<f64>,
  pub source:           String,
  /// Derived from `overall_index`; never stored.
  pub classification:   NdcClassification,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to the bulk loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPolicyAnalysis {
  pub country:          String,
  pub source:           String,
  #[serde(default)]
  pub governance_score: Option<f64>,
  #[serde(default)]
  pub mitigation_score: Option<f64>,
  #[serde(default)]
  pub adaptation_score: Option<f64>,
  #[serde(default)]
  pub overall_index:    Option<f64>,
}

impl NewPolicyAnalysis {
  pub fn new(country: impl Into<String>, source: impl Into<String>) -> Self {
    Self {
      country:          country.into(),
      source:           source.into(),
      governance_score: None,
      mitigation_score: None,
      adaptation_score: None,
      overall_index:    None,
    }
  }
}

/// Parameters for [`crate::store::HubStore::list_analyses`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
  /// Exact country match.
  pub country: Option<String>,
  /// Case-insensitive substring match on source.
  pub source:  Option<String>,
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// One row of a ranking. Serialises with the metric name as the value key,
/// e.g. `{"country":"Rwanda","overall_index":76.2,"source":"..."}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
  pub country: String,
  pub metric:  ScoreMetric,
  pub value:   f64,
  pub source:  String,
}

impl Serialize for RankingEntry {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(3))?;
    map.serialize_entry("country", &self.country)?;
    map.serialize_entry(self.metric.column(), &self.value)?;
    map.serialize_entry("source", &self.source)?;
    map.end()
  }
}
