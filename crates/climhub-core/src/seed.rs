//! The bulk-load document.

use serde::{Deserialize, Serialize};

use crate::{
  analysis::NewPolicyAnalysis, climate::NewClimateMetric,
  item::NewRepositoryItem,
};

/// Everything the offline loader writes. Loading replaces the full contents
/// of all three tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
  #[serde(default)]
  pub items:    Vec<NewRepositoryItem>,
  #[serde(default)]
  pub analyses: Vec<NewPolicyAnalysis>,
  #[serde(default)]
  pub climate:  Vec<NewClimateMetric>,
}

/// Row counts written by a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
  pub items:    usize,
  pub analyses: usize,
  pub climate:  usize,
}
