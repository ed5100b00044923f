//! Repository items: the policy, report and research documents held by the
//! hub.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::Error;

// ─── ItemType ────────────────────────────────────────────────────────────────

/// The kind of document. Stored in the `type` column; any other value is
/// rejected by a CHECK constraint.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemType {
  Policy,
  Report,
  Research,
}

impl ItemType {
  /// Parse the column / query-string representation.
  pub fn parse(s: &str) -> crate::Result<Self> {
    ItemType::from_str(s).map_err(|_| Error::UnknownItemType(s.to_owned()))
  }
}

// ─── RepositoryItem ──────────────────────────────────────────────────────────

/// A persisted document record. Field names match the column names so the
/// JSON shape is the row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryItem {
  pub id:          i64,
  pub title:       String,
  #[serde(rename = "type")]
  pub item_type:   ItemType,
  pub country:     Option<String>,
  pub year:        Option<i32>,
  pub description: Option<String>,
  pub source:      Option<String>,
  pub link:        Option<String>,
  pub file_path:   Option<String>,
  pub sector:      Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to the bulk loader. `id`, `created_at` and `updated_at` are always
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepositoryItem {
  pub title:       String,
  #[serde(rename = "type")]
  pub item_type:   ItemType,
  #[serde(default)]
  pub country:     Option<String>,
  #[serde(default)]
  pub year:        Option<i32>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub source:      Option<String>,
  #[serde(default)]
  pub link:        Option<String>,
  #[serde(default)]
  pub file_path:   Option<String>,
  #[serde(default)]
  pub sector:      Option<String>,
}

impl NewRepositoryItem {
  /// Convenience constructor with all optional fields unset.
  pub fn new(title: impl Into<String>, item_type: ItemType) -> Self {
    Self {
      title: title.into(),
      item_type,
      country: None,
      year: None,
      description: None,
      source: None,
      link: None,
      file_path: None,
      sector: None,
    }
  }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// A 1-indexed page request. Zero values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  pub const DEFAULT_LIMIT: u32 = 10;

  pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
    Self {
      page:  page.filter(|p| *p > 0).unwrap_or(1),
      limit: limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT),
    }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
  }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, None) }
}

/// Parameters for [`crate::store::HubStore::list_items`].
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
  pub item_type: Option<ItemType>,
  /// Exact country match.
  pub country:   Option<String>,
  pub year:      Option<i32>,
  /// Substring matched against title OR description.
  pub search:    Option<String>,
  /// Case-insensitive substring match on sector.
  pub sector:    Option<String>,
  /// When set, the result is a single page instead of every match.
  pub page:      Option<PageRequest>,
}
