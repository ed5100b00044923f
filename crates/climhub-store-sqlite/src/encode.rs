//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision
//! and a `Z` suffix. The fixed width makes string comparison in SQL agree
//! with chronological order, which the cache-expiry check relies on.

use chrono::{DateTime, SecondsFormat, Utc};
use climhub_core::{
  analysis::{NdcClassification, PolicyAnalysis},
  climate::ClimateRecord,
  item::{ItemType, RepositoryItem},
};
use rusqlite::{Row, types::ValueRef};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Month ───────────────────────────────────────────────────────────────────

/// Annual aggregates are stored as month 0.
pub fn encode_month(month: Option<u8>) -> i64 {
  month.map(i64::from).unwrap_or(0)
}

pub fn decode_month(m: i64) -> Result<Option<u8>> {
  match m {
    0 => Ok(None),
    1..=12 => Ok(Some(m as u8)),
    other => Err(Error::Decode(format!("month out of range: {other}"))),
  }
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const ITEM_COLUMNS: &str = "id, title, type, country, year, description, \
   source, link, file_path, sector, created_at, updated_at";

pub const ANALYSIS_COLUMNS: &str = "id, country, governance_score, \
   mitigation_score, adaptation_score, overall_index, source, created_at, \
   updated_at";

pub const CLIMATE_COLUMNS: &str = "id, country, metric, year, month, value, \
   data_source, raw_data, cached_at, expires_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `repository_items` row.
pub struct RawItem {
  pub id:          i64,
  pub title:       String,
  pub item_type:   String,
  pub country:     Option<String>,
  pub year:        Option<i32>,
  pub description: Option<String>,
  pub source:      Option<String>,
  pub link:        Option<String>,
  pub file_path:   Option<String>,
  pub sector:      Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawItem {
  /// Read a row selected with [`ITEM_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      title:       row.get(1)?,
      item_type:   row.get(2)?,
      country:     row.get(3)?,
      year:        row.get(4)?,
      description: row.get(5)?,
      source:      row.get(6)?,
      link:        row.get(7)?,
      file_path:   row.get(8)?,
      sector:      row.get(9)?,
      created_at:  row.get(10)?,
      updated_at:  row.get(11)?,
    })
  }

  pub fn into_item(self) -> Result<RepositoryItem> {
    Ok(RepositoryItem {
      id:          self.id,
      title:       self.title,
      item_type:   ItemType::parse(&self.item_type)?,
      country:     self.country,
      year:        self.year,
      description: self.description,
      source:      self.source,
      link:        self.link,
      file_path:   self.file_path,
      sector:      self.sector,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `policy_analysis` row.
pub struct RawAnalysis {
  pub id:               i64,
  pub country:          String,
  pub governance_score: Option<f64>,
  pub mitigation_score: Option<f64>,
  pub adaptation_score: Option<f64>,
  pub overall_index:    Option<f64>,
  pub source:           String,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawAnalysis {
  /// Read a row selected with [`ANALYSIS_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      country:          row.get(1)?,
      governance_score: row.get(2)?,
      mitigation_score: row.get(3)?,
      adaptation_score: row.get(4)?,
      overall_index:    row.get(5)?,
      source:           row.get(6)?,
      created_at:       row.get(7)?,
      updated_at:       row.get(8)?,
    })
  }

  pub fn into_analysis(self) -> Result<PolicyAnalysis> {
    Ok(PolicyAnalysis {
      id:               self.id,
      country:          self.country,
      governance_score: self.governance_score,
      mitigation_score: self.mitigation_score,
      adaptation_score: self.adaptation_score,
      overall_index:    self.overall_index,
      source:           self.source,
      classification:   NdcClassification::from_index(self.overall_index),
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `cached_climate_data` row.
pub struct RawClimate {
  pub id:          i64,
  pub country:     String,
  pub metric:      String,
  pub year:        i32,
  pub month:       i64,
  pub value:       Option<f64>,
  pub data_source: Option<String>,
  pub raw_data:    Option<String>,
  pub cached_at:   String,
  pub expires_at:  Option<String>,
}

impl RawClimate {
  /// Read a row selected with [`CLIMATE_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      country:     row.get(1)?,
      metric:      row.get(2)?,
      year:        row.get(3)?,
      month:       row.get(4)?,
      value:       row.get(5)?,
      data_source: row.get(6)?,
      raw_data:    row.get(7)?,
      cached_at:   row.get(8)?,
      expires_at:  row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<ClimateRecord> {
    Ok(ClimateRecord {
      id:          self.id,
      country:     self.country,
      metric:      self.metric,
      year:        self.year,
      month:       decode_month(self.month)?,
      value:       self.value,
      data_source: self.data_source,
      raw_data:    self
        .raw_data
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      cached_at:   decode_dt(&self.cached_at)?,
      expires_at:  self.expires_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

// ─── Untyped rows ────────────────────────────────────────────────────────────

/// Convert a row into a JSON object keyed by column name. Blobs are not
/// representable and come back as `null`.
pub fn row_to_json(
  row: &Row<'_>,
  names: &[String],
) -> rusqlite::Result<serde_json::Map<String, serde_json::Value>> {
  let mut map = serde_json::Map::with_capacity(names.len());
  for (idx, name) in names.iter().enumerate() {
    let value = match row.get_ref(idx)? {
      ValueRef::Null | ValueRef::Blob(_) => serde_json::Value::Null,
      ValueRef::Integer(i) => serde_json::Value::from(i),
      ValueRef::Real(r) => serde_json::Value::from(r),
      ValueRef::Text(t) => {
        serde_json::Value::from(String::from_utf8_lossy(t).into_owned())
      }
    };
    map.insert(name.clone(), value);
  }
  Ok(map)
}
