//! Query-string parsing shared by the handlers.
//!
//! Values arrive as raw strings so malformed input yields a JSON 400 from
//! [`ApiError::BadRequest`] rather than axum's plain-text rejection.

use std::str::FromStr;

use climhub_core::item::ItemType;

use crate::error::ApiError;

/// `None` for absent or blank values.
pub fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

/// Parse an optional numeric parameter; blank counts as absent.
pub fn parse_opt<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ApiError> {
  non_blank(value)
    .map(|v| {
      v.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {v:?}")))
    })
    .transpose()
}

pub fn parse_item_type(value: Option<String>) -> Result<Option<ItemType>, ApiError> {
  non_blank(value)
    .map(|v| ItemType::parse(&v).map_err(|e| ApiError::BadRequest(e.to_string())))
    .transpose()
}

/// Split a comma-separated list, trimming each element and dropping blanks.
pub fn csv(value: Option<&str>) -> Vec<String> {
  value
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Parse a required comma-separated id list. `missing` is the error message
/// when nothing usable was supplied.
pub fn csv_ids(value: Option<&str>, missing: &str) -> Result<Vec<i64>, ApiError> {
  let ids = csv(value)
    .into_iter()
    .map(|s| {
      s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid id: {s:?}")))
    })
    .collect::<Result<Vec<i64>, _>>()?;
  if ids.is_empty() {
    return Err(ApiError::BadRequest(missing.to_owned()));
  }
  Ok(ids)
}
