//! Error types for `climhub-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown item type: {0:?}")]
  UnknownItemType(String),

  #[error("unknown score metric: {0:?}")]
  UnknownMetric(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
