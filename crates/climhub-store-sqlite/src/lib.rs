//! SQLite backend for the climate policy hub.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod query;

pub use error::{Error, Result};
pub use query::{FilterValue, PaginatedQuery, QueryKind, QueryOutcome, WhereClause};
pub use store::{SqliteStore, StoreOptions};
