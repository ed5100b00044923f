//! Core types and trait definitions for the climate policy hub.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend and the JSON API both depend on it.

pub mod analysis;
pub mod climate;
pub mod error;
pub mod item;
pub mod seed;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
