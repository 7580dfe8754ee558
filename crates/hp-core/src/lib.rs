//! # hp-core
//!
//! Shared error type and the in-memory histogram shapes that hepplot reads
//! from disk.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{AxisMeta, CorrelationTable, Histogram1D, Histogram2D, PullEntry, PullTable, StoredHistogram};

/// Crate version, stamped into every artifact.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
