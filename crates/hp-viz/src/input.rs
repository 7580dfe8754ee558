//! Readers for the JSON inputs of every plot type.

use std::path::Path;

use hp_core::{CorrelationTable, Error, Histogram1D, Histogram2D, PullTable, Result, StoredHistogram};
use serde::de::DeserializeOwned;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        if e.classify() == serde_json::error::Category::Data {
            Error::Validation(format!("{} does not contain a {what}: {e}", path.display()))
        } else {
            Error::Json(e)
        }
    })
}

/// Read a one-axis histogram; a file with another shape is a validation error.
pub fn read_histogram1d(path: &Path) -> Result<Histogram1D> {
    let stored: StoredHistogram = read_json(path, "histogram object")?;
    Histogram1D::try_from(stored).map_err(|e| match e {
        Error::Validation(msg) => Error::Validation(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Read a two-axis histogram.
pub fn read_histogram2d(path: &Path) -> Result<Histogram2D> {
    let stored: StoredHistogram = read_json(path, "histogram object")?;
    Histogram2D::try_from(stored)
}

/// Read and validate a pull table.
pub fn read_pull_table(path: &Path) -> Result<PullTable> {
    let table: PullTable = read_json(path, "pull table")?;
    table.validate()?;
    Ok(table)
}

/// Read and validate a correlation table.
pub fn read_correlation_table(path: &Path) -> Result<CorrelationTable> {
    let table: CorrelationTable = read_json(path, "correlation table")?;
    table.validate()?;
    Ok(table)
}
