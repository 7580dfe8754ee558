//! Histogram and table shapes read from disk.
//!
//! Histograms are stored the way a boost-histogram dump looks: a list of axes
//! plus a flat row-major value array. [`StoredHistogram`] is the raw on-disk
//! form; [`Histogram1D`] and [`Histogram2D`] are the validated views.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Axis metadata of a stored histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMeta {
    /// Axis name (short identifier). Absent in many dumps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Axis label (display text). Absent in many dumps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Bin edges (length = n_bins + 1), strictly increasing.
    pub edges: Vec<f64>,
}

impl AxisMeta {
    /// Axis with edges only.
    pub fn new(edges: Vec<f64>) -> Self {
        Self { name: None, label: None, edges }
    }

    /// Attach a display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of bins described by the edges.
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Bin centers.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Bin widths.
    pub fn widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis needs at least 2 edges, got {}",
                self.edges.len()
            )));
        }
        if self.edges.iter().any(|e| !e.is_finite()) {
            return Err(Error::Validation("axis edges must be finite".to_string()));
        }
        if self.edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Validation("axis edges must be strictly increasing".to_string()));
        }
        Ok(())
    }
}

/// Raw on-disk histogram: axes plus flat row-major values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredHistogram {
    /// One entry per dimension.
    pub axes: Vec<AxisMeta>,
    /// Bin values, row-major with the first axis as the slow index.
    pub values: Vec<f64>,
}

/// A validated one-dimensional histogram.
///
/// Serialized in the [`StoredHistogram`] form; deserialization validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredHistogram", into = "StoredHistogram")]
pub struct Histogram1D {
    /// The single axis.
    pub axis: AxisMeta,
    /// Bin values (length = `axis.n_bins()`).
    pub values: Vec<f64>,
}

impl Histogram1D {
    /// Build and validate a histogram from edges and values.
    pub fn new(axis: AxisMeta, values: Vec<f64>) -> Result<Self> {
        axis.validate()?;
        if values.len() != axis.n_bins() {
            return Err(Error::Validation(format!(
                "values/edges length mismatch: values={} bins={}",
                values.len(),
                axis.n_bins()
            )));
        }
        Ok(Self { axis, values })
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.axis.edges
    }

    /// Axis label, or the empty string.
    pub fn axis_label(&self) -> &str {
        self.axis.label.as_deref().unwrap_or("")
    }
}

impl TryFrom<StoredHistogram> for Histogram1D {
    type Error = Error;

    fn try_from(stored: StoredHistogram) -> Result<Self> {
        let StoredHistogram { mut axes, values } = stored;
        if axes.len() != 1 {
            return Err(Error::Validation(format!(
                "expected a 1-D histogram, got {} axes",
                axes.len()
            )));
        }
        let axis = axes.remove(0);
        Histogram1D::new(axis, values)
    }
}

impl From<Histogram1D> for StoredHistogram {
    fn from(h: Histogram1D) -> Self {
        Self { axes: vec![h.axis], values: h.values }
    }
}

/// A validated two-dimensional histogram.
///
/// Serialized in the [`StoredHistogram`] form; deserialization validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredHistogram", into = "StoredHistogram")]
pub struct Histogram2D {
    /// Horizontal axis.
    pub x: AxisMeta,
    /// Vertical axis.
    pub y: AxisMeta,
    /// Row-major values: `values[ix * ny + iy]`.
    pub values: Vec<f64>,
}

impl Histogram2D {
    /// Build and validate a 2-D histogram.
    pub fn new(x: AxisMeta, y: AxisMeta, values: Vec<f64>) -> Result<Self> {
        x.validate()?;
        y.validate()?;
        let want = x.n_bins() * y.n_bins();
        if values.len() != want {
            return Err(Error::Validation(format!(
                "2-D values length mismatch: got={} expected={}",
                values.len(),
                want
            )));
        }
        Ok(Self { x, y, values })
    }

    /// Sum over y for every x bin (length = x bins).
    pub fn x_projection(&self) -> Vec<f64> {
        let ny = self.y.n_bins();
        self.values.chunks(ny).map(|row| row.iter().sum()).collect()
    }

    /// Sum over x for every y bin (length = y bins).
    pub fn y_projection(&self) -> Vec<f64> {
        let ny = self.y.n_bins();
        let mut out = vec![0.0; ny];
        for row in self.values.chunks(ny) {
            for (acc, v) in out.iter_mut().zip(row) {
                *acc += v;
            }
        }
        out
    }
}

impl TryFrom<StoredHistogram> for Histogram2D {
    type Error = Error;

    fn try_from(stored: StoredHistogram) -> Result<Self> {
        let StoredHistogram { axes, values } = stored;
        let [x, y]: [AxisMeta; 2] = axes.try_into().map_err(|axes: Vec<AxisMeta>| {
            Error::Validation(format!("expected a 2-D histogram, got {} axes", axes.len()))
        })?;
        Histogram2D::new(x, y, values)
    }
}

impl From<Histogram2D> for StoredHistogram {
    fn from(h: Histogram2D) -> Self {
        Self { axes: vec![h.x, h.y], values: h.values }
    }
}

/// One row of a pull table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullEntry {
    /// Parameter label shown on the vertical axis.
    pub label: String,
    /// Central (postfit) value.
    pub value: f64,
    /// Upward error (non-negative).
    pub pos_err: f64,
    /// Downward error as stored in the table (non-positive).
    pub neg_err: f64,
}

impl PullEntry {
    /// Downward error as a non-negative magnitude.
    pub fn down_error(&self) -> f64 {
        -self.neg_err
    }
}

/// Input of a pull plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullTable {
    /// Entries in display order (bottom to top).
    pub entries: Vec<PullEntry>,
}

impl PullTable {
    /// Reject empty tables and non-finite numbers.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::Validation("pull table has no entries".to_string()));
        }
        for e in &self.entries {
            if !(e.value.is_finite() && e.pos_err.is_finite() && e.neg_err.is_finite()) {
                return Err(Error::Validation(format!("non-finite pull entry: {}", e.label)));
            }
        }
        Ok(())
    }
}

/// Input of a correlation-matrix plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTable {
    /// Parameter names (row and column order).
    pub names: Vec<String>,
    /// Square correlation matrix, `matrix[i][j]` in [-1, 1].
    pub matrix: Vec<Vec<f64>>,
}

impl CorrelationTable {
    /// Check squareness and agreement with `names`.
    pub fn validate(&self) -> Result<()> {
        let n = self.names.len();
        if n == 0 {
            return Err(Error::Validation("correlation table has no parameters".to_string()));
        }
        if self.matrix.len() != n || self.matrix.iter().any(|row| row.len() != n) {
            return Err(Error::Validation(format!(
                "correlation matrix must be {n}x{n} to match the parameter names"
            )));
        }
        Ok(())
    }
}
