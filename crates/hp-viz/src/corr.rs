//! Correlation-matrix heat map, thresholded on correlation with the first parameter.

use hp_core::{CorrelationTable, Error, Result};
use serde::Serialize;

use crate::artifact::ArtifactMeta;
use crate::axis::stepped_ticks;
use crate::color::{Color, Colormap, ColormapKind};
use crate::config::PlotConfiguration;

/// Colour limits in percent.
pub const CORR_CLIM: [f64; 2] = [-100.0, 100.0];
/// Colour-bar tick spacing in percent.
const COLORBAR_STEP: f64 = 25.0;
const MAX_DECIMALS: usize = 6;

/// One annotated matrix cell.
#[derive(Debug, Clone, Serialize)]
pub struct CorrCell {
    /// Correlation in percent.
    pub value: f64,
    /// Cell annotation.
    pub text: String,
    /// Fill colour from the colormap over [`CORR_CLIM`].
    pub color: Color,
}

/// Numbers-first correlation-matrix artifact.
#[derive(Debug, Clone, Serialize)]
pub struct CorrMatrixArtifact {
    /// Schema version (`hepplot_corr_v0`).
    pub schema_version: String,
    /// Producer metadata.
    pub meta: ArtifactMeta,
    /// Cut on the absolute correlation with the first parameter.
    pub threshold: f64,
    /// Kept parameters.
    pub names: Vec<String>,
    /// Correlations in percent, rows and columns in `names` order.
    pub matrix: Vec<Vec<f64>>,
    /// Annotated cells, same layout as `matrix`.
    pub cells: Vec<Vec<CorrCell>>,
    /// Colour limits.
    pub clim: [f64; 2],
    /// Diverging colour scale.
    pub colormap: Colormap,
    /// Present when a colour bar is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorbar_ticks: Option<Vec<f64>>,
    /// Styling the renderer applies.
    pub config: PlotConfiguration,
}

/// Correlation heat map over a thresholded [`CorrelationTable`].
#[derive(Debug, Clone)]
pub struct CorrMatrixPlot {
    threshold: f64,
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
    colormap: Colormap,
    colorbar: bool,
    decimal: usize,
    config: PlotConfiguration,
}

impl CorrMatrixPlot {
    /// Keep parameter `k` when `|corr[0][k]| >= threshold`; values become percent.
    pub fn new(table: CorrelationTable, threshold: f64, mut config: PlotConfiguration) -> Result<Self> {
        table.validate()?;
        config.validate()?;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(Error::Validation(format!("threshold must be non-negative, got {threshold}")));
        }
        let keep: Vec<usize> =
            (0..table.names.len()).filter(|&k| table.matrix[0][k].abs() >= threshold).collect();
        if keep.is_empty() {
            return Err(Error::Validation(format!("no parameter passes threshold {threshold}")));
        }
        let names = keep.iter().map(|&k| table.names[k].clone()).collect();
        let matrix =
            keep.iter().map(|&i| keep.iter().map(|&j| table.matrix[i][j] * 100.0).collect()).collect();
        tracing::debug!(kept = keep.len(), total = table.names.len(), threshold, "correlation matrix cut");

        let side = keep.len() as f64 / 3.0;
        config.figure.size = [side, side];
        Ok(Self {
            threshold,
            names,
            matrix,
            colormap: Colormap::new(ColormapKind::Bwr),
            colorbar: false,
            decimal: 1,
            config,
        })
    }

    /// Kept parameter names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Percent values of the kept parameters.
    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Current configuration.
    pub fn config(&self) -> &PlotConfiguration {
        &self.config
    }

    /// Direct access to the configuration.
    pub fn config_mut(&mut self) -> &mut PlotConfiguration {
        &mut self.config
    }

    /// Toggle the colour bar and set the cell-text decimals.
    pub fn plot_options(&mut self, colorbar: bool, decimal: usize) -> Result<()> {
        if decimal > MAX_DECIMALS {
            return Err(Error::Validation(format!(
                "decimal places must be at most {MAX_DECIMALS}, got {decimal}"
            )));
        }
        self.colorbar = colorbar;
        self.decimal = decimal;
        Ok(())
    }

    /// Replace the colour scale.
    pub fn color_options(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }

    /// See [`PlotConfiguration::figure_options`].
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        self.config.figure_options(options)
    }

    fn cell(&self, value: f64) -> CorrCell {
        CorrCell {
            value,
            text: format!("{:.*}", self.decimal, value),
            color: self.colormap.sample_range(value, CORR_CLIM[0], CORR_CLIM[1]),
        }
    }

    /// Resolve cells and colour-bar ticks into an artifact.
    pub fn artifact(&self) -> Result<CorrMatrixArtifact> {
        let cells = self.matrix.iter().map(|row| row.iter().map(|&v| self.cell(v)).collect()).collect();
        let colorbar_ticks = if self.colorbar {
            Some(stepped_ticks(CORR_CLIM[0], CORR_CLIM[1], COLORBAR_STEP)?)
        } else {
            None
        };
        Ok(CorrMatrixArtifact {
            schema_version: "hepplot_corr_v0".to_string(),
            meta: ArtifactMeta::now()?,
            threshold: self.threshold,
            names: self.names.clone(),
            matrix: self.matrix.clone(),
            cells,
            clim: CORR_CLIM,
            colormap: self.colormap,
            colorbar_ticks,
            config: self.config.clone(),
        })
    }
}
