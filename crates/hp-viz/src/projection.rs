//! 2-D histogram with its two 1-D projections in side panels.

use hp_core::{Histogram2D, Result};
use serde::Serialize;

use crate::artifact::ArtifactMeta;
use crate::axis::{AxisPlan, AxisRangePlanner, TickPrecision, fitting_step};
use crate::color::{Colormap, ColormapKind};
use crate::config::{PanelLayout, PlotConfiguration};

/// Preferred tick step; widened only for very wide axes.
const TICK_STEP: f64 = 0.5;

/// One side-panel histogram.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionSeries {
    /// Bin edges of the projected axis.
    pub edges: Vec<f64>,
    /// Summed contents, one per bin.
    pub y: Vec<f64>,
}

/// Numbers-first artifact for a 2-D histogram with projections.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionArtifact {
    /// Schema version (`hepplot_projection_v0`).
    pub schema_version: String,
    /// Producer metadata.
    pub meta: ArtifactMeta,
    /// Bin edges along x.
    pub x_edges: Vec<f64>,
    /// Bin edges along y.
    pub y_edges: Vec<f64>,
    /// Row-major, `values[ix * ny + iy]`.
    pub values: Vec<f64>,
    /// Smallest and largest bin content, the colormap limits.
    pub z_range: [f64; 2],
    /// Sum over y per x bin (top panel).
    pub x_projection: ProjectionSeries,
    /// Sum over x per y bin (right panel).
    pub y_projection: ProjectionSeries,
    /// Main-panel x ticks.
    pub x_axis: AxisPlan,
    /// Main-panel y ticks.
    pub y_axis: AxisPlan,
    /// Main-panel colour scale.
    pub colormap: Colormap,
    /// Panel spacing and stretch.
    pub layout: PanelLayout,
    /// Top panel to main panel.
    pub height_ratios: [f64; 2],
    /// Main panel to right panel.
    pub width_ratios: [f64; 2],
    /// Styling the renderer applies.
    pub config: PlotConfiguration,
}

/// 2-D histogram plot with x and y projections.
#[derive(Debug, Clone)]
pub struct ProjectionPlot {
    hist: Histogram2D,
    colormap: Colormap,
    layout: PanelLayout,
    config: PlotConfiguration,
}

impl ProjectionPlot {
    /// Viridis colormap, panel spacing 0.2 and stretch 4 by default.
    pub fn new(hist: Histogram2D, config: PlotConfiguration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hist,
            colormap: Colormap::new(ColormapKind::Viridis),
            layout: PanelLayout::new(0.2, 4.0),
            config,
        })
    }

    /// Input histogram.
    pub fn histogram(&self) -> &Histogram2D {
        &self.hist
    }

    /// Current configuration.
    pub fn config(&self) -> &PlotConfiguration {
        &self.config
    }

    /// Direct access to the configuration.
    pub fn config_mut(&mut self) -> &mut PlotConfiguration {
        &mut self.config
    }

    /// Panel spacing and stretch.
    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    /// Main-panel colour scale.
    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    /// Accepts `spacing` and `stretch` besides the common figure keys.
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        self.layout.apply_figure_options(&mut self.config, options)
    }

    /// Replace the colour scale.
    pub fn color_options(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }

    /// Contents summed over y, one per x bin.
    pub fn x_projection(&self) -> Vec<f64> {
        self.hist.x_projection()
    }

    /// Contents summed over x, one per y bin.
    pub fn y_projection(&self) -> Vec<f64> {
        self.hist.y_projection()
    }

    fn axis(edges: &[f64]) -> Result<AxisPlan> {
        let lo = edges[0];
        let hi = edges[edges.len() - 1];
        AxisRangePlanner::default()
            .with_step(fitting_step(lo, hi, TICK_STEP))
            .with_edge_labels(true)
            .with_precision(TickPrecision::One)
            .plan(lo, hi, 0.0, Some([lo, hi]))
    }

    /// Resolve ticks, projections and the colour range into an artifact.
    pub fn artifact(&self) -> Result<ProjectionArtifact> {
        let x_edges = self.hist.x.edges.clone();
        let y_edges = self.hist.y.edges.clone();
        let (zmin, zmax) = self
            .hist
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Ok(ProjectionArtifact {
            schema_version: "hepplot_projection_v0".to_string(),
            meta: ArtifactMeta::now()?,
            x_axis: Self::axis(&x_edges)?,
            y_axis: Self::axis(&y_edges)?,
            x_projection: ProjectionSeries { edges: x_edges.clone(), y: self.x_projection() },
            y_projection: ProjectionSeries { edges: y_edges.clone(), y: self.y_projection() },
            x_edges,
            y_edges,
            values: self.hist.values.clone(),
            z_range: [zmin, zmax],
            colormap: self.colormap,
            layout: self.layout,
            height_ratios: [1.0, self.layout.stretch],
            width_ratios: [self.layout.stretch, 1.0],
            config: self.config.clone(),
        })
    }
}
