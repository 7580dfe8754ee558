//! # hp-viz
//!
//! Plot assemblers for stored histograms, pull tables and correlation
//! matrices. Every plot resolves its styling, colours, derived series and
//! axis ticks into a numbers-first JSON artifact that a renderer can draw
//! without further computation.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Artifact metadata and the JSON writer.
pub mod artifact;
/// Tick generation and label precision.
pub mod axis;
/// Colours, colormaps and per-sample colour assignment.
pub mod color;
/// Plot configuration and YAML resolution.
pub mod config;
/// Correlation-matrix heat maps.
pub mod corr;
/// Stacked totals, Poisson bands and ratios.
pub mod derived;
/// 1-D histogram overlay and stack plots.
pub mod hist1d;
/// JSON input readers.
pub mod input;
/// 2-D histograms with projections.
pub mod projection;
/// Pull plots.
pub mod pulls;
/// Histogram plots with a ratio panel.
pub mod ratio;
/// Sample loading and roles.
pub mod samples;
/// Experiment style presets.
pub mod theme;

pub use artifact::{ArtifactMeta, write_artifact};
pub use axis::{AxisPlan, AxisRangePlanner, TickPrecision};
pub use color::{Color, ColorAssigner, ColorAssignment, Colormap, ColormapKind};
pub use config::{GridSpec, PanelLayout, PlotConfiguration, Shape, UnknownKeyPolicy, resolve_config};
pub use corr::{CorrMatrixArtifact, CorrMatrixPlot};
pub use derived::{BandEnvelope, BandZeroPolicy};
pub use hist1d::{ColorRequest, ErrorDisplay, Hist1DArtifact, Hist1DOptions, Hist1DPlot, PlotOptions};
pub use projection::{ProjectionArtifact, ProjectionPlot};
pub use pulls::{LabelSide, PullArtifact, PullOptions, PullPlot};
pub use ratio::{RatioArtifact, RatioPlot, Reference};
pub use samples::{LoadPolicy, OverlaySelection, SampleRole, SampleStore};
pub use theme::ExperimentStyle;
