//! One-dimensional histogram overlay / stack plots.

use std::collections::BTreeMap;

use hp_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactMeta;
use crate::axis::linspace;
use crate::color::{Color, ColorAssigner, ColorAssignment, Colormap, SAMPLE_PALETTE, sample_palette};
use crate::config::{PlotConfiguration, Shape, UnknownKeyPolicy};
use crate::derived::{self, BandEnvelope, BandZeroPolicy};
use crate::samples::{Sample, SampleStore};

/// Number of major x ticks spread over the bin range.
pub const X_TICK_COUNT: usize = 11;

/// Legend text attached to the uncertainty band.
const BAND_LABEL: &str = "Uncertainty";

/// Which samples get Poisson error decorations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDisplay {
    /// No error decorations.
    #[default]
    None,
    /// Bands on histogram samples.
    Hist,
    /// Error bars on overlay samples.
    Data,
    /// Both.
    All,
}

impl ErrorDisplay {
    /// Histogram samples get Poisson bands.
    pub fn on_histograms(self) -> bool {
        matches!(self, Self::Hist | Self::All)
    }

    /// Overlay samples get Poisson error bars.
    pub fn on_overlays(self) -> bool {
        matches!(self, Self::Data | Self::All)
    }
}

/// Construction options of a [`Hist1DPlot`].
#[derive(Debug, Clone, Default)]
pub struct Hist1DOptions {
    /// Stack histogram samples; selects the `full` shape.
    pub stack: bool,
    /// Error decorations.
    pub errors: ErrorDisplay,
    /// Starting configuration, validated on construction.
    pub config: PlotConfiguration,
}

/// Bundle of `plot_options` knobs; `None` leaves the current value.
#[derive(Debug, Clone, Default)]
pub struct PlotOptions {
    /// `full` or `hollow` samples.
    pub shape: Option<Shape>,
    /// Grid string such as `y:`.
    pub grid: Option<String>,
    /// Overlay marker symbol.
    pub marker: Option<String>,
    /// Overlay marker size.
    pub marker_size: Option<f64>,
    /// Legend column count.
    pub legend_columns: Option<u32>,
    /// Renderer style overrides.
    pub style: BTreeMap<String, serde_json::Value>,
    /// How unknown style keys are handled.
    pub unknown_keys: UnknownKeyPolicy,
}

/// Colour source for [`Hist1DPlot::color_options`].
#[derive(Debug, Clone)]
pub enum ColorRequest {
    /// One colour per sample, in load order.
    Colors(Vec<Color>),
    /// A ramp over a continuous scale.
    Colormap(Colormap),
}

/// One sample as drawn.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesArtifact {
    /// Sample name.
    pub name: String,
    /// Legend label from the axis metadata.
    pub label: String,
    /// Assigned colour.
    pub color: Color,
    /// Bin contents.
    pub y: Vec<f64>,
    /// Symmetric Poisson errors, for overlays with error bars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yerr: Option<Vec<f64>>,
}

/// Shaded uncertainty band.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBand {
    /// Sample the band belongs to; `None` for the stack total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    /// Outline colour of a per-sample band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<Color>,
    /// Legend text for the total band or a black-edged sample band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Lower and upper envelope.
    #[serde(flatten)]
    pub band: BandEnvelope,
}

/// Numbers-first artifact of a 1-D histogram plot.
#[derive(Debug, Clone, Serialize)]
pub struct Hist1DArtifact {
    /// Schema version (`hepplot_hist1d_v0`).
    pub schema_version: String,
    /// Producer metadata.
    pub meta: ArtifactMeta,
    /// Shared bin edges.
    pub bin_edges: Vec<f64>,
    /// Bin centers.
    pub bin_centers: Vec<f64>,
    /// Bin widths.
    pub bin_widths: Vec<f64>,
    /// Major x ticks spanning the bin range.
    pub x_ticks: Vec<f64>,
    /// Histogram samples are stacked.
    pub stack: bool,
    /// Histogram-role samples in load order.
    pub histograms: Vec<SeriesArtifact>,
    /// Overlay-role samples in load order.
    pub overlays: Vec<SeriesArtifact>,
    /// Sum of the stacked histograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_total: Option<Vec<f64>>,
    /// Uncertainty bands.
    pub error_bands: Vec<ErrorBand>,
    /// Styling the renderer applies.
    pub config: PlotConfiguration,
}

/// Histogram overlay or stack built from a [`SampleStore`].
#[derive(Debug)]
pub struct Hist1DPlot {
    store: SampleStore,
    stack: bool,
    errors: ErrorDisplay,
    config: PlotConfiguration,
    colors: ColorAssignment,
}

impl Hist1DPlot {
    /// Rejects an empty store and an invalid configuration.
    pub fn new(store: SampleStore, options: Hist1DOptions) -> Result<Self> {
        if store.is_empty() {
            return Err(Error::Validation("enter a non-empty list of samples to plot".to_string()));
        }
        let Hist1DOptions { stack, errors, mut config } = options;
        config.validate()?;
        config.shape = if stack { Shape::Full } else { Shape::Hollow };
        let colors = ColorAssigner::new(stack).assign(&store.names(), None)?;
        Ok(Self { store, stack, errors, config, colors })
    }

    /// Plotted samples.
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Current configuration.
    pub fn config(&self) -> &PlotConfiguration {
        &self.config
    }

    /// Per-sample colours.
    pub fn colors(&self) -> &ColorAssignment {
        &self.colors
    }

    /// Histogram samples are stacked.
    pub fn is_stack(&self) -> bool {
        self.stack
    }

    /// Error decorations.
    pub fn errors(&self) -> ErrorDisplay {
        self.errors
    }

    /// Apply plot options; on error nothing changes.
    pub fn plot_options(&mut self, options: PlotOptions) -> Result<()> {
        let mut config = self.config.clone();
        if let Some(shape) = options.shape {
            config.set_shape(shape, self.stack, self.store.histograms().len())?;
        }
        if let Some(grid) = options.grid.as_deref() {
            config.set_grid(grid)?;
        }
        config.merge_style(&options.style, options.unknown_keys)?;
        if let Some(marker) = options.marker.as_deref() {
            config.set_marker(marker)?;
        }
        if let Some(size) = options.marker_size {
            config.set_marker_size(size)?;
        }
        if let Some(cols) = options.legend_columns {
            config.set_legend_columns(cols)?;
        }

        // Hollow stacks of up to ten samples switch to the fixed palette.
        if self.stack && options.shape == Some(Shape::Hollow) && self.store.len() <= SAMPLE_PALETTE.len() {
            let palette: Vec<Color> = sample_palette().into_iter().take(self.store.len()).collect();
            self.colors = ColorAssigner::new(self.stack).assign(&self.store.names(), Some(palette.as_slice()))?;
        }
        self.config = config;
        Ok(())
    }

    /// Replace the sample colours from an explicit list or a colormap ramp.
    pub fn color_options(&mut self, request: ColorRequest) -> Result<()> {
        let names = self.store.names();
        self.colors = match request {
            ColorRequest::Colors(list) => ColorAssigner::new(self.stack).assign(&names, Some(list.as_slice()))?,
            ColorRequest::Colormap(cmap) => {
                let ramp = crate::color::ramp(names.len(), cmap);
                ColorAssigner::new(self.stack).assign(&names, Some(ramp.as_slice()))?
            }
        };
        Ok(())
    }

    /// Direct access to the configuration.
    pub fn config_mut(&mut self) -> &mut PlotConfiguration {
        &mut self.config
    }

    /// See [`PlotConfiguration::set_axis_labels`].
    pub fn set_axis_labels<'a>(
        &mut self,
        font_size: Option<f64>,
        labels: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<()> {
        self.config.set_axis_labels(font_size, labels)
    }

    /// See [`PlotConfiguration::fontsize_options`].
    pub fn fontsize_options(&mut self, title: Option<f64>, labels: Option<f64>, ticks: Option<f64>) -> Result<()> {
        self.config.fontsize_options(title, labels, ticks)
    }

    /// See [`PlotConfiguration::figure_options`].
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        self.config.figure_options(options)
    }

    /// Sum of the histogram-role samples, or `None` without any.
    pub fn stack_total(&self) -> Result<Option<Vec<f64>>> {
        let hists = self.store.histograms();
        if hists.is_empty() {
            return Ok(None);
        }
        let values: Vec<&[f64]> = hists.iter().map(|s| s.values()).collect();
        derived::stacked_total(&values).map(Some)
    }

    /// Poisson bands on the histogram-role samples.
    ///
    /// Stacks get one band on the total; overlays of histograms get one per sample.
    pub fn hist_error_bands(&self, ratio_mode: bool, zeros: BandZeroPolicy) -> Result<Vec<ErrorBand>> {
        if self.stack {
            let Some(total) = self.stack_total()? else {
                return Ok(Vec::new());
            };
            let band = derived::ratio_error_band(&total, ratio_mode, zeros)?;
            return Ok(vec![ErrorBand {
                sample: None,
                edge_color: None,
                label: Some(BAND_LABEL.to_string()),
                band,
            }]);
        }
        let black = Color::rgb(0, 0, 0);
        self.store
            .histograms()
            .into_iter()
            .map(|s| {
                let color = self.color_of(s)?;
                Ok(ErrorBand {
                    sample: Some(s.name.clone()),
                    edge_color: Some(color),
                    label: (color == black).then(|| BAND_LABEL.to_string()),
                    band: derived::ratio_error_band(s.values(), ratio_mode, zeros)?,
                })
            })
            .collect()
    }

    pub(crate) fn color_of(&self, sample: &Sample) -> Result<Color> {
        self.colors
            .get(&sample.name)
            .ok_or_else(|| Error::Lookup(format!("no colour assigned to {}", sample.name)))
    }

    /// Resolve colours, ticks and bands into an artifact.
    pub fn artifact(&self) -> Result<Hist1DArtifact> {
        let edges = self.store.edges().to_vec();
        let first = &self.store.samples()[0];

        let histograms = self
            .store
            .histograms()
            .into_iter()
            .map(|s| {
                Ok(SeriesArtifact {
                    name: s.name.clone(),
                    label: s.label().to_string(),
                    color: self.color_of(s)?,
                    y: s.values().to_vec(),
                    yerr: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let overlays = self
            .store
            .overlays()
            .into_iter()
            .map(|s| {
                let yerr = if self.errors.on_overlays() {
                    Some(derived::poisson_errors(s.values())?)
                } else {
                    None
                };
                Ok(SeriesArtifact {
                    name: s.name.clone(),
                    label: s.label().to_string(),
                    color: self.color_of(s)?,
                    y: s.values().to_vec(),
                    yerr,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let error_bands = if self.errors.on_histograms() {
            self.hist_error_bands(false, BandZeroPolicy::Fail)?
        } else {
            Vec::new()
        };

        let x_ticks = linspace(edges[0], edges[edges.len() - 1], X_TICK_COUNT);
        Ok(Hist1DArtifact {
            schema_version: "hepplot_hist1d_v0".to_string(),
            meta: ArtifactMeta::now()?,
            bin_centers: first.histogram.axis.centers(),
            bin_widths: first.histogram.axis.widths(),
            bin_edges: edges,
            x_ticks,
            stack: self.stack,
            histograms,
            overlays,
            stack_total: if self.stack { self.stack_total()? } else { None },
            error_bands,
            config: self.config.clone(),
        })
    }
}
