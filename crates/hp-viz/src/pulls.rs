//! Pull plots: one horizontal error bar per parameter over ±1σ/±2σ bands.

use std::collections::BTreeMap;

use hp_core::{Error, PullTable, Result};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactMeta;
use crate::axis::{AxisPlan, AxisRangePlanner, TickPrecision};
use crate::color::Color;
use crate::config::{Marker, PlotConfiguration, UnknownKeyPolicy};

/// Figure height fitted to the entry count; drifts for n beyond ~140.
pub fn pull_figure_size(n: usize) -> [f64; 2] {
    [2.0, 0.4012 * (n as f64).powf(0.763)]
}

/// Side of the figure that carries the parameter labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSide {
    /// Labels left of the bars.
    Left,
    /// Labels right of the bars.
    #[default]
    Right,
}

impl LabelSide {
    /// Parse `left` or `right`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(Error::Validation(format!("label side must be left or right, got {other:?}"))),
        }
    }
}

/// Pull marker appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    /// Marker and error bar colour.
    pub color: Color,
    /// Marker symbol.
    pub symbol: Marker,
    /// Marker size in points.
    pub size: f64,
    /// Error bar width.
    pub line_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self { color: Color::rgb(0, 0, 0), symbol: Marker::circle(), size: 3.0, line_width: 1.0 }
    }
}

/// Arguments of [`PullPlot::plot_options`].
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Axis and band center; `None` keeps the current one.
    pub center: Option<f64>,
    /// Custom `[xmin, xmax]`.
    pub range: Option<[f64; 2]>,
    /// Renderer style overrides.
    pub style: BTreeMap<String, serde_json::Value>,
    /// How unknown style keys are handled.
    pub unknown_keys: UnknownKeyPolicy,
}

/// One parameter row.
#[derive(Debug, Clone, Serialize)]
pub struct PullPoint {
    /// Parameter label.
    pub label: String,
    /// Row position, 0 at the bottom.
    pub y: f64,
    /// Fitted value.
    pub value: f64,
    /// Distance to the left end of the error bar (non-negative).
    pub err_lo: f64,
    /// Distance to the right end of the error bar.
    pub err_hi: f64,
}

/// Vertical band at `center ± n_sigma`.
#[derive(Debug, Clone, Serialize)]
pub struct SigmaBand {
    /// Band half width.
    pub n_sigma: u8,
    /// Left edge.
    pub lo: f64,
    /// Right edge.
    pub hi: f64,
    /// Fill colour.
    pub color: Color,
}

/// Numbers-first pull plot artifact.
#[derive(Debug, Clone, Serialize)]
pub struct PullArtifact {
    /// Schema version (`hepplot_pulls_v0`).
    pub schema_version: String,
    /// Producer metadata.
    pub meta: ArtifactMeta,
    /// Band center.
    pub center: f64,
    /// Rows bottom to top.
    pub entries: Vec<PullPoint>,
    /// ±2σ band, then ±1σ.
    pub sigma_bands: Vec<SigmaBand>,
    /// Vertical limits, one row beyond the entries on each side.
    pub y_range: [f64; 2],
    /// Horizontal axis.
    pub x_axis: AxisPlan,
    /// Side carrying the labels.
    pub label_side: LabelSide,
    /// Marker appearance.
    pub marker: MarkerStyle,
    /// Styling the renderer applies.
    pub config: PlotConfiguration,
}

/// Pull plot over a [`PullTable`].
#[derive(Debug, Clone)]
pub struct PullPlot {
    table: PullTable,
    center: f64,
    range: Option<[f64; 2]>,
    label_side: LabelSide,
    one_sigma: Color,
    two_sigma: Color,
    marker: MarkerStyle,
    config: PlotConfiguration,
}

impl PullPlot {
    /// Center on the first entry and fit the figure height to the table.
    pub fn new(table: PullTable, mut config: PlotConfiguration) -> Result<Self> {
        table.validate()?;
        config.validate()?;
        let center = table.entries[0].value;
        config.figure.size = pull_figure_size(table.entries.len());
        Ok(Self {
            table,
            center,
            range: None,
            label_side: LabelSide::default(),
            one_sigma: Color::rgb(50, 205, 50),
            two_sigma: Color::rgb(255, 255, 0),
            marker: MarkerStyle::default(),
            config,
        })
    }

    /// Current center.
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Current configuration.
    pub fn config(&self) -> &PlotConfiguration {
        &self.config
    }

    /// Direct access to the configuration.
    pub fn config_mut(&mut self) -> &mut PlotConfiguration {
        &mut self.config
    }

    /// Side carrying the labels.
    pub fn label_side(&self) -> LabelSide {
        self.label_side
    }

    /// Set center, range and style; nothing changes on error.
    pub fn plot_options(&mut self, options: PullOptions) -> Result<()> {
        if let Some(c) = options.center
            && !c.is_finite()
        {
            return Err(Error::Validation(format!("pull center must be finite, got {c}")));
        }
        if let Some([lo, hi]) = options.range
            && !(lo.is_finite() && hi.is_finite() && lo < hi)
        {
            return Err(Error::Validation(format!("invalid pull range [{lo}, {hi}]")));
        }
        self.config.merge_style(&options.style, options.unknown_keys)?;
        if let Some(c) = options.center {
            self.center = c;
        }
        if options.range.is_some() {
            self.range = options.range;
        }
        Ok(())
    }

    /// Figure options plus `label_side`; a manual `size` is allowed but logged.
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        let mut side = self.label_side;
        let mut rest = Vec::new();
        for (key, value) in options {
            match key {
                "label_side" => {
                    let s = value.as_str().ok_or_else(|| {
                        Error::Validation(format!("label_side expects a string, got {value}"))
                    })?;
                    side = LabelSide::parse(s)?;
                }
                "size" => {
                    tracing::warn!("manually changing the pull plot figure size");
                    rest.push((key, value));
                }
                _ => rest.push((key, value)),
            }
        }
        self.config.figure_options(rest)?;
        self.label_side = side;
        Ok(())
    }

    /// Override the marker or band colours; `None` keeps the current one.
    pub fn color_options(&mut self, marker: Option<Color>, one_sigma: Option<Color>, two_sigma: Option<Color>) {
        if let Some(c) = marker {
            self.marker.color = c;
        }
        if let Some(c) = one_sigma {
            self.one_sigma = c;
        }
        if let Some(c) = two_sigma {
            self.two_sigma = c;
        }
    }

    /// Unit-step x axis, either custom or symmetric around the center.
    ///
    /// Labels are integers when the axis ends are; otherwise the precision
    /// is picked from the ticks.
    pub fn x_axis(&self) -> Result<AxisPlan> {
        let entries = &self.table.entries;
        let down = entries.iter().map(|e| e.down_error()).fold(f64::NEG_INFINITY, f64::max);
        let up = entries.iter().map(|e| e.pos_err).fold(f64::NEG_INFINITY, f64::max);
        let integral = |v: f64| v.fract() == 0.0;
        let integral_ends = match self.range {
            Some([lo, hi]) => integral(lo) && integral(hi),
            None => integral(self.center),
        };
        let planner = AxisRangePlanner::default().with_edge_labels(true);
        let planner =
            if integral_ends { planner.with_precision(TickPrecision::Integer) } else { planner };
        planner.plan(down, up, self.center, self.range)
    }

    /// Resolve rows, bands and the x axis into an artifact.
    pub fn artifact(&self) -> Result<PullArtifact> {
        let entries = self
            .table
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| PullPoint {
                label: e.label.clone(),
                y: i as f64,
                value: e.value,
                err_lo: e.down_error(),
                err_hi: e.pos_err,
            })
            .collect();
        let band = |n_sigma: u8, color: Color| SigmaBand {
            n_sigma,
            lo: self.center - f64::from(n_sigma),
            hi: self.center + f64::from(n_sigma),
            color,
        };
        Ok(PullArtifact {
            schema_version: "hepplot_pulls_v0".to_string(),
            meta: ArtifactMeta::now()?,
            center: self.center,
            entries,
            sigma_bands: vec![band(2, self.two_sigma), band(1, self.one_sigma)],
            y_range: [-1.0, self.table.entries.len() as f64],
            x_axis: self.x_axis()?,
            label_side: self.label_side,
            marker: self.marker.clone(),
            config: self.config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hp_core::PullEntry;
    use serde_json::json;

    fn table() -> PullTable {
        PullTable {
            entries: vec![
                PullEntry { label: "mu".into(), value: 0.0, pos_err: 1.0, neg_err: -1.0 },
                PullEntry { label: "jes".into(), value: 0.4, pos_err: 0.8, neg_err: -2.3 },
                PullEntry { label: "lumi".into(), value: -0.2, pos_err: 0.9, neg_err: -0.9 },
            ],
        }
    }

    #[test]
    fn figure_size_follows_entry_count() {
        let p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        assert_abs_diff_eq!(p.config().figure.size[0], 2.0);
        assert_abs_diff_eq!(p.config().figure.size[1], 0.4012 * 3f64.powf(0.763), epsilon = 1e-12);
    }

    #[test]
    fn empty_table_is_rejected() {
        let t = PullTable { entries: Vec::new() };
        assert!(PullPlot::new(t, PlotConfiguration::default()).is_err());
    }

    #[test]
    fn symmetric_axis_from_errors() {
        let p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        // ceil(2.3) + 2 = 5 around center 0.
        let axis = p.x_axis().unwrap();
        assert_eq!((axis.min, axis.max), (-5.0, 5.0));
        assert_eq!(axis.ticks.len(), 11);
        assert_eq!(axis.labels.first().map(String::as_str), Some("-5"));
        assert_eq!(axis.labels.last().map(String::as_str), Some("5"));
    }

    #[test]
    fn center_and_range_overrides() {
        let mut p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        p.plot_options(PullOptions { center: Some(1.0), ..Default::default() }).unwrap();
        let axis = p.x_axis().unwrap();
        assert_eq!((axis.min, axis.max), (-4.0, 6.0));

        p.plot_options(PullOptions { range: Some([-3.0, 3.0]), ..Default::default() }).unwrap();
        assert_eq!(p.x_axis().unwrap().ticks.len(), 7);
        assert!(p.plot_options(PullOptions { range: Some([3.0, -3.0]), ..Default::default() }).is_err());
    }

    #[test]
    fn half_integer_range_keeps_labels_distinct() {
        let mut p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        p.plot_options(PullOptions { range: Some([-2.5, 2.5]), ..Default::default() }).unwrap();
        let axis = p.x_axis().unwrap();
        assert_eq!(axis.precision, TickPrecision::One);
        assert_eq!(axis.labels, vec!["-2.5", "-1.5", "-0.5", "0.5", "1.5", "2.5"]);

        let mut p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        p.plot_options(PullOptions { center: Some(0.5), ..Default::default() }).unwrap();
        let axis = p.x_axis().unwrap();
        assert_eq!(axis.labels.first().map(String::as_str), Some("-4.5"));
        assert_eq!(axis.precision, TickPrecision::One);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PlotConfiguration::default();
        config.params.xaxis_labellocation = "sideways".into();
        assert!(matches!(PullPlot::new(table(), config), Err(Error::Validation(_))));
    }

    #[test]
    fn bands_and_colors() {
        let mut p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        p.color_options(Some(Color::rgb(0, 0, 255)), None, Some(Color::rgb(255, 165, 0)));
        let art = p.artifact().unwrap();
        assert_eq!(art.sigma_bands[0].n_sigma, 2);
        assert_eq!((art.sigma_bands[0].lo, art.sigma_bands[0].hi), (-2.0, 2.0));
        assert_eq!(art.sigma_bands[0].color, Color::rgb(255, 165, 0));
        assert_eq!(art.sigma_bands[1].color, Color::rgb(50, 205, 50));
        assert_eq!(art.marker.color, Color::rgb(0, 0, 255));
        assert_eq!(art.entries[1].err_lo, 2.3);
        assert_eq!(art.y_range, [-1.0, 3.0]);
    }

    #[test]
    fn figure_options_label_side() {
        let mut p = PullPlot::new(table(), PlotConfiguration::default()).unwrap();
        assert_eq!(p.label_side(), LabelSide::Right);
        p.figure_options([("label_side", json!("left")), ("size", json!([3.0, 5.0]))]).unwrap();
        assert_eq!(p.label_side(), LabelSide::Left);
        assert_eq!(p.config().figure.size, [3.0, 5.0]);
        assert!(p.figure_options([("label_side", json!("top"))]).is_err());
    }
}
