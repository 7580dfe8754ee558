//! Histogram plot with a ratio panel underneath.
//!
//! The main panel is an ordinary [`Hist1DPlot`]. The lower panel shows every
//! numerator divided bin-by-bin by the reference, with a zero reference bin
//! giving a ratio of 0.

use hp_core::{Error, Result};
use serde::Serialize;

use crate::artifact::ArtifactMeta;
use crate::axis::{AxisPlan, AxisRangePlanner, linspace};
use crate::color::Color;
use crate::config::{PanelLayout, PlotConfiguration, Shape};
use crate::derived::{self, BandZeroPolicy, RatioPolicy};
use crate::hist1d::{ErrorBand, Hist1DArtifact, Hist1DOptions, Hist1DPlot, X_TICK_COUNT};
use crate::samples::{SampleRole, SampleStore};

/// Name used for the stacked-total reference.
pub const TOTAL_REFERENCE: &str = "total";

/// Denominator of the ratio panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A loaded sample is the denominator; all other samples are numerators.
    Sample(String),
    /// The stack total is the denominator; the single overlay is the numerator.
    Total,
}

impl Reference {
    /// `"total"` selects the stack total, anything else a sample.
    pub fn parse(s: &str) -> Self {
        if s == TOTAL_REFERENCE { Self::Total } else { Self::Sample(s.to_string()) }
    }

    /// Name written into artifacts and titles.
    pub fn name(&self) -> &str {
        match self {
            Self::Sample(name) => name,
            Self::Total => TOTAL_REFERENCE,
        }
    }
}

/// One numerator in the ratio panel.
#[derive(Debug, Clone, Serialize)]
pub struct RatioSeries {
    /// Numerator sample name.
    pub name: String,
    /// Histogram numerators draw as steps, overlays as points.
    pub role: SampleRole,
    /// Colour of the sample in the main panel.
    pub color: Color,
    /// Histogram numerators are drawn as steps from this baseline.
    pub baseline: f64,
    /// Fill between the step and the baseline.
    pub filled: bool,
    /// Ratio per bin.
    pub y: Vec<f64>,
}

/// Numbers-first artifact of a histogram plot with a ratio panel.
#[derive(Debug, Clone, Serialize)]
pub struct RatioArtifact {
    /// Schema version (`hepplot_ratio_v0`).
    pub schema_version: String,
    /// Producer metadata.
    pub meta: ArtifactMeta,
    /// Reference name, or `total`.
    pub reference: String,
    /// How the ratios were formed.
    pub ratio_policy: RatioPolicy,
    /// Upper panel.
    pub main: Hist1DArtifact,
    /// Reference values per bin.
    pub denominator: Vec<f64>,
    /// Numerators in load order.
    pub ratios: Vec<RatioSeries>,
    /// Relative uncertainty bands around 1.
    pub ratio_bands: Vec<ErrorBand>,
    /// Shared x ticks.
    pub x_ticks: Vec<f64>,
    /// Custom lower-panel y axis, if one was planned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisPlan>,
    /// Lower-panel y title.
    pub y_title: String,
    /// Panel spacing and stretch.
    pub layout: PanelLayout,
    /// Main panel to ratio panel.
    pub height_ratios: [f64; 2],
}

/// [`Hist1DPlot`] plus per-numerator ratios against a reference.
#[derive(Debug)]
pub struct RatioPlot {
    main: Hist1DPlot,
    reference: Reference,
    denominator: Vec<f64>,
    ratios: Vec<(String, Vec<f64>)>,
    y_axis: Option<AxisPlan>,
    layout: PanelLayout,
    band_zeros: BandZeroPolicy,
}

impl RatioPlot {
    /// Build the main panel and compute ratios against `reference`.
    pub fn new(store: SampleStore, reference: Reference, options: Hist1DOptions) -> Result<Self> {
        let main = Hist1DPlot::new(store, options)?;
        let (denominator, ratios) = compute(&main, &reference)?;
        Ok(Self {
            main,
            reference,
            denominator,
            ratios,
            y_axis: None,
            layout: PanelLayout::new(0.0, 4.0),
            band_zeros: BandZeroPolicy::default(),
        })
    }

    /// Upper panel.
    pub fn main(&self) -> &Hist1DPlot {
        &self.main
    }

    /// Upper panel, mutable.
    pub fn main_mut(&mut self) -> &mut Hist1DPlot {
        &mut self.main
    }

    /// Current reference.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Reference values per bin.
    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    /// Ratio values per numerator, in load order.
    pub fn ratios(&self) -> &[(String, Vec<f64>)] {
        &self.ratios
    }

    /// Switch the reference and recompute every ratio.
    pub fn set_reference(&mut self, reference: Reference) -> Result<()> {
        let (denominator, ratios) = compute(&self.main, &reference)?;
        self.reference = reference;
        self.denominator = denominator;
        self.ratios = ratios;
        Ok(())
    }

    /// How empty bins in the ratio bands are handled.
    pub fn set_band_zero_policy(&mut self, zeros: BandZeroPolicy) {
        self.band_zeros = zeros;
    }

    /// Custom y axis for the ratio panel; `step` defaults to 1.
    pub fn ratio_options(&mut self, ylims: [f64; 2], step: Option<f64>, edges: bool) -> Result<()> {
        let mut planner = AxisRangePlanner::default().with_edge_labels(edges);
        if let Some(step) = step {
            planner = planner.with_step(step);
        }
        self.y_axis = Some(planner.plan(ylims[0], ylims[1], 0.0, Some(ylims))?);
        Ok(())
    }

    /// Planned lower-panel y axis.
    pub fn y_axis(&self) -> Option<&AxisPlan> {
        self.y_axis.as_ref()
    }

    /// Panel spacing and stretch.
    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    /// Figure options; `spacing` and `stretch` size the panels.
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        let mut config = self.main.config().clone();
        self.layout.apply_figure_options(&mut config, options)?;
        *self.main.config_mut() = config;
        Ok(())
    }

    fn config(&self) -> &PlotConfiguration {
        self.main.config()
    }

    /// Lower-panel y title: the `ybot` title, or one naming the reference.
    pub fn y_title(&self) -> String {
        let ybot = &self.config().titles.ybot;
        if ybot.is_empty() {
            format!("Ratio against \n{}", self.reference.name())
        } else {
            ybot.clone()
        }
    }

    fn ratio_bands(&self) -> Result<Vec<ErrorBand>> {
        if !self.main.errors().on_histograms() {
            return Ok(Vec::new());
        }
        self.main.hist_error_bands(true, self.band_zeros)
    }

    /// Resolve both panels into an artifact.
    pub fn artifact(&self) -> Result<RatioArtifact> {
        let store = self.main.store();
        let filled = self.config().shape == Shape::Full;
        let ratios = self
            .ratios
            .iter()
            .map(|(name, y)| {
                let sample = store.require(name)?;
                Ok(RatioSeries {
                    name: name.clone(),
                    role: sample.role,
                    color: self.main.color_of(sample)?,
                    baseline: 1.0,
                    filled: filled && !sample.is_overlay(),
                    y: y.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let edges = store.edges();
        let ratio_policy = RatioPolicy {
            numerator: "sample bin value".to_string(),
            denominator: match self.reference {
                Reference::Sample(_) => "reference sample bin value".to_string(),
                Reference::Total => "stacked histogram total".to_string(),
            },
            zero_policy: "ratio is 0 where the denominator is exactly 0".to_string(),
        };
        Ok(RatioArtifact {
            schema_version: "hepplot_ratio_v0".to_string(),
            meta: ArtifactMeta::now()?,
            reference: self.reference.name().to_string(),
            ratio_policy,
            main: self.main.artifact()?,
            denominator: self.denominator.clone(),
            ratios,
            ratio_bands: self.ratio_bands()?,
            x_ticks: linspace(edges[0], edges[edges.len() - 1], X_TICK_COUNT),
            y_axis: self.y_axis.clone(),
            y_title: self.y_title(),
            layout: self.layout,
            height_ratios: [self.layout.stretch, 1.0],
        })
    }
}

type RatioSet = (Vec<f64>, Vec<(String, Vec<f64>)>);

fn compute(main: &Hist1DPlot, reference: &Reference) -> Result<RatioSet> {
    let store = main.store();
    let (denominator, numerators) = match reference {
        Reference::Sample(name) => {
            let den = store.require(name)?;
            let nums: Vec<_> = store.samples().iter().filter(|s| &s.name != name).collect();
            (den.values().to_vec(), nums)
        }
        Reference::Total => {
            let overlays = store.overlays();
            if overlays.len() != 1 {
                return Err(Error::Validation(format!(
                    "a total reference needs exactly one overlay sample, got {}",
                    overlays.len()
                )));
            }
            let total = main.stack_total()?.ok_or_else(|| {
                Error::Validation("a total reference needs at least one histogram sample".to_string())
            })?;
            (total, overlays)
        }
    };
    let ratios = numerators
        .into_iter()
        .map(|s| Ok((s.name.clone(), derived::ratio(s.values(), &denominator)?)))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(reference = reference.name(), numerators = ratios.len(), "ratios computed");
    Ok((denominator, ratios))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist1d::ErrorDisplay;
    use crate::samples::OverlaySelection;
    use approx::assert_abs_diff_eq;
    use hp_core::{AxisMeta, Histogram1D};
    use serde_json::json;

    fn store(overlay: &[&str], samples: &[(&str, &[f64])]) -> SampleStore {
        let hs = samples
            .iter()
            .map(|(n, v)| {
                let edges: Vec<f64> = (0..=v.len()).map(|i| i as f64).collect();
                (n.to_string(), Histogram1D::new(AxisMeta::new(edges), v.to_vec()).unwrap())
            })
            .collect();
        SampleStore::from_histograms(hs, &OverlaySelection::from_names(overlay)).unwrap()
    }

    #[test]
    fn sample_reference() {
        let s = store(&["data"], &[("mc", &[2.0, 0.0, 3.0]), ("data", &[4.0, 5.0, 9.0])]);
        let p = RatioPlot::new(s, Reference::Sample("mc".into()), Hist1DOptions::default()).unwrap();
        assert_eq!(p.ratios().len(), 1);
        assert_eq!(p.ratios()[0].0, "data");
        assert_eq!(p.ratios()[0].1, vec![2.0, 0.0, 3.0]);
    }

    #[test]
    fn unknown_reference_is_lookup_error() {
        let s = store(&[], &[("mc", &[1.0])]);
        let err = RatioPlot::new(s, Reference::Sample("nope".into()), Hist1DOptions::default());
        assert!(matches!(err, Err(Error::Lookup(_))));
    }

    #[test]
    fn total_reference_uses_stack_sum() {
        let s = store(
            &["data"],
            &[("a", &[1.0, 2.0]), ("b", &[1.0, 2.0]), ("data", &[3.0, 2.0])],
        );
        let p = RatioPlot::new(
            s,
            Reference::parse("total"),
            Hist1DOptions { stack: true, ..Default::default() },
        )
        .unwrap();
        assert_eq!(p.denominator(), &[2.0, 4.0]);
        assert_abs_diff_eq!(p.ratios()[0].1[0], 1.5);
        assert_abs_diff_eq!(p.ratios()[0].1[1], 0.5);
    }

    #[test]
    fn total_reference_needs_one_overlay() {
        let s = store(&[], &[("a", &[1.0]), ("b", &[1.0])]);
        assert!(matches!(
            RatioPlot::new(s, Reference::Total, Hist1DOptions::default()),
            Err(Error::Validation(_))
        ));
        let s = store(&["d1", "d2"], &[("a", &[1.0]), ("d1", &[1.0]), ("d2", &[1.0])]);
        assert!(RatioPlot::new(s, Reference::Total, Hist1DOptions::default()).is_err());
    }

    #[test]
    fn set_reference_recomputes() {
        let s = store(&[], &[("a", &[2.0]), ("b", &[4.0]), ("c", &[8.0])]);
        let mut p = RatioPlot::new(s, Reference::Sample("a".into()), Hist1DOptions::default()).unwrap();
        assert_eq!(p.ratios()[0], ("b".to_string(), vec![2.0]));
        p.set_reference(Reference::Sample("c".into())).unwrap();
        assert_eq!(p.ratios()[0], ("a".to_string(), vec![0.25]));
        assert_eq!(p.ratios()[1], ("b".to_string(), vec![0.5]));
        assert!(p.set_reference(Reference::Sample("z".into())).is_err());
        assert_eq!(p.reference(), &Reference::Sample("c".into()));
    }

    #[test]
    fn ratio_options_plan_custom_axis() {
        let s = store(&[], &[("a", &[1.0]), ("b", &[1.0])]);
        let mut p = RatioPlot::new(s, Reference::Sample("a".into()), Hist1DOptions::default()).unwrap();
        p.ratio_options([0.5, 1.5], Some(0.25), false).unwrap();
        let axis = p.y_axis().unwrap();
        assert_eq!(axis.ticks.len(), 5);
        assert_eq!(axis.labels, vec!["", "0.75", "1.00", "1.25", ""]);
        assert!(p.ratio_options([1.0, 0.0], None, false).is_err());
    }

    #[test]
    fn ratio_options_reject_vanishing_step() {
        let s = store(&[], &[("a", &[1.0]), ("b", &[1.0])]);
        let mut p = RatioPlot::new(s, Reference::Sample("a".into()), Hist1DOptions::default()).unwrap();
        p.ratio_options([0.5, 1.5], Some(0.5), true).unwrap();
        let err = p.ratio_options([0.0, 1.0], Some(1e-20), false);
        assert!(matches!(err, Err(Error::Validation(_))), "got {err:?}");
        assert_eq!(p.y_axis().unwrap().step, 0.5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let s = store(&[], &[("a", &[1.0]), ("b", &[1.0])]);
        let mut config = PlotConfiguration::default();
        config.params.font_size = -5.0;
        let opts = Hist1DOptions { config, ..Default::default() };
        let err = RatioPlot::new(s, Reference::Sample("a".into()), opts);
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn y_title_defaults_to_reference() {
        let s = store(&[], &[("mc", &[1.0]), ("b", &[1.0])]);
        let mut p = RatioPlot::new(s, Reference::Sample("mc".into()), Hist1DOptions::default()).unwrap();
        assert_eq!(p.y_title(), "Ratio against \nmc");
        p.main_mut().config_mut().set_axis_labels(None, [("ybot", "Data / MC")]).unwrap();
        assert_eq!(p.y_title(), "Data / MC");
    }

    #[test]
    fn figure_options_set_layout() {
        let s = store(&[], &[("a", &[1.0]), ("b", &[1.0])]);
        let mut p = RatioPlot::new(s, Reference::Sample("a".into()), Hist1DOptions::default()).unwrap();
        assert_eq!(p.layout(), PanelLayout::new(0.0, 4.0));
        p.figure_options([("stretch", json!(3)), ("title", json!("SR"))]).unwrap();
        assert_eq!(p.layout().stretch, 3.0);
        assert_eq!(p.main().config().figure.title, "SR");
        let art = p.artifact().unwrap();
        assert_eq!(art.height_ratios, [3.0, 1.0]);
    }

    #[test]
    fn ratio_bands_follow_zero_policy() {
        let s = store(&[], &[("a", &[4.0, 0.0]), ("b", &[1.0, 1.0])]);
        let opts = Hist1DOptions { stack: true, errors: ErrorDisplay::Hist, ..Default::default() };
        let mut p = RatioPlot::new(s, Reference::Sample("a".into()), opts).unwrap();
        // Stack total [5, 1]: no empty bins.
        let art = p.artifact().unwrap();
        assert_eq!(art.ratio_bands.len(), 1);
        assert_abs_diff_eq!(art.ratio_bands[0].band.hi[1], 2.0);

        let s = store(&[], &[("a", &[4.0, 0.0])]);
        let opts = Hist1DOptions { errors: ErrorDisplay::Hist, ..Default::default() };
        p = RatioPlot::new(s, Reference::Sample("a".into()), opts).unwrap();
        assert!(matches!(p.artifact(), Err(Error::Domain(_))));
        p.set_band_zero_policy(BandZeroPolicy::Unit);
        let art = p.artifact().unwrap();
        assert_eq!(art.ratio_bands[0].band.lo[1], 1.0);
    }
}
