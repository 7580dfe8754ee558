//! Named sample loading and role classification.
//!
//! A [`SampleStore`] holds one 1-D histogram per sample name, all sharing the
//! same bin edges. Each sample is either drawn as histogram bins or as
//! overlay (data) points, depending on the [`OverlaySelection`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use hp_core::{Error, Histogram1D, Result};
use serde::Serialize;

use crate::input::read_histogram1d;

/// Extension of per-sample files: `<dir>/<name>.json`.
pub const SAMPLE_FILE_EXT: &str = "json";

/// How a sample is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRole {
    /// Bins, stackable.
    Histogram,
    /// Points with optional error bars.
    Overlay,
}

/// Which samples are drawn as overlay points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlaySelection {
    /// Every sample is a histogram.
    #[default]
    None,
    /// Every sample is an overlay.
    All,
    /// The named samples are overlays.
    Named(Vec<String>),
}

impl OverlaySelection {
    /// Build from user names; the single literal `"all"` selects every sample.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        match names {
            [] => Self::None,
            [only] if only.as_ref() == "all" => Self::All,
            _ => Self::Named(names.iter().map(|s| s.as_ref().to_string()).collect()),
        }
    }

    /// Role of sample `name`.
    pub fn role_of(&self, name: &str) -> SampleRole {
        let overlay = match self {
            Self::None => false,
            Self::All => true,
            Self::Named(names) => names.iter().any(|n| n == name),
        };
        if overlay { SampleRole::Overlay } else { SampleRole::Histogram }
    }

    fn check_known<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        if let Self::Named(overlays) = self {
            for o in overlays {
                if !names.iter().any(|n| n.as_ref() == o) {
                    return Err(Error::Lookup(format!("there is no sample named {o} in samples")));
                }
            }
        }
        Ok(())
    }
}

/// How a batch load reacts to an unreadable sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Return the first failure.
    #[default]
    FailFast,
    /// Keep every readable sample; failures are kept as diagnostics.
    CollectPartial,
}

/// A sample that could not be loaded under [`LoadPolicy::CollectPartial`].
#[derive(Debug)]
pub struct LoadFailure {
    /// Requested sample name.
    pub sample: String,
    /// File that was read.
    pub path: PathBuf,
    /// Why it failed.
    pub error: Error,
}

/// A named histogram with its role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Sample name.
    pub name: String,
    /// Histogram or overlay.
    pub role: SampleRole,
    /// Bin contents and axis.
    #[serde(skip)]
    pub histogram: Histogram1D,
}

impl Sample {
    /// Bin contents.
    pub fn values(&self) -> &[f64] {
        &self.histogram.values
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        self.histogram.edges()
    }

    /// Display label from the axis metadata, or the empty string.
    pub fn label(&self) -> &str {
        self.histogram.axis_label()
    }

    /// Drawn as points.
    pub fn is_overlay(&self) -> bool {
        self.role == SampleRole::Overlay
    }
}

/// Ordered, immutable group of samples sharing one binning.
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
    failures: Vec<LoadFailure>,
}

impl SampleStore {
    /// Load `<dir>/<name>.json` for every name.
    pub fn load<S: AsRef<str>>(
        dir: &Path,
        names: &[S],
        overlay: &OverlaySelection,
        policy: LoadPolicy,
    ) -> Result<Self> {
        if names.is_empty() {
            tracing::warn!(dir = %dir.display(), "no samples requested; store is empty");
            return Ok(Self::default());
        }
        overlay.check_known(names)?;
        check_unique(names)?;
        tracing::info!(dir = %dir.display(), n_samples = names.len(), "loading samples");

        let mut store = Self::default();
        for name in names {
            let name = name.as_ref();
            let path = dir.join(format!("{name}.{SAMPLE_FILE_EXT}"));
            let loaded = read_histogram1d(&path)
                .and_then(|h| store.push(name.to_string(), h, overlay.role_of(name)));
            if let Err(error) = loaded {
                match policy {
                    LoadPolicy::FailFast => return Err(error),
                    LoadPolicy::CollectPartial => {
                        tracing::warn!(sample = name, path = %path.display(), %error, "skipping sample");
                        store.failures.push(LoadFailure { sample: name.to_string(), path, error });
                    }
                }
            }
        }
        tracing::info!(
            histograms = store.histograms().len(),
            overlays = store.overlays().len(),
            failures = store.failures.len(),
            "samples loaded"
        );
        Ok(store)
    }

    /// Build a store from histograms already in memory.
    pub fn from_histograms(
        histograms: Vec<(String, Histogram1D)>,
        overlay: &OverlaySelection,
    ) -> Result<Self> {
        let names: Vec<&str> = histograms.iter().map(|(n, _)| n.as_str()).collect();
        if names.is_empty() {
            tracing::warn!("no samples given; store is empty");
            return Ok(Self::default());
        }
        overlay.check_known(&names)?;
        check_unique(&names)?;
        let mut store = Self::default();
        for (name, h) in histograms {
            let role = overlay.role_of(&name);
            store.push(name, h, role)?;
        }
        Ok(store)
    }

    fn push(&mut self, name: String, histogram: Histogram1D, role: SampleRole) -> Result<()> {
        if let Some(first) = self.samples.first()
            && first.edges() != histogram.edges()
        {
            return Err(Error::Validation(format!(
                "sample {name} has different bin edges from {}",
                first.name
            )));
        }
        self.samples.push(Sample { name, role, histogram });
        Ok(())
    }

    /// No samples loaded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of loaded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// All samples in load order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample names in load order.
    pub fn names(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.name.as_str()).collect()
    }

    /// Sample by name.
    pub fn get(&self, name: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.name == name)
    }

    /// Lookup that reports a missing name as an error.
    pub fn require(&self, name: &str) -> Result<&Sample> {
        self.get(name).ok_or_else(|| Error::Lookup(format!("selected sample {name} is not loaded")))
    }

    /// Histogram-role samples in load order.
    pub fn histograms(&self) -> Vec<&Sample> {
        self.samples.iter().filter(|s| !s.is_overlay()).collect()
    }

    /// Overlay-role samples in load order.
    pub fn overlays(&self) -> Vec<&Sample> {
        self.samples.iter().filter(|s| s.is_overlay()).collect()
    }

    /// Shared bin edges (empty for an empty store).
    pub fn edges(&self) -> &[f64] {
        self.samples.first().map(|s| s.edges()).unwrap_or(&[])
    }

    /// Shared bin count.
    pub fn n_bins(&self) -> usize {
        self.edges().len().saturating_sub(1)
    }

    /// Display labels in load order.
    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.label()).collect()
    }

    /// Samples skipped under [`LoadPolicy::CollectPartial`].
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }
}

fn check_unique<S: AsRef<str>>(names: &[S]) -> Result<()> {
    let mut seen = HashSet::new();
    for n in names {
        if !seen.insert(n.as_ref()) {
            return Err(Error::Validation(format!("duplicate sample name: {}", n.as_ref())));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::AxisMeta;

    fn hist(values: &[f64], label: &str) -> Histogram1D {
        let edges: Vec<f64> = (0..=values.len()).map(|i| i as f64).collect();
        Histogram1D::new(AxisMeta::new(edges).with_label(label), values.to_vec()).unwrap()
    }

    #[test]
    fn partition_counts_add_up() {
        let store = SampleStore::from_histograms(
            vec![
                ("ttbar".into(), hist(&[1.0, 2.0], "t#bar{t}")),
                ("wjets".into(), hist(&[3.0, 4.0], "W+jets")),
                ("data".into(), hist(&[5.0, 6.0], "Data")),
            ],
            &OverlaySelection::from_names(&["data"]),
        )
        .unwrap();
        assert_eq!(store.histograms().len() + store.overlays().len(), 3);
        assert_eq!(store.overlays()[0].name, "data");
        assert_eq!(store.labels(), vec!["t#bar{t}", "W+jets", "Data"]);
        assert_eq!(store.n_bins(), 2);
    }

    #[test]
    fn all_marker_routes_everything_to_overlay() {
        let sel = OverlaySelection::from_names(&["all"]);
        assert_eq!(sel, OverlaySelection::All);
        let store = SampleStore::from_histograms(
            vec![("a".into(), hist(&[1.0], "")), ("b".into(), hist(&[2.0], ""))],
            &sel,
        )
        .unwrap();
        assert!(store.histograms().is_empty());
        assert_eq!(store.overlays().len(), 2);
    }

    #[test]
    fn unknown_overlay_is_lookup_error() {
        let err = SampleStore::from_histograms(
            vec![("a".into(), hist(&[1.0], ""))],
            &OverlaySelection::from_names(&["data"]),
        );
        assert!(matches!(err, Err(Error::Lookup(_))));
    }

    #[test]
    fn mismatched_edges_are_rejected() {
        let err = SampleStore::from_histograms(
            vec![("a".into(), hist(&[1.0], "")), ("b".into(), hist(&[1.0, 2.0], ""))],
            &OverlaySelection::None,
        );
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = SampleStore::from_histograms(
            vec![("a".into(), hist(&[1.0], "")), ("a".into(), hist(&[2.0], ""))],
            &OverlaySelection::None,
        );
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn empty_input_gives_empty_store() {
        let store = SampleStore::from_histograms(Vec::new(), &OverlaySelection::None).unwrap();
        assert!(store.is_empty());
        assert!(store.edges().is_empty());
        let names: [&str; 0] = [];
        let store = SampleStore::load(Path::new("/nonexistent"), &names, &OverlaySelection::None, LoadPolicy::FailFast)
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn require_reports_missing() {
        let store =
            SampleStore::from_histograms(vec![("a".into(), hist(&[1.0], ""))], &OverlaySelection::None)
                .unwrap();
        assert!(store.require("a").is_ok());
        assert!(matches!(store.require("b"), Err(Error::Lookup(_))));
    }
}
