//! Plot configuration: figure, fonts, axis titles, grid, markers and
//! renderer style parameters, plus YAML resolution over experiment presets.
//!
//! Every setter validates before it assigns, and [`PlotConfiguration::validate`]
//! applies the same rules to a configuration built by hand or from YAML.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use hp_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::theme::ExperimentStyle;

/// Top-level plot configuration (YAML or programmatic).
///
/// An owned value threaded into every plot; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfiguration {
    /// Experiment preset the rest was derived from.
    pub style: ExperimentStyle,
    /// Title, size and logo text.
    pub figure: FigureOptions,
    /// Title and axis-label font sizes.
    pub fonts: FontConfig,
    /// Axis titles per panel.
    pub titles: AxisTitles,
    /// How histogram samples are drawn.
    pub shape: Shape,
    /// No grid when absent.
    pub grid: Option<GridSpec>,
    /// Legend column count.
    pub legend_columns: NonZeroU32,
    /// Renderer style parameters.
    pub params: StyleParams,
}

impl Default for PlotConfiguration {
    fn default() -> Self {
        ExperimentStyle::Atlas.base_config()
    }
}

impl PlotConfiguration {
    /// Check every field against the rules the setters enforce.
    pub fn validate(&self) -> Result<()> {
        let [w, h] = self.figure.size;
        positive("figure width", w)?;
        positive("figure height", h)?;
        positive("title font size", self.fonts.title)?;
        positive("label font size", self.fonts.labels)?;
        self.params.validate()
    }

    /// Set the sample shape, rejecting `full` for overlaid (non-stacked) multi-histogram plots.
    pub fn set_shape(&mut self, shape: Shape, stacking: bool, n_histograms: usize) -> Result<()> {
        if shape == Shape::Full && !stacking && n_histograms > 1 {
            return Err(Error::Validation(
                "full shape requires a stack plot or a single histogram".to_string(),
            ));
        }
        self.shape = shape;
        Ok(())
    }

    /// Parse and set a grid string such as `y:` or `both--`.
    pub fn set_grid(&mut self, spec: &str) -> Result<()> {
        self.grid = Some(spec.parse()?);
        Ok(())
    }

    /// Set the marker symbol; it must be one of [`KNOWN_MARKERS`].
    pub fn set_marker(&mut self, marker: &str) -> Result<()> {
        self.params.lines_marker = marker.parse()?;
        Ok(())
    }

    /// Overlay marker size; must be positive.
    pub fn set_marker_size(&mut self, size: f64) -> Result<()> {
        self.params.lines_markersize = positive("lines.markersize", size)?;
        Ok(())
    }

    /// Number of legend columns; must be positive.
    pub fn set_legend_columns(&mut self, columns: u32) -> Result<()> {
        self.legend_columns = NonZeroU32::new(columns).ok_or_else(|| {
            Error::Validation("legend column count must be a positive integer".to_string())
        })?;
        Ok(())
    }

    /// Title, axis-label and tick-label font sizes; `None` keeps the current value.
    pub fn fontsize_options(
        &mut self,
        title: Option<f64>,
        labels: Option<f64>,
        ticks: Option<f64>,
    ) -> Result<()> {
        if let Some(t) = title {
            self.fonts.title = positive("title font size", t)?;
        }
        if let Some(l) = labels {
            self.fonts.labels = positive("label font size", l)?;
        }
        if let Some(t) = ticks {
            self.params.font_size = positive("font.size", t)?;
        }
        Ok(())
    }

    /// Set axis titles; keys are `xmain`, `ytop`, `xbot`, etc.
    pub fn set_axis_labels<'a>(
        &mut self,
        font_size: Option<f64>,
        labels: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<()> {
        let mut titles = self.titles.clone();
        for (key, value) in labels {
            titles.set(key, value)?;
        }
        if let Some(size) = font_size {
            self.fonts.labels = positive("label font size", size)?;
        }
        self.titles = titles;
        Ok(())
    }

    /// Merge renderer style overrides into [`StyleParams`].
    pub fn merge_style(
        &mut self,
        overrides: &BTreeMap<String, serde_json::Value>,
        policy: UnknownKeyPolicy,
    ) -> Result<()> {
        self.params.merge(overrides, policy)
    }

    /// Apply figure options given as `(key, value)` pairs; unknown keys are rejected.
    pub fn figure_options<'a>(
        &mut self,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        let mut figure = self.figure.clone();
        for (key, value) in options {
            figure.set(key, value)?;
        }
        self.figure = figure;
        Ok(())
    }
}

fn positive(what: &str, v: f64) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(Error::Validation(format!("{what} must be positive, got {v}")))
    }
}

/// Figure-level options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureOptions {
    /// Figure title, empty for none.
    pub title: String,
    /// Width, height in inches.
    pub size: [f64; 2],
    /// Text next to the experiment label.
    pub logo_text: String,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self { title: String::new(), size: [6.4, 4.8], logo_text: "Internal".into() }
    }
}

impl FigureOptions {
    /// Set one option: `title`, `logo_text` or `size`.
    pub fn set(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        match key {
            "title" => self.title = expect_str(key, &value)?.to_string(),
            "logo_text" => self.logo_text = expect_str(key, &value)?.to_string(),
            "size" => {
                let size: [f64; 2] = serde_json::from_value(value)?;
                self.size = [positive("figure width", size[0])?, positive("figure height", size[1])?];
            }
            other => {
                return Err(Error::Validation(format!("unknown figure option: {other}")));
            }
        }
        Ok(())
    }
}

/// Gap and main/side height ratio of a multi-panel figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelLayout {
    /// Gap between panels.
    pub spacing: f64,
    /// Main panel size relative to a side panel.
    pub stretch: f64,
}

impl PanelLayout {
    /// Layout with the given gap and stretch.
    pub const fn new(spacing: f64, stretch: f64) -> Self {
        Self { spacing, stretch }
    }

    /// Split panel keys (`spacing`, `stretch`) out of figure options and
    /// apply the rest to `config`. Nothing changes on error.
    pub fn apply_figure_options<'a>(
        &mut self,
        config: &mut PlotConfiguration,
        options: impl IntoIterator<Item = (&'a str, serde_json::Value)>,
    ) -> Result<()> {
        let mut next = *self;
        let mut rest = Vec::new();
        for (key, value) in options {
            match key {
                "spacing" => {
                    let v = expect_f64(key, &value)?;
                    if !(v.is_finite() && v >= 0.0) {
                        return Err(Error::Validation(format!("spacing must be non-negative, got {v}")));
                    }
                    next.spacing = v;
                }
                "stretch" => next.stretch = positive(key, expect_f64(key, &value)?)?,
                _ => rest.push((key, value)),
            }
        }
        config.figure_options(rest)?;
        *self = next;
        Ok(())
    }
}

/// Font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    /// Figure title.
    pub title: f64,
    /// Axis titles.
    pub labels: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { title: 20.0, labels: 15.0 }
    }
}

/// Axis titles for every panel of the main/top/bot/left/right subplot scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(missing_docs)]
pub struct AxisTitles {
    pub xmain: String,
    pub xtop: String,
    pub xbot: String,
    pub xleft: String,
    pub xright: String,
    pub ymain: String,
    pub ytop: String,
    pub ybot: String,
    pub yleft: String,
    pub yright: String,
}

impl AxisTitles {
    /// Set the title named by `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let slot = match key {
            "xmain" => &mut self.xmain,
            "xtop" => &mut self.xtop,
            "xbot" => &mut self.xbot,
            "xleft" => &mut self.xleft,
            "xright" => &mut self.xright,
            "ymain" => &mut self.ymain,
            "ytop" => &mut self.ytop,
            "ybot" => &mut self.ybot,
            "yleft" => &mut self.yleft,
            "yright" => &mut self.yright,
            other => return Err(Error::Validation(format!("unknown axis title key: {other}"))),
        };
        *slot = value.to_string();
        Ok(())
    }
}

/// Sample drawing style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Filled bars.
    Full,
    /// Outlined steps.
    #[default]
    Hollow,
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(Self::Full),
            "hollow" => Ok(Self::Hollow),
            other => Err(Error::Validation(format!("shape must be 'full' or 'hollow', got {other:?}"))),
        }
    }
}

// --- Grid ---

/// Axes that get grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum GridAxis {
    X,
    Y,
    Both,
}

/// Grid line style, serialized as its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub enum LineStyle {
    #[serde(rename = "-")]
    Solid,
    #[serde(rename = "--")]
    Dashed,
    #[serde(rename = "-.")]
    DashDot,
    #[serde(rename = ":")]
    Dotted,
}

impl LineStyle {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "-" => Some(Self::Solid),
            "--" => Some(Self::Dashed),
            "-." => Some(Self::DashDot),
            ":" => Some(Self::Dotted),
            _ => None,
        }
    }

    /// Symbol such as `--`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "-",
            Self::Dashed => "--",
            Self::DashDot => "-.",
            Self::Dotted => ":",
        }
    }
}

/// Grid request written as `<axis><linestyle>`, e.g. `y:` or `both--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridSpec {
    /// Axes with grid lines.
    pub axis: GridAxis,
    /// Line style.
    pub line: LineStyle,
}

impl FromStr for GridSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (axis, rest) = if let Some(rest) = s.strip_prefix("both") {
            (GridAxis::Both, rest)
        } else if let Some(rest) = s.strip_prefix('x') {
            (GridAxis::X, rest)
        } else if let Some(rest) = s.strip_prefix('y') {
            (GridAxis::Y, rest)
        } else {
            return Err(invalid_grid(s));
        };
        let line = LineStyle::parse(rest).ok_or_else(|| invalid_grid(s))?;
        Ok(Self { axis, line })
    }
}

fn invalid_grid(s: &str) -> Error {
    Error::Validation(format!(
        "invalid grid string {s:?}; expected axis (x, y, both) + linestyle (-, --, -., :), e.g. 'y:' or 'x--'"
    ))
}

impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            GridAxis::X => "x",
            GridAxis::Y => "y",
            GridAxis::Both => "both",
        };
        write!(f, "{axis}{}", self.line.as_str())
    }
}

impl TryFrom<String> for GridSpec {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<GridSpec> for String {
    fn from(g: GridSpec) -> Self {
        g.to_string()
    }
}

// --- Markers ---

/// Marker symbols understood by the renderer.
pub const KNOWN_MARKERS: &[&str] = &[
    ".", ",", "o", "v", "^", "<", ">", "1", "2", "3", "4", "8", "s", "p", "P", "*", "h", "H", "+",
    "x", "X", "D", "d", "|", "_", "none", "None",
];

/// A validated marker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Marker(String);

impl Marker {
    /// The symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn circle() -> Self {
        Self("o".into())
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self(".".into())
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if KNOWN_MARKERS.contains(&s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::Validation(format!("unknown marker symbol: {s:?}")))
        }
    }
}

impl TryFrom<String> for Marker {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Marker> for String {
    fn from(m: Marker) -> Self {
        m.0
    }
}

// --- Style parameters ---

/// How [`StyleParams::merge`] treats keys outside [`KNOWN_STYLE_KEYS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Fail the whole merge.
    #[default]
    Reject,
    /// Log a warning and skip the key.
    WarnAndIgnore,
}

/// Style keys [`StyleParams`] understands.
pub const KNOWN_STYLE_KEYS: &[&str] = &[
    "xaxis.labellocation",
    "yaxis.labellocation",
    "axes.labelpad",
    "axes.titlesize",
    "font.size",
    "lines.linewidth",
    "lines.marker",
    "lines.markersize",
    "legend.handletextpad",
    "legend.columnspacing",
    "legend.labelspacing",
    "legend.markerscale",
];

/// Renderer style parameters, keyed the way the renderer names them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(missing_docs)]
pub struct StyleParams {
    #[serde(rename = "xaxis.labellocation")]
    pub xaxis_labellocation: String,
    #[serde(rename = "yaxis.labellocation")]
    pub yaxis_labellocation: String,
    #[serde(rename = "axes.labelpad")]
    pub axes_labelpad: f64,
    #[serde(rename = "axes.titlesize")]
    pub axes_titlesize: f64,
    /// Tick-label and legend font size.
    #[serde(rename = "font.size")]
    pub font_size: f64,
    #[serde(rename = "lines.linewidth")]
    pub lines_linewidth: f64,
    #[serde(rename = "lines.marker")]
    pub lines_marker: Marker,
    #[serde(rename = "lines.markersize")]
    pub lines_markersize: f64,
    #[serde(rename = "legend.handletextpad")]
    pub legend_handletextpad: f64,
    #[serde(rename = "legend.columnspacing")]
    pub legend_columnspacing: f64,
    #[serde(rename = "legend.labelspacing")]
    pub legend_labelspacing: f64,
    #[serde(rename = "legend.markerscale")]
    pub legend_markerscale: f64,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            xaxis_labellocation: "right".into(),
            yaxis_labellocation: "top".into(),
            axes_labelpad: 1.0,
            axes_titlesize: 20.0,
            font_size: 10.0,
            lines_linewidth: 1.0,
            lines_marker: Marker::default(),
            lines_markersize: 8.0,
            legend_handletextpad: 0.3,
            legend_columnspacing: 0.5,
            legend_labelspacing: 0.1,
            legend_markerscale: 1.1,
        }
    }
}

fn expect_str<'v>(key: &str, value: &'v serde_json::Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| Error::Validation(format!("{key} expects a string, got {value}")))
}

fn expect_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::Validation(format!("{key} expects a number, got {value}")))
}

const X_LABEL_LOCATIONS: &[&str] = &["left", "center", "right"];
const Y_LABEL_LOCATIONS: &[&str] = &["bottom", "center", "top"];

impl StyleParams {
    /// Check enumerated keys and sizes.
    pub fn validate(&self) -> Result<()> {
        one_of("xaxis.labellocation", &self.xaxis_labellocation, X_LABEL_LOCATIONS)?;
        one_of("yaxis.labellocation", &self.yaxis_labellocation, Y_LABEL_LOCATIONS)?;
        positive("axes.titlesize", self.axes_titlesize)?;
        positive("font.size", self.font_size)?;
        positive("lines.linewidth", self.lines_linewidth)?;
        positive("lines.markersize", self.lines_markersize)?;
        positive("legend.markerscale", self.legend_markerscale)?;
        finite("axes.labelpad", self.axes_labelpad)?;
        finite("legend.handletextpad", self.legend_handletextpad)?;
        finite("legend.columnspacing", self.legend_columnspacing)?;
        finite("legend.labelspacing", self.legend_labelspacing)?;
        Ok(())
    }

    /// Shallow merge of `overrides`; either every key applies or none does.
    pub fn merge(
        &mut self,
        overrides: &BTreeMap<String, serde_json::Value>,
        policy: UnknownKeyPolicy,
    ) -> Result<()> {
        let mut next = self.clone();
        for (key, value) in overrides {
            match key.as_str() {
                "xaxis.labellocation" => {
                    next.xaxis_labellocation =
                        one_of(key, expect_str(key, value)?, X_LABEL_LOCATIONS)?;
                }
                "yaxis.labellocation" => {
                    next.yaxis_labellocation =
                        one_of(key, expect_str(key, value)?, Y_LABEL_LOCATIONS)?;
                }
                "axes.labelpad" => next.axes_labelpad = finite(key, expect_f64(key, value)?)?,
                "axes.titlesize" => next.axes_titlesize = positive(key, expect_f64(key, value)?)?,
                "font.size" => next.font_size = positive(key, expect_f64(key, value)?)?,
                "lines.linewidth" => next.lines_linewidth = positive(key, expect_f64(key, value)?)?,
                "lines.marker" => next.lines_marker = expect_str(key, value)?.parse()?,
                "lines.markersize" => next.lines_markersize = positive(key, expect_f64(key, value)?)?,
                "legend.handletextpad" => {
                    next.legend_handletextpad = finite(key, expect_f64(key, value)?)?
                }
                "legend.columnspacing" => {
                    next.legend_columnspacing = finite(key, expect_f64(key, value)?)?
                }
                "legend.labelspacing" => {
                    next.legend_labelspacing = finite(key, expect_f64(key, value)?)?
                }
                "legend.markerscale" => {
                    next.legend_markerscale = positive(key, expect_f64(key, value)?)?
                }
                unknown => match policy {
                    UnknownKeyPolicy::Reject => {
                        return Err(Error::Validation(format!("unknown style key: {unknown}")));
                    }
                    UnknownKeyPolicy::WarnAndIgnore => {
                        tracing::warn!(key = unknown, "ignoring unknown style key");
                    }
                },
            }
        }
        *self = next;
        Ok(())
    }
}

fn finite(key: &str, v: f64) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Error::Validation(format!("{key} must be finite, got {v}")))
    }
}

fn one_of(key: &str, value: &str, allowed: &[&str]) -> Result<String> {
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(Error::Validation(format!("{key} must be one of {allowed:?}, got {value:?}")))
    }
}

/// Resolve a PlotConfiguration from an optional YAML string.
///
/// The user document is deep-merged over the preset named by its `style` key
/// (ATLAS when absent); unknown keys are errors.
pub fn resolve_config(user_yaml: Option<&str>) -> Result<PlotConfiguration> {
    let Some(yaml) = user_yaml else {
        return Ok(PlotConfiguration::default());
    };
    let user: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)?;
    if user.is_null() {
        return Ok(PlotConfiguration::default());
    }
    let style = match user.get("style") {
        Some(v) => serde_yaml_ng::from_value::<ExperimentStyle>(v.clone())?,
        None => ExperimentStyle::default(),
    };
    let mut merged = serde_yaml_ng::to_value(style.base_config())?;
    merge_yaml(&mut merged, user);
    let config: PlotConfiguration = serde_yaml_ng::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

fn merge_yaml(base: &mut serde_yaml_ng::Value, overlay: serde_yaml_ng::Value) {
    use serde_yaml_ng::Value;
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_yaml(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}
