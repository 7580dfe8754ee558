//! Colours, continuous colour scales and per-sample colour assignment.

use std::fmt;

use hp_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// An opaque RGB colour, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Colour from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb`, or a known colour name.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(c) = named(&s.to_ascii_lowercase()) {
            return Ok(c);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::Validation(format!("invalid colour: {s:?}")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| Error::Validation(format!("invalid colour: {s:?}")))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors (for colormaps).
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: (a.r as f64 * (1.0 - t) + b.r as f64 * t).round() as u8,
            g: (a.g as f64 * (1.0 - t) + b.g as f64 * t).round() as u8,
            b: (a.b as f64 * (1.0 - t) + b.b as f64 * t).round() as u8,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

fn named(name: &str) -> Option<Color> {
    let c = match name {
        "black" | "k" => Color::rgb(0, 0, 0),
        "white" | "w" => Color::rgb(255, 255, 255),
        "red" | "r" => Color::rgb(255, 0, 0),
        "blue" | "b" => Color::rgb(0, 0, 255),
        "green" | "g" => Color::rgb(0, 128, 0),
        "limegreen" => Color::rgb(50, 205, 50),
        "orangered" => Color::rgb(255, 69, 0),
        "orange" => Color::rgb(255, 165, 0),
        "magenta" | "fuchsia" | "m" => Color::rgb(255, 0, 255),
        "yellow" | "y" => Color::rgb(255, 255, 0),
        "aqua" | "cyan" | "c" => Color::rgb(0, 255, 255),
        "chocolate" => Color::rgb(210, 105, 30),
        "darkviolet" => Color::rgb(148, 0, 211),
        "purple" => Color::rgb(128, 0, 128),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    };
    Some(c)
}

// --- Fixed palette ---

/// Ordered palette used when at most ten samples are overlaid without stacking.
pub const SAMPLE_PALETTE: [&str; 10] = [
    "black",
    "red",
    "blue",
    "limegreen",
    "orangered",
    "magenta",
    "yellow",
    "aqua",
    "chocolate",
    "darkviolet",
];

/// [`SAMPLE_PALETTE`] resolved to colours.
pub fn sample_palette() -> Vec<Color> {
    SAMPLE_PALETTE.iter().filter_map(|n| named(n)).collect()
}

// --- Continuous colour scales ---

/// Built-in colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColormapKind {
    /// `gist_rainbow`, the ramp for many samples.
    GistRainbow,
    /// `viridis`.
    Viridis,
    /// `bwr`, blue-white-red.
    Bwr,
    /// `RdBu`, the diverging correlation scale.
    RdBu,
}

/// A continuous colour scale on [0, 1], optionally reversed (`<name>_r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colormap {
    /// Base scale.
    pub kind: ColormapKind,
    /// Sample from 1 down to 0.
    pub reversed: bool,
}

impl Colormap {
    /// Unreversed `kind`.
    pub const fn new(kind: ColormapKind) -> Self {
        Self { kind, reversed: false }
    }

    /// Set the direction.
    pub const fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    /// Parse a colormap name, accepting the `_r` suffix.
    pub fn parse(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(b) => (b, true),
            None => (name, false),
        };
        let kind = match base.to_ascii_lowercase().as_str() {
            "gist_rainbow" => ColormapKind::GistRainbow,
            "viridis" => ColormapKind::Viridis,
            "bwr" => ColormapKind::Bwr,
            "rdbu" => ColormapKind::RdBu,
            _ => return Err(Error::Validation(format!("unknown colormap: {name}"))),
        };
        Ok(Self { kind, reversed })
    }

    /// Name as accepted by [`Colormap::parse`].
    pub fn name(&self) -> String {
        let base = match self.kind {
            ColormapKind::GistRainbow => "gist_rainbow",
            ColormapKind::Viridis => "viridis",
            ColormapKind::Bwr => "bwr",
            ColormapKind::RdBu => "RdBu",
        };
        if self.reversed { format!("{base}_r") } else { base.to_string() }
    }

    fn stops(&self) -> &'static [(f64, (u8, u8, u8))] {
        match self.kind {
            ColormapKind::GistRainbow => &[
                (0.000, (255, 0, 41)),
                (0.030, (255, 0, 0)),
                (0.215, (255, 255, 0)),
                (0.400, (0, 255, 0)),
                (0.586, (0, 255, 255)),
                (0.770, (0, 0, 255)),
                (0.954, (255, 0, 255)),
                (1.000, (255, 0, 191)),
            ],
            ColormapKind::Viridis => &[
                (0.00, (68, 1, 84)),
                (0.25, (59, 82, 139)),
                (0.50, (33, 145, 140)),
                (0.75, (94, 201, 98)),
                (1.00, (253, 231, 37)),
            ],
            ColormapKind::Bwr => &[(0.0, (0, 0, 255)), (0.5, (255, 255, 255)), (1.0, (255, 0, 0))],
            ColormapKind::RdBu => {
                &[(0.0, (178, 24, 43)), (0.5, (255, 255, 255)), (1.0, (33, 102, 172))]
            }
        }
    }

    /// Colour at position `t` in [0, 1] (clamped).
    pub fn sample(&self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };
        let stops = self.stops();
        for w in stops.windows(2) {
            let (t0, c0) = w[0];
            let (t1, c1) = w[1];
            if t <= t1 {
                let frac = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
                return Color::lerp(
                    Color::rgb(c0.0, c0.1, c0.2),
                    Color::rgb(c1.0, c1.1, c1.2),
                    frac,
                );
            }
        }
        let (_, c) = stops[stops.len() - 1];
        Color::rgb(c.0, c.1, c.2)
    }

    /// Colour for `value` mapped linearly from `[lo, hi]`.
    pub fn sample_range(&self, value: f64, lo: f64, hi: f64) -> Color {
        if !(hi > lo) || !value.is_finite() {
            return self.sample(0.5);
        }
        self.sample((value - lo) / (hi - lo))
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::new(ColormapKind::GistRainbow)
    }
}

impl Serialize for Colormap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Colormap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Colormap::parse(&s).map_err(serde::de::Error::custom)
    }
}

const RAMP_PCT_MIN: f64 = 2.0;
const RAMP_PCT_MAX: f64 = 98.0;

/// `n` colours sampled at evenly spaced percentiles between 2% and 98%.
pub fn ramp(n: usize, colormap: Colormap) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    let step = (RAMP_PCT_MAX - RAMP_PCT_MIN) / n as f64;
    (0..n).map(|i| colormap.sample((RAMP_PCT_MIN + i as f64 * step) / 100.0)).collect()
}

// --- Assignment ---

/// Ordered mapping of sample name to colour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorAssignment {
    entries: Vec<(String, Color)>,
}

impl ColorAssignment {
    /// Colour of `name`, if assigned.
    pub fn get(&self, name: &str) -> Option<Color> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    /// Colours for `names`, failing on the first unassigned name.
    pub fn colors_for<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Vec<Color>> {
        names
            .into_iter()
            .map(|n| {
                self.get(n).ok_or_else(|| Error::Lookup(format!("no colour assigned to {n}")))
            })
            .collect()
    }

    /// Pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Number of assigned samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No samples assigned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deterministic sample-name to colour mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorAssigner {
    /// Samples are stacked; disables the fixed palette.
    pub stacking: bool,
    /// Scale for ramps.
    pub colormap: Colormap,
}

impl ColorAssigner {
    /// Ramps over `gist_rainbow` unless another colormap is set.
    pub fn new(stacking: bool) -> Self {
        Self { stacking, colormap: Colormap::default() }
    }

    /// Use `colormap` for ramps.
    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Assign colours positionally.
    ///
    /// A `custom` list must cover every name exactly. Without one, up to ten
    /// non-stacked samples use [`SAMPLE_PALETTE`]; anything else gets a ramp
    /// over the configured colormap.
    pub fn assign<S: AsRef<str>>(&self, names: &[S], custom: Option<&[Color]>) -> Result<ColorAssignment> {
        let colors = match custom {
            Some(list) => {
                if list.len() != names.len() {
                    return Err(Error::Validation(format!(
                        "colour list length mismatch: colours={} samples={}",
                        list.len(),
                        names.len()
                    )));
                }
                list.to_vec()
            }
            None if names.len() <= SAMPLE_PALETTE.len() && !self.stacking => {
                sample_palette().into_iter().take(names.len()).collect()
            }
            None => ramp(names.len(), self.colormap),
        };
        let entries = names.iter().map(|n| n.as_ref().to_string()).zip(colors).collect();
        Ok(ColorAssignment { entries })
    }
}
