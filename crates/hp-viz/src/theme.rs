//! Experiment style presets. Each preset is a complete
//! [`PlotConfiguration`] that YAML documents and setters start from.

use std::num::NonZeroU32;
use std::str::FromStr;

use hp_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::*;

/// Experiment style presets understood by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[allow(missing_docs)]
pub enum ExperimentStyle {
    #[default]
    Atlas,
    Cms,
    Alice,
    Lhcb1,
    Lhcb2,
}

impl FromStr for ExperimentStyle {
    type Err = Error;

    /// Case-insensitive, so `LHCb1` and `lhcb1` name the same preset.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "atlas" => Ok(Self::Atlas),
            "cms" => Ok(Self::Cms),
            "alice" => Ok(Self::Alice),
            "lhcb1" => Ok(Self::Lhcb1),
            "lhcb2" => Ok(Self::Lhcb2),
            other => Err(Error::Validation(format!(
                "unknown style {other:?}; expected ATLAS, CMS, ALICE, LHCb1 or LHCb2"
            ))),
        }
    }
}

impl TryFrom<String> for ExperimentStyle {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl ExperimentStyle {
    /// Full configuration for this preset.
    pub fn base_config(self) -> PlotConfiguration {
        match self {
            Self::Atlas => atlas(),
            Self::Cms => cms(),
            Self::Alice => alice(),
            Self::Lhcb1 | Self::Lhcb2 => lhcb(self),
        }
    }
}

fn atlas() -> PlotConfiguration {
    PlotConfiguration {
        style: ExperimentStyle::Atlas,
        figure: FigureOptions::default(),
        fonts: FontConfig::default(),
        titles: AxisTitles::default(),
        shape: Shape::Hollow,
        grid: None,
        legend_columns: NonZeroU32::MIN,
        params: StyleParams::default(),
    }
}

fn cms() -> PlotConfiguration {
    PlotConfiguration {
        style: ExperimentStyle::Cms,
        figure: FigureOptions { logo_text: "Preliminary".into(), ..FigureOptions::default() },
        ..atlas()
    }
}

fn alice() -> PlotConfiguration {
    PlotConfiguration {
        style: ExperimentStyle::Alice,
        figure: FigureOptions { logo_text: "Preliminary".into(), ..FigureOptions::default() },
        ..atlas()
    }
}

fn lhcb(style: ExperimentStyle) -> PlotConfiguration {
    PlotConfiguration {
        style,
        figure: FigureOptions { logo_text: "Preliminary".into(), ..FigureOptions::default() },
        params: StyleParams { lines_linewidth: 1.5, ..StyleParams::default() },
        ..atlas()
    }
}
