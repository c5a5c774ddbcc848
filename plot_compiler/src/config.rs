//! Run configuration for a plot compilation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::GridLayout;
use crate::surveying::FALLBACK_DIAMETER;

/// Options controlling a single compilation run.
///
/// Configurations are stored as JSON. Only `plot_azimuth` is mandatory; every
/// other field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Rotation of the plot's local X axis from north, in degrees.
    pub plot_azimuth: f64,
    /// Output coordinates in the north-oriented frame.
    #[serde(default)]
    pub north_oriented: bool,
    /// Position trees relative to previously positioned trees, starting from
    /// the grid origin, instead of from the staked grid posts.
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub letters_abscissa: bool,
    #[serde(default)]
    pub number_first_labels: bool,
    #[serde(default = "default_separator")]
    pub csv_separator: char,
    /// Where to render the plot scene, if anywhere.
    #[serde(default)]
    pub output_render_path: Option<PathBuf>,
    /// Factor converting recorded diameters into distance units.
    #[serde(default = "default_diameter_scale")]
    pub diameter_scale: f64,
    /// Diameter assumed when no circumference was recorded.
    #[serde(default = "default_fallback_diameter")]
    pub fallback_diameter: f64,
    /// Longest reference chain the resolver will follow.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    /// Emit records with malformed measurements unchanged instead of failing.
    #[serde(default)]
    pub lenient: bool,
}

fn default_separator() -> char {
    ','
}

fn default_diameter_scale() -> f64 {
    1.0
}

fn default_fallback_diameter() -> f64 {
    FALLBACK_DIAMETER
}

fn default_max_chain_depth() -> usize {
    64
}

impl RunConfig {
    /// Creates a configuration with default options for the given plot.
    pub fn new(plot_azimuth: f64) -> Self {
        Self {
            plot_azimuth,
            north_oriented: false,
            relative: false,
            letters_abscissa: false,
            number_first_labels: false,
            csv_separator: default_separator(),
            output_render_path: None,
            diameter_scale: default_diameter_scale(),
            fallback_diameter: default_fallback_diameter(),
            max_chain_depth: default_max_chain_depth(),
            lenient: false,
        }
    }

    pub fn grid_layout(&self) -> GridLayout {
        GridLayout {
            letters_abscissa: self.letters_abscissa,
            number_first_labels: self.number_first_labels,
        }
    }

    /// Offset applied when converting azimuths: the plot azimuth in the
    /// plot-local frame, zero in the north-oriented frame.
    pub fn angle_offset(&self) -> f64 {
        if self.north_oriented {
            0.0
        } else {
            self.plot_azimuth
        }
    }

    /// Saves this configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
