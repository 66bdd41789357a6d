//! Engine settings loaded from a `tide-engine.toml` file.
//!
//! Only the numerical search resolutions are tunable. The strength-scale
//! breakpoints, classification day ranges, and ephemeris validity window are
//! fixed constants in their modules: downstream consumers key off those
//! exact values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Extremum search resolutions.
    pub search: SearchSettings,
}

/// Step sizes for the two-pass extremum search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Coarse sampling step in minutes for the slope scan.
    pub coarse_step_minutes: u32,
    /// Fine sampling step in minutes for candidate refinement.
    pub refine_step_minutes: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            coarse_step_minutes: 30,
            refine_step_minutes: 5,
        }
    }
}

impl Settings {
    /// Load settings from `tide-engine.toml` in the working directory,
    /// falling back to defaults if the file is missing or invalid.
    pub fn load() -> Self {
        Self::load_from_path("tide-engine.toml")
    }

    /// Load settings from a specific path, falling back to defaults if the
    /// file is missing, malformed, or carries zero step sizes.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Settings>(&contents) {
                Ok(settings) if settings.is_valid() => settings,
                Ok(_) => {
                    log::warn!(
                        "settings at {} carry zero step sizes; using defaults",
                        path.as_ref().display()
                    );
                    Self::default()
                }
                Err(e) => {
                    log::warn!(
                        "invalid settings file {}: {e}; using defaults",
                        path.as_ref().display()
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    fn is_valid(&self) -> bool {
        self.search.coarse_step_minutes > 0 && self.search.refine_step_minutes > 0
    }

    /// Write the settings to a TOML file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let contents = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, contents)
    }
}
