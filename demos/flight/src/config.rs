//! `flight.toml` loading.
//!
//! Every key is optional; missing ones fall back to the defaults below.
//!
//! ```toml
//! [sim]
//! max_steps           = 200
//! collision_threshold = 5
//! step_pause_ms       = 250
//!
//! [output]
//! report  = "out/simulation_report.txt"
//! csv_dir = "out"
//! grid    = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ds_core::SimConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub sim:    SimConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Text report path.
    pub report:     PathBuf,
    /// Directory for the CSV logs; none by default.
    pub csv_dir:    Option<PathBuf>,
    /// Directory for `report.db` (only with the `sqlite` feature).
    pub sqlite_dir: Option<PathBuf>,
    /// Draw the X/Y grid after every step.
    pub grid:       bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report:     PathBuf::from("simulation_report.txt"),
            csv_dir:    None,
            sqlite_dir: None,
            grid:       true,
        }
    }
}

impl FlightConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.sim.validate()?;
        Ok(config)
    }
}
