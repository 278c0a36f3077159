//! CLI configuration management.
//!
//! Values are layered: built-in defaults, then the JSON config file, then
//! `.env` / environment variables, then command-line flags (applied by the
//! command itself).

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use spring_graph_layout::SimulationConfig;
use tracing::{debug, warn};

/// Environment variable that points at an explicit config file.
pub const CONFIG_FILE_ENV: &str = "SG_CONFIG_FILE";

fn default_margin() -> f64 {
    0.95
}

/// Application-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Physics and output settings handed to the engine.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Fraction of the requested output size actually used.
    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            margin: default_margin(),
        }
    }
}

impl Config {
    /// Load the effective configuration: file, then environment.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file()?;
        config.apply_env();
        Ok(config)
    }

    /// Load only what is stored in the config file, or defaults.
    pub fn load_file() -> Result<Self> {
        let Some(config_path) = Self::config_file_path() else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

        debug!(path = %config_path.display(), "config_file_loaded");
        Ok(config)
    }

    fn apply_env(&mut self) {
        let sim = &mut self.simulation;
        override_from_env("SG_MAX_SECONDS", &mut sim.max_seconds);
        override_from_env("SG_OUTPUT_WIDTH", &mut sim.output_width);
        override_from_env("SG_OUTPUT_HEIGHT", &mut sim.output_height);
        override_from_env("SG_EMIT_INTERVAL_MS", &mut sim.emit_interval_ms);
        override_from_env("SG_MAX_ITERATIONS", &mut sim.max_iterations);
        override_from_env("SG_MARGIN", &mut self.margin);
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "spring-graph", "sg")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Check values the engine does not validate itself.
    pub fn validate(&self) -> Result<()> {
        if !(self.margin > 0.0 && self.margin <= 1.0) {
            anyhow::bail!("margin must be in (0, 1], got {}", self.margin);
        }
        Ok(())
    }

    /// Simulation settings with the margin applied to the output extent.
    pub fn effective_simulation(&self) -> SimulationConfig {
        let width = self.simulation.output_width * self.margin;
        let height = self.simulation.output_height * self.margin;
        self.simulation.clone().with_output_size(width, height)
    }
}

/// Replace `target` with the parsed value of `var` when it is set.
/// Unparseable values are ignored with a warning.
fn override_from_env<T: FromStr>(var: &str, target: &mut T) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(var, value = %raw, "ignoring_unparseable_env_override"),
    }
}
