//! Simulation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LayoutError, LayoutResult};

/// Tunables for one layout run.
///
/// Every field has a default, so a partial JSON document deserializes into a
/// complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Wall-clock budget for the integration loop, in seconds.
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,

    /// Width of the normalized output space.
    #[serde(default = "default_output_extent")]
    pub output_width: f64,

    /// Height of the normalized output space.
    #[serde(default = "default_output_extent")]
    pub output_height: f64,

    /// Minimum time between progress snapshots, in milliseconds.
    /// Zero emits a snapshot every iteration.
    #[serde(default = "default_emit_interval_ms")]
    pub emit_interval_ms: u64,

    /// Strength of the pairwise repulsion.
    #[serde(default = "default_repulse_constant")]
    pub repulse_constant: f64,

    /// Divisor applied to a spring's stretch before capping.
    #[serde(default = "default_spring_constant")]
    pub spring_constant: f64,

    /// Multiplier applied to the capped spring stretch.
    #[serde(default = "default_spring_amplifier")]
    pub spring_amplifier: f64,

    /// Rest length of a spring.
    #[serde(default = "default_spring_stable_distance")]
    pub spring_stable_distance: f64,

    /// Upper bound on the spring multiplier before amplification.
    #[serde(default = "default_spring_multiplier_cap")]
    pub spring_multiplier_cap: f64,

    /// Per-tick velocity decay (0.3 - 0.4 recommended).
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Energy below which the system counts as settled.
    #[serde(default = "default_min_energy_threshold")]
    pub min_energy_threshold: f64,

    /// Hard ceiling on iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,

    /// Iterations that must run before the energy threshold is honored.
    #[serde(default)]
    pub min_iterations: u64,

    /// Only honor the energy threshold on ticks where energy went down.
    #[serde(default)]
    pub require_decreasing_energy: bool,

    /// Suppress progress snapshots whose closest pair of nodes is at or
    /// below this normalized distance. Terminal snapshots are never
    /// suppressed.
    #[serde(default)]
    pub min_output_separation: Option<f64>,
}

fn default_max_seconds() -> f64 {
    30.0
}

fn default_output_extent() -> f64 {
    100.0
}

fn default_emit_interval_ms() -> u64 {
    50
}

fn default_repulse_constant() -> f64 {
    0.03
}

fn default_spring_constant() -> f64 {
    2000.0
}

fn default_spring_amplifier() -> f64 {
    10.0
}

fn default_spring_stable_distance() -> f64 {
    200.0
}

fn default_spring_multiplier_cap() -> f64 {
    3.0
}

fn default_damping() -> f64 {
    0.3
}

fn default_min_energy_threshold() -> f64 {
    1e-9
}

fn default_max_iterations() -> u64 {
    500_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_seconds: default_max_seconds(),
            output_width: default_output_extent(),
            output_height: default_output_extent(),
            emit_interval_ms: default_emit_interval_ms(),
            repulse_constant: default_repulse_constant(),
            spring_constant: default_spring_constant(),
            spring_amplifier: default_spring_amplifier(),
            spring_stable_distance: default_spring_stable_distance(),
            spring_multiplier_cap: default_spring_multiplier_cap(),
            damping: default_damping(),
            min_energy_threshold: default_min_energy_threshold(),
            max_iterations: default_max_iterations(),
            min_iterations: 0,
            require_decreasing_energy: false,
            min_output_separation: None,
        }
    }
}

impl SimulationConfig {
    /// Configuration with both historical stop/emission guards enabled:
    /// energy must be falling before it can stop the run, at least 50
    /// iterations run, and progress snapshots with nodes closer than a
    /// tenth of the spring rest length are withheld.
    pub fn legacy() -> Self {
        let defaults = Self::default();
        Self {
            min_iterations: 50,
            require_decreasing_energy: true,
            min_output_separation: Some(defaults.spring_stable_distance / 10.0),
            ..defaults
        }
    }

    /// A short budget for previews and tests.
    pub fn fast() -> Self {
        Self {
            max_seconds: 2.0,
            max_iterations: 5_000,
            ..Default::default()
        }
    }

    /// Set the output extent.
    pub fn with_output_size(mut self, width: f64, height: f64) -> Self {
        self.output_width = width;
        self.output_height = height;
        self
    }

    /// Wall-clock budget as a duration. Budgets too large to represent
    /// saturate to `Duration::MAX`.
    pub fn max_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_seconds).unwrap_or(Duration::MAX)
    }

    /// Progress throttle as a duration.
    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }

    /// Check that every value is usable by the integrator.
    pub fn validate(&self) -> LayoutResult<()> {
        ensure_positive("max_seconds", self.max_seconds)?;
        ensure_positive("output_width", self.output_width)?;
        ensure_positive("output_height", self.output_height)?;
        ensure_positive("spring_constant", self.spring_constant)?;
        ensure_positive("spring_stable_distance", self.spring_stable_distance)?;
        ensure_non_negative("repulse_constant", self.repulse_constant)?;
        ensure_non_negative("spring_amplifier", self.spring_amplifier)?;
        ensure_non_negative("spring_multiplier_cap", self.spring_multiplier_cap)?;
        ensure_non_negative("min_energy_threshold", self.min_energy_threshold)?;

        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(LayoutError::invalid_config(
                "damping",
                format!("{} is outside (0, 1)", self.damping),
            ));
        }
        if !(0.3..=0.4).contains(&self.damping) {
            warn!(damping = self.damping, "damping_outside_recommended_band");
        }

        if self.max_iterations == 0 {
            return Err(LayoutError::invalid_config("max_iterations", "must be >= 1"));
        }

        if let Some(separation) = self.min_output_separation {
            ensure_non_negative("min_output_separation", separation)?;
        }

        Ok(())
    }
}

fn ensure_positive(field: &'static str, value: f64) -> LayoutResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid_config(
            field,
            format!("{} must be finite and > 0", value),
        ))
    }
}

fn ensure_non_negative(field: &'static str, value: f64) -> LayoutResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid_config(
            field,
            format!("{} must be finite and >= 0", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations, 500_000);
        assert_eq!(config.output_width, 100.0);
        assert_eq!(config.max_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_legacy_enables_guards() {
        let config = SimulationConfig::legacy();
        assert!(config.require_decreasing_energy);
        assert_eq!(config.min_iterations, 50);
        assert_eq!(config.min_output_separation, Some(20.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"output_width": 640, "damping": 0.35}"#).unwrap();
        assert_eq!(config.output_width, 640.0);
        assert_eq!(config.output_height, 100.0);
        assert_eq!(config.damping, 0.35);
        assert_eq!(config.spring_stable_distance, 200.0);
    }

    #[test]
    fn test_rejects_bad_damping() {
        let config = SimulationConfig {
            damping: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig {
                field: "damping",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_output_extent() {
        let config = SimulationConfig::default().with_output_size(0.0, 100.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_time_budget_saturates() {
        let config = SimulationConfig {
            max_seconds: 1e20,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.max_duration(), Duration::MAX);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = SimulationConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
