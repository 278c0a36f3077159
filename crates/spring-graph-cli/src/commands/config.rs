//! Config command implementation.
//!
//! Manages CLI configuration.

use anyhow::{Context, Result};

use crate::config::Config;

/// Keys accepted by `get` and `set`.
const KEYS: &[&str] = &[
    "max-seconds",
    "max-iterations",
    "min-iterations",
    "output-width",
    "output-height",
    "emit-interval-ms",
    "damping",
    "repulse-constant",
    "spring-constant",
    "spring-amplifier",
    "spring-stable-distance",
    "spring-multiplier-cap",
    "min-energy-threshold",
    "require-decreasing-energy",
    "min-output-separation",
    "margin",
];

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("Spring-Graph CLI Configuration");
    println!("{:-<40}", "");

    for key in KEYS {
        println!("{:<26}{}", format!("{}:", key), value_of(config, key)?);
    }

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value and persist it.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let sim = &mut config.simulation;
    let invalid = || format!("Invalid value for {}: {}", key, value);

    match key {
        "max-seconds" => sim.max_seconds = value.parse().with_context(invalid)?,
        "max-iterations" => sim.max_iterations = value.parse().with_context(invalid)?,
        "min-iterations" => sim.min_iterations = value.parse().with_context(invalid)?,
        "output-width" | "width" => sim.output_width = value.parse().with_context(invalid)?,
        "output-height" | "height" => sim.output_height = value.parse().with_context(invalid)?,
        "emit-interval-ms" => sim.emit_interval_ms = value.parse().with_context(invalid)?,
        "damping" => sim.damping = value.parse().with_context(invalid)?,
        "repulse-constant" => sim.repulse_constant = value.parse().with_context(invalid)?,
        "spring-constant" => sim.spring_constant = value.parse().with_context(invalid)?,
        "spring-amplifier" => sim.spring_amplifier = value.parse().with_context(invalid)?,
        "spring-stable-distance" => {
            sim.spring_stable_distance = value.parse().with_context(invalid)?
        }
        "spring-multiplier-cap" => {
            sim.spring_multiplier_cap = value.parse().with_context(invalid)?
        }
        "min-energy-threshold" => {
            sim.min_energy_threshold = value.parse().with_context(invalid)?
        }
        "require-decreasing-energy" => {
            sim.require_decreasing_energy = value.parse().with_context(invalid)?
        }
        "min-output-separation" => {
            sim.min_output_separation = match value {
                "none" | "off" => None,
                _ => Some(value.parse().with_context(invalid)?),
            }
        }
        "margin" => config.margin = value.parse().with_context(invalid)?,
        _ => {
            anyhow::bail!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                KEYS.join(", ")
            );
        }
    }

    config.validate()?;
    config
        .simulation
        .validate()
        .with_context(|| format!("Rejected {} = {}", key, value))?;

    config.save()?;
    println!("Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    println!("{}", value_of(config, key)?);
    Ok(())
}

fn value_of(config: &Config, key: &str) -> Result<String> {
    let sim = &config.simulation;
    let value = match key {
        "max-seconds" => sim.max_seconds.to_string(),
        "max-iterations" => sim.max_iterations.to_string(),
        "min-iterations" => sim.min_iterations.to_string(),
        "output-width" | "width" => sim.output_width.to_string(),
        "output-height" | "height" => sim.output_height.to_string(),
        "emit-interval-ms" => sim.emit_interval_ms.to_string(),
        "damping" => sim.damping.to_string(),
        "repulse-constant" => sim.repulse_constant.to_string(),
        "spring-constant" => sim.spring_constant.to_string(),
        "spring-amplifier" => sim.spring_amplifier.to_string(),
        "spring-stable-distance" => sim.spring_stable_distance.to_string(),
        "spring-multiplier-cap" => sim.spring_multiplier_cap.to_string(),
        "min-energy-threshold" => sim.min_energy_threshold.to_string(),
        "require-decreasing-energy" => sim.require_decreasing_energy.to_string(),
        "min-output-separation" => sim
            .min_output_separation
            .map(|v| v.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
        "margin" => config.margin.to_string(),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };
    Ok(value)
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
