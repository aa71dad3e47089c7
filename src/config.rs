use std::f32::consts::PI;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("field dimensions must be non-zero (got {width}x{height})")]
    ZeroDimensions { width: usize, height: usize },
    #[error("agent count must be non-zero")]
    NoAgents,
    #[error("substeps per frame must be non-zero")]
    NoSubsteps,
    #[error("trail radius must be non-negative (got {0})")]
    NegativeTrailRadius(i32),
    #[error("fade fraction must be within [0, 1] (got {0})")]
    FadeFractionOutOfRange(f32),
    #[error("jitter bound must be non-negative (got {0})")]
    NegativeJitterBound(f32),
    #[error("trail color channel must be within [0, 1] (got {0:?})")]
    TrailColorOutOfRange([f32; 3]),
}

#[derive(Resource, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub agent_count: usize,

    // Update steps per frame => smoother lines but higher CPU usage
    pub substeps_per_frame: usize,

    // Agent motion parameters
    pub sensor_distance: f32,
    pub sensor_angle: f32,
    pub turn_angle: f32,
    pub jitter_bound: f32,

    // Trail parameters
    pub fade_fraction: f32,
    pub trail_radius: i32,
    pub trail_color: [f32; 3],

    // Fixed seed for reproducible runs; None => seeded from entropy
    pub seed: Option<u64>,

    // Frame capture cadence (every Nth rendered frame)
    pub capture_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            agent_count: 750,
            substeps_per_frame: 4,

            sensor_distance: 10.0,
            sensor_angle: PI / 12.0,
            turn_angle: PI / 9.0,
            jitter_bound: PI / 30.0,

            fade_fraction: 0.04,
            trail_radius: 3,
            trail_color: [0.40, 0.65, 0.40], // single pastel green

            seed: None,
            capture_interval: 2,
        }
    }
}

impl SimConfig {
    /// Misconfigured parameters invalidate every later operation, so
    /// reject them before the simulation is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.agent_count == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.substeps_per_frame == 0 {
            return Err(ConfigError::NoSubsteps);
        }
        if self.trail_radius < 0 {
            return Err(ConfigError::NegativeTrailRadius(self.trail_radius));
        }
        if !(0.0..=1.0).contains(&self.fade_fraction) {
            return Err(ConfigError::FadeFractionOutOfRange(self.fade_fraction));
        }
        if self.jitter_bound < 0.0 {
            return Err(ConfigError::NegativeJitterBound(self.jitter_bound));
        }
        if self.trail_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::TrailColorOutOfRange(self.trail_color));
        }
        Ok(())
    }

    /// Load `sim_config.json` if present, otherwise fall back to defaults.
    pub fn from_json_file() -> Self {
        let json_content = match std::fs::read_to_string("sim_config.json") {
            Ok(content) => content,
            Err(_) => return SimConfig::default(),
        };

        match serde_json::from_str(&json_content) {
            Ok(config) => config,
            Err(e) => {
                println!("⚠️ Ignoring malformed sim_config.json: {e}");
                SimConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_dimensions() {
        let config = SimConfig {
            width: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDimensions { .. })
        ));
    }

    #[test]
    fn rejects_empty_population() {
        let config = SimConfig {
            agent_count: 0,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoAgents)));
    }

    #[test]
    fn rejects_negative_trail_radius() {
        let config = SimConfig {
            trail_radius: -1,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeTrailRadius(-1))
        ));
    }

    #[test]
    fn rejects_fade_fraction_above_one() {
        let config = SimConfig {
            fade_fraction: 1.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FadeFractionOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_trail_color() {
        let config = SimConfig {
            trail_color: [0.4, 1.2, 0.4],
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TrailColorOutOfRange(_))
        ));
    }
}
