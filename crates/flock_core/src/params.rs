//! Tuning values for the flock
//!
//! [`SimulationParameters`] is supplied fresh on every update so the caller
//! can tune live; [`FlockConfig`] carries the base constants fixed for the
//! lifetime of a flock.

use crate::error::FlockError;
use serde::{Deserialize, Serialize};

/// Per-call rule weights and interaction radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Multiplier on the base speed and force limits.
    pub speed: f32,
    /// Weight of the separation rule.
    pub separation: f32,
    /// Weight of the alignment rule.
    pub alignment: f32,
    /// Weight of the cohesion rule.
    pub cohesion: f32,
    pub separation_radius: f32,
    /// Radius for alignment and cohesion; also the grid cell size.
    pub neighbor_radius: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            speed: 1.0,
            separation: 1.5,
            alignment: 1.0,
            cohesion: 1.0,
            separation_radius: 5.0,
            neighbor_radius: 15.0,
        }
    }
}

impl SimulationParameters {
    /// Every field must be a finite, positive float.
    pub fn validate(&self) -> Result<(), FlockError> {
        let fields = [
            ("speed", self.speed),
            ("separation", self.separation),
            ("alignment", self.alignment),
            ("cohesion", self.cohesion),
            ("separation_radius", self.separation_radius),
            ("neighbor_radius", self.neighbor_radius),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlockError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Base constants of a flock, scaled per call by [`SimulationParameters::speed`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub base_max_speed: f32,
    pub base_max_force: f32,
    /// Minimum speed as a fraction of the max speed.
    pub min_speed_ratio: f32,
    /// Initial velocity components are drawn from `[-v, v)`.
    pub initial_velocity: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            base_max_speed: 8.0,
            base_max_force: 4.0,
            min_speed_ratio: 0.25,
            initial_velocity: 2.0,
        }
    }
}

impl FlockConfig {
    pub fn validate(&self) -> Result<(), FlockError> {
        let positive = [
            ("base_max_speed", self.base_max_speed),
            ("base_max_force", self.base_max_force),
            ("initial_velocity", self.initial_velocity),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlockError::InvalidParameter { name, value });
            }
        }
        if !(self.min_speed_ratio.is_finite() && (0.0..=1.0).contains(&self.min_speed_ratio)) {
            return Err(FlockError::InvalidParameter {
                name: "min_speed_ratio",
                value: self.min_speed_ratio,
            });
        }
        Ok(())
    }

    /// Resolve the limits in effect for one step.
    pub fn limits(&self, params: &SimulationParameters) -> SpeedLimits {
        let max_speed = self.base_max_speed * params.speed;
        SpeedLimits {
            max_speed,
            min_speed: max_speed * self.min_speed_ratio,
            max_force: self.base_max_force * params.speed,
        }
    }
}

/// Speed and force limits for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    pub max_speed: f32,
    pub min_speed: f32,
    pub max_force: f32,
}
