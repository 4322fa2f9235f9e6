//! Flock Core
//!
//! CPU boids simulation in a toroidal 3D box:
//! - Spatial hash grid for neighbor candidates
//! - Separation / alignment / cohesion steering
//! - Flock engine with symplectic Euler, speed clamping and wrap-around
//! - Step clock and tuning parameters

pub mod error;
pub mod flock;
pub mod math;
pub mod params;
pub mod spatial_hash;
pub mod steering;
pub mod time;

pub use error::FlockError;
pub use flock::{Flock, StepStats};
pub use math::Bounds;
pub use params::{FlockConfig, SimulationParameters, SpeedLimits};
pub use spatial_hash::SpatialHashGrid;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
