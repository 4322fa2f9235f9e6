use thiserror::Error;

/// Contract violations reported at the flock's call boundary.
///
/// Numeric degeneracies inside a step (coincident agents, zero steering
/// vectors) are not errors; they are skipped inline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlockError {
    #[error("population must contain at least one agent")]
    EmptyPopulation,

    #[error("grid cell size must be finite and positive, got {size}")]
    InvalidCellSize { size: f32 },

    #[error("time step must be finite and non-negative, got {dt}")]
    InvalidTimeStep { dt: f32 },

    #[error("bounds must be finite and positive, got {width} x {height} x {depth}")]
    InvalidBounds { width: f32, height: f32, depth: f32 },

    #[error("parameter '{name}' must be finite and positive, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("state arrays disagree: {positions} positions vs {velocities} velocities")]
    StateLengthMismatch { positions: usize, velocities: usize },

    #[error("agent {index} lies outside the bounds box")]
    OutOfBounds { index: usize },

    #[error("agent {index} has a non-finite position or velocity")]
    NonFiniteState { index: usize },
}
