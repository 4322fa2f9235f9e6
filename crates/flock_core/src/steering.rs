//! Reynolds steering: separation, alignment and cohesion.
//!
//! [`steering_force`] is a pure function of the flock snapshot. Every rule
//! runs the same pipeline: accumulate over qualifying neighbors, average,
//! normalize, scale to the max speed, subtract the current velocity, clamp
//! to the max force, then weight.

use crate::math::{Bounds, Vec3};
use crate::params::{SimulationParameters, SpeedLimits};

/// Squared distance below which a neighbor is treated as coincident and
/// ignored by separation.
pub const COINCIDENT_DISTANCE_SQ: f32 = 1e-4;

/// Read agent `index` out of an interleaved XYZ array.
#[inline]
pub(crate) fn vec3_at(values: &[f32], index: usize) -> Vec3 {
    Vec3::from_slice(&values[index * 3..index * 3 + 3])
}

/// Running sum for one rule.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: Vec3,
    count: u32,
}

impl Accumulator {
    #[inline]
    fn add(&mut self, v: Vec3) {
        self.sum += v;
        self.count += 1;
    }

    /// Steering vector toward the averaged direction, or zero when there
    /// is nothing to steer toward.
    fn steer(&self, velocity: Vec3, limits: &SpeedLimits, weight: f32) -> Vec3 {
        if self.count == 0 {
            return Vec3::ZERO;
        }
        let average = self.sum / self.count as f32;
        match average.try_normalize() {
            Some(direction) => {
                let desired = direction * limits.max_speed;
                (desired - velocity).clamp_length_max(limits.max_force) * weight
            }
            None => Vec3::ZERO,
        }
    }
}

/// Net steering force on `agent` from the given neighbor candidates.
///
/// `candidates` may be any superset of the true neighbors and may include
/// `agent` itself; both radii are re-checked here against wrap-corrected
/// distances.
pub fn steering_force(
    agent: usize,
    candidates: &[usize],
    positions: &[f32],
    velocities: &[f32],
    params: &SimulationParameters,
    bounds: &Bounds,
    limits: &SpeedLimits,
) -> Vec3 {
    let position = vec3_at(positions, agent);
    let velocity = vec3_at(velocities, agent);

    let separation_sq = params.separation_radius * params.separation_radius;
    let neighbor_sq = params.neighbor_radius * params.neighbor_radius;

    let mut separation = Accumulator::default();
    let mut alignment = Accumulator::default();
    let mut cohesion = Accumulator::default();

    for &other in candidates {
        if other == agent {
            continue;
        }

        let delta = bounds.toroidal_delta(position, vec3_at(positions, other));
        let dist_sq = delta.length_squared();

        if dist_sq < separation_sq && dist_sq > COINCIDENT_DISTANCE_SQ {
            // Unit direction away from the neighbor, weighted by 1/distance
            separation.add(-delta / dist_sq);
        }

        if dist_sq < neighbor_sq {
            alignment.add(vec3_at(velocities, other));
            cohesion.add(delta);
        }
    }

    separation.steer(velocity, limits, params.separation)
        + alignment.steer(velocity, limits, params.alignment)
        + cohesion.steer(velocity, limits, params.cohesion)
}
