//! Toroidal vector math
//!
//! Re-exports glam together with the wrap-around helpers every distance and
//! offset computation in the flock goes through.

pub use glam::*;

use crate::error::FlockError;
use serde::{Deserialize, Serialize};

/// Box extents of the simulated torus, centred on the origin.
///
/// Each coordinate lives in `[-axis / 2, axis / 2)`; opposite faces are
/// identified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32, depth: f32) -> Result<Self, FlockError> {
        let bounds = Self { width, height, depth };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Cube with the same extent on every axis.
    pub fn cube(size: f32) -> Result<Self, FlockError> {
        Self::new(size, size, size)
    }

    pub fn validate(&self) -> Result<(), FlockError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) && ok(self.depth) {
            Ok(())
        } else {
            Err(FlockError::InvalidBounds {
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
        }
    }

    #[inline]
    pub fn extents(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.extents() * 0.5
    }

    /// True when every coordinate of `p` lies in the half-open box.
    pub fn contains(&self, p: Vec3) -> bool {
        let half = self.half_extents();
        p.cmpge(-half).all() && p.cmplt(half).all()
    }

    /// Shortest offset from `from` to `to` across the wrap seams.
    #[inline]
    pub fn toroidal_delta(&self, from: Vec3, to: Vec3) -> Vec3 {
        let extents = self.extents();
        let d = to - from;
        Vec3::new(
            shortest_axis_delta(d.x, extents.x),
            shortest_axis_delta(d.y, extents.y),
            shortest_axis_delta(d.z, extents.z),
        )
    }

    /// Fold a position back into the box after one integration step.
    #[inline]
    pub fn wrap(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            wrap_coordinate(p.x, self.width),
            wrap_coordinate(p.y, self.height),
            wrap_coordinate(p.z, self.depth),
        )
    }
}

#[inline]
fn shortest_axis_delta(delta: f32, extent: f32) -> f32 {
    let half = extent * 0.5;
    if delta > half {
        delta - extent
    } else if delta < -half {
        delta + extent
    } else {
        delta
    }
}

/// A single correction per axis; per-step displacement is far smaller than
/// the extent.
#[inline]
fn wrap_coordinate(c: f32, extent: f32) -> f32 {
    let half = extent * 0.5;
    let wrapped = if c >= half {
        c - extent
    } else if c < -half {
        c + extent
    } else {
        c
    };
    // Rounding in the addition can land exactly on the open face.
    if wrapped >= half {
        -half
    } else {
        wrapped
    }
}

/// Rescale `v` so its length lies in `[min, max]`.
///
/// A zero vector has no direction and is returned unchanged.
#[inline]
pub fn clamp_speed(v: Vec3, min: f32, max: f32) -> Vec3 {
    let speed = v.length();
    if speed > max {
        v * (max / speed)
    } else if speed > 0.0 && speed < min {
        v * (min / speed)
    } else {
        v
    }
}
