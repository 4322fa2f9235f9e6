//! Flock simulation engine
//!
//! Owns the agents' interleaved XYZ position and velocity arrays, the
//! spatial hash grid and every scratch buffer, and advances them one step
//! per [`Flock::update`]:
//!
//! 1. rebuild the grid at cell size `neighbor_radius`
//! 2. gather candidates and compute every agent's steering force from the
//!    pre-step snapshot
//! 3. integrate velocity, clamp speed, integrate position, wrap
//!
//! Forces are computed into a reused buffer before any agent moves, so the
//! result does not depend on agent order.

use crate::error::FlockError;
use crate::math::{clamp_speed, Bounds, Vec3};
use crate::params::{FlockConfig, SimulationParameters, SpeedLimits};
use crate::spatial_hash::SpatialHashGrid;
use crate::steering::{steering_force, vec3_at};
use crate::time::StepClock;
use flock_metrics::{time_phase, Counter, PhaseProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Counts from the most recent [`Flock::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub agents: usize,
    /// Grid candidates examined across all agents, before distance filtering.
    pub candidates: usize,
    pub occupied_cells: usize,
}

/// Reusable candidate buffer with stamp-based deduplication.
///
/// Agents near a face are also queried at their wrapped images; stamps
/// drop indices already returned by an earlier image.
#[derive(Debug, Default)]
struct CandidateScratch {
    indices: Vec<usize>,
    marks: Vec<u32>,
    stamp: u32,
}

impl CandidateScratch {
    fn reset(&mut self, count: usize) {
        self.indices.clear();
        self.marks.clear();
        self.marks.resize(count, 0);
        self.stamp = 0;
    }

    fn gather(&mut self, grid: &SpatialHashGrid, bounds: &Bounds, p: Vec3) {
        self.indices.clear();

        let reach = grid.cell_size();
        let (xs, nx) = image_offsets(p.x, bounds.width, reach);
        let (ys, ny) = image_offsets(p.y, bounds.height, reach);
        let (zs, nz) = image_offsets(p.z, bounds.depth, reach);

        for &ox in &xs[..nx] {
            for &oy in &ys[..ny] {
                for &oz in &zs[..nz] {
                    grid.query_append(p.x + ox, p.y + oy, p.z + oz, &mut self.indices);
                }
            }
        }

        if nx * ny * nz > 1 {
            self.dedup();
        }
    }

    fn dedup(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.marks.fill(0);
            self.stamp = 1;
        }
        let stamp = self.stamp;
        let marks = &mut self.marks;
        self.indices.retain(|&j| {
            let fresh = marks[j] != stamp;
            marks[j] = stamp;
            fresh
        });
    }
}

/// Shifts along one axis at which a point must be queried so that
/// neighbors across the seam fall inside the 3×3×3 block.
fn image_offsets(c: f32, extent: f32, reach: f32) -> ([f32; 3], usize) {
    let half = extent * 0.5;
    let mut offsets = [0.0; 3];
    let mut n = 1;
    if c > half - reach {
        offsets[n] = -extent;
        n += 1;
    }
    if c < -half + reach {
        offsets[n] = extent;
        n += 1;
    }
    (offsets, n)
}

/// A population of boids in a toroidal box.
///
/// `R` is the random source used to scatter agents on construction and on
/// every [`rebuild`](Self::rebuild).
pub struct Flock<R = StdRng> {
    bounds: Bounds,
    config: FlockConfig,
    positions: Vec<f32>,
    velocities: Vec<f32>,
    grid: SpatialHashGrid,
    scratch: CandidateScratch,
    forces: Vec<Vec3>,
    rng: R,
    clock: StepClock,
    last_step: StepStats,
    profiler: PhaseProfiler,
    counters: Counter,
}

impl Flock<StdRng> {
    /// Random flock drawn from a seeded [`StdRng`].
    pub fn seeded(count: usize, bounds: Bounds, seed: u64) -> Result<Self, FlockError> {
        Self::new(count, bounds, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Flock<R> {
    /// Random flock with the default [`FlockConfig`].
    pub fn new(count: usize, bounds: Bounds, rng: R) -> Result<Self, FlockError> {
        Self::with_config(count, bounds, FlockConfig::default(), rng)
    }

    pub fn with_config(
        count: usize,
        bounds: Bounds,
        config: FlockConfig,
        rng: R,
    ) -> Result<Self, FlockError> {
        bounds.validate()?;
        config.validate()?;
        let mut flock = Self::empty(bounds, config, rng);
        flock.rebuild(count)?;
        Ok(flock)
    }

    /// Flock made of caller-placed agents.
    ///
    /// Positions are wrapped into `bounds` with one correction per axis; a
    /// position more than one extent outside the box is rejected. `rng` is
    /// kept for later rebuilds.
    pub fn from_state(
        bounds: Bounds,
        config: FlockConfig,
        positions: &[Vec3],
        velocities: &[Vec3],
        rng: R,
    ) -> Result<Self, FlockError> {
        bounds.validate()?;
        config.validate()?;
        if positions.len() != velocities.len() {
            return Err(FlockError::StateLengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        if positions.is_empty() {
            return Err(FlockError::EmptyPopulation);
        }
        let mut wrapped = Vec::with_capacity(positions.len() * 3);
        for (index, (p, v)) in positions.iter().zip(velocities).enumerate() {
            if !p.is_finite() || !v.is_finite() {
                return Err(FlockError::NonFiniteState { index });
            }
            let p = bounds.wrap(*p);
            if !bounds.contains(p) {
                return Err(FlockError::OutOfBounds { index });
            }
            wrapped.extend_from_slice(&p.to_array());
        }

        let mut flock = Self::empty(bounds, config, rng);
        flock.positions = wrapped;
        flock.velocities = velocities.iter().flat_map(|v| v.to_array()).collect();
        flock.reset_scratch();
        Ok(flock)
    }

    fn empty(bounds: Bounds, config: FlockConfig, rng: R) -> Self {
        Self {
            bounds,
            config,
            positions: Vec::new(),
            velocities: Vec::new(),
            grid: SpatialHashGrid::default(),
            scratch: CandidateScratch::default(),
            forces: Vec::new(),
            rng,
            clock: StepClock::new(),
            last_step: StepStats::default(),
            profiler: PhaseProfiler::new(),
            counters: Counter::new(),
        }
    }

    fn reset_scratch(&mut self) {
        let count = self.count();
        self.forces.clear();
        self.forces.resize(count, Vec3::ZERO);
        self.scratch.reset(count);
        self.grid.clear();
        self.clock.reset();
        self.last_step = StepStats::default();
    }

    /// Replace the population with `count` freshly scattered agents.
    ///
    /// Any slices previously borrowed from the flock are invalidated.
    pub fn rebuild(&mut self, count: usize) -> Result<(), FlockError> {
        if count == 0 {
            return Err(FlockError::EmptyPopulation);
        }

        let half = self.bounds.half_extents();
        let v = self.config.initial_velocity;

        self.positions = Vec::with_capacity(count * 3);
        self.velocities = Vec::with_capacity(count * 3);
        for _ in 0..count {
            self.positions.extend_from_slice(&[
                self.rng.gen_range(-half.x..half.x),
                self.rng.gen_range(-half.y..half.y),
                self.rng.gen_range(-half.z..half.z),
            ]);
            self.velocities.extend_from_slice(&[
                self.rng.gen_range(-v..v),
                self.rng.gen_range(-v..v),
                self.rng.gen_range(-v..v),
            ]);
        }
        self.reset_scratch();

        tracing::debug!(count, bounds = ?self.bounds, "flock rebuilt");
        Ok(())
    }

    /// Advance the flock by `dt` seconds.
    ///
    /// Fails without touching any state if `dt` is negative or non-finite or
    /// if a parameter is not a positive float.
    pub fn update(&mut self, dt: f32, params: &SimulationParameters) -> Result<(), FlockError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(FlockError::InvalidTimeStep { dt });
        }
        params.validate()?;

        let count = self.count();
        if count == 0 {
            return Ok(());
        }
        let limits = self.config.limits(params);

        time_phase!(self.profiler, "grid", {
            self.grid.clear();
            self.grid.set_cell_size(params.neighbor_radius)?;
            for (i, p) in self.positions.chunks_exact(3).enumerate() {
                self.grid.insert(i, p[0], p[1], p[2]);
            }
        });

        let mut candidates = 0;
        time_phase!(self.profiler, "steer", {
            for i in 0..count {
                let p = vec3_at(&self.positions, i);
                self.scratch.gather(&self.grid, &self.bounds, p);
                candidates += self.scratch.indices.len();
                self.forces[i] = steering_force(
                    i,
                    &self.scratch.indices,
                    &self.positions,
                    &self.velocities,
                    params,
                    &self.bounds,
                    &limits,
                );
            }
        });

        time_phase!(self.profiler, "integrate", {
            self.integrate(dt, &limits);
        });

        self.clock.advance(dt);
        self.last_step = StepStats {
            agents: count,
            candidates,
            occupied_cells: self.grid.bucket_count(),
        };
        flock_metrics::metrics! {
            self.counters.add("steps", 1);
            self.counters.add("candidates", candidates as u64);
        }
        tracing::trace!(
            step = self.clock.step_count(),
            agents = count,
            candidates,
            occupied_cells = self.last_step.occupied_cells,
            "flock step"
        );
        Ok(())
    }

    /// Symplectic Euler with speed clamping and wrap, one agent at a time.
    fn integrate(&mut self, dt: f32, limits: &SpeedLimits) {
        let agents = self
            .positions
            .chunks_exact_mut(3)
            .zip(self.velocities.chunks_exact_mut(3))
            .zip(&self.forces);

        for ((p, v), force) in agents {
            let velocity = clamp_speed(
                Vec3::from_slice(v) + *force * dt,
                limits.min_speed,
                limits.max_speed,
            );
            let position = self.bounds.wrap(Vec3::from_slice(p) + velocity * dt);
            velocity.write_to_slice(v);
            position.write_to_slice(p);
        }
    }

    /// Release every owned buffer. The flock holds no agents afterwards and
    /// `update` does nothing until the next [`rebuild`](Self::rebuild).
    pub fn dispose(&mut self) {
        self.positions = Vec::new();
        self.velocities = Vec::new();
        self.forces = Vec::new();
        self.scratch = CandidateScratch::default();
        self.grid = SpatialHashGrid::default();
        self.last_step = StepStats::default();
        tracing::debug!("flock disposed");
    }

}

impl<R> Flock<R> {
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Limits a step with `params` runs under.
    pub fn speed_limits(&self, params: &SimulationParameters) -> SpeedLimits {
        self.config.limits(params)
    }

    /// Interleaved XYZ positions, `count * 3` long.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Interleaved XYZ velocities, `count * 3` long.
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    /// Positions as raw bytes for instance-buffer upload.
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Velocities as raw bytes for instance-buffer upload.
    pub fn velocities_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.velocities)
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        (index < self.count()).then(|| vec3_at(&self.positions, index))
    }

    pub fn velocity(&self, index: usize) -> Option<Vec3> {
        (index < self.count()).then(|| vec3_at(&self.velocities, index))
    }

    /// Speed of one agent, e.g. for colour-by-speed.
    pub fn speed(&self, index: usize) -> Option<f32> {
        self.velocity(index).map(Vec3::length)
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    /// Phase timings; empty unless the `metrics` feature is enabled.
    pub fn profiler(&self) -> &PhaseProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::cube(100.0).unwrap()
    }

    fn two_agents(a: Vec3, b: Vec3) -> Flock {
        Flock::from_state(
            bounds(),
            FlockConfig::default(),
            &[a, b],
            &[Vec3::ZERO, Vec3::ZERO],
            StdRng::seed_from_u64(1),
        )
        .unwrap()
    }

    #[test]
    fn test_image_offsets_near_faces() {
        let (o, n) = image_offsets(0.0, 100.0, 15.0);
        assert_eq!(&o[..n], &[0.0]);

        let (o, n) = image_offsets(40.0, 100.0, 15.0);
        assert_eq!(&o[..n], &[0.0, -100.0]);

        let (o, n) = image_offsets(-36.0, 100.0, 15.0);
        assert_eq!(&o[..n], &[0.0, 100.0]);

        // Reach wider than the box needs both images
        let (_, n) = image_offsets(0.0, 20.0, 15.0);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_gather_finds_neighbor_across_corner_without_duplicates() {
        let b = bounds();
        let mut grid = SpatialHashGrid::new(15.0).unwrap();
        grid.insert(0, 49.0, 49.0, 49.0);
        grid.insert(1, -49.0, -49.0, -49.0);
        grid.insert(2, 0.0, 0.0, 0.0);

        let mut scratch = CandidateScratch::default();
        scratch.reset(3);
        scratch.gather(&grid, &b, Vec3::splat(49.0));

        let mut found = scratch.indices.clone();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_mutual_repulsion() {
        let mut flock = two_agents(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0));
        flock.update(0.1, &SimulationParameters::default()).unwrap();

        assert!(flock.velocity(0).unwrap().x < 0.0);
        assert!(flock.velocity(1).unwrap().x > 0.0);
    }

    #[test]
    fn test_repulsion_across_seam() {
        let mut flock = two_agents(Vec3::new(49.9, 0.0, 0.0), Vec3::new(-49.9, 0.0, 0.0));
        flock.update(0.1, &SimulationParameters::default()).unwrap();

        // 0.2 apart through the +x face: agent 0 is pushed back to -x
        assert!(flock.velocity(0).unwrap().x < 0.0);
        assert!(flock.velocity(1).unwrap().x > 0.0);
        assert!(flock.last_step().candidates >= 4);
    }

    #[test]
    fn test_invalid_input_leaves_state_untouched() {
        let mut flock = Flock::seeded(20, bounds(), 9).unwrap();
        let before = flock.positions().to_vec();

        assert_eq!(
            flock.update(-0.1, &SimulationParameters::default()),
            Err(FlockError::InvalidTimeStep { dt: -0.1 })
        );
        assert!(flock.update(f32::NAN, &SimulationParameters::default()).is_err());
        let bad = SimulationParameters {
            neighbor_radius: -1.0,
            ..Default::default()
        };
        assert!(flock.update(0.1, &bad).is_err());

        assert_eq!(flock.positions(), before.as_slice());
        assert_eq!(flock.clock().step_count(), 0);
        assert_eq!(flock.rebuild(0), Err(FlockError::EmptyPopulation));
        assert_eq!(flock.count(), 20);
    }

    #[test]
    fn test_from_state_validation() {
        let rng = || StdRng::seed_from_u64(0);
        let cfg = FlockConfig::default();
        assert_eq!(
            Flock::from_state(bounds(), cfg, &[Vec3::ZERO], &[], rng()).err(),
            Some(FlockError::StateLengthMismatch { positions: 1, velocities: 0 })
        );
        assert_eq!(
            Flock::from_state(bounds(), cfg, &[], &[], rng()).err(),
            Some(FlockError::EmptyPopulation)
        );
        assert_eq!(
            Flock::from_state(bounds(), cfg, &[Vec3::new(250.0, 0.0, 0.0)], &[Vec3::ZERO], rng()).err(),
            Some(FlockError::OutOfBounds { index: 0 })
        );
        assert_eq!(
            Flock::from_state(bounds(), cfg, &[Vec3::ZERO], &[Vec3::NAN], rng()).err(),
            Some(FlockError::NonFiniteState { index: 0 })
        );
    }

    #[test]
    fn test_from_state_wraps_positions_into_box() {
        let flock = Flock::from_state(
            bounds(),
            FlockConfig::default(),
            &[Vec3::new(50.0, 0.0, 0.0), Vec3::new(-60.0, 10.0, 75.0)],
            &[Vec3::ZERO, Vec3::ZERO],
            StdRng::seed_from_u64(2),
        )
        .unwrap();

        assert_eq!(flock.position(0), Some(Vec3::new(-50.0, 0.0, 0.0)));
        let p = flock.position(1).unwrap();
        assert!((p - Vec3::new(40.0, 10.0, -25.0)).length() < 1e-5);
        assert!(flock.bounds().contains(p));
    }

    #[test]
    fn test_dispose_releases_agents() {
        let mut flock = Flock::seeded(10, bounds(), 3).unwrap();
        flock.dispose();
        assert!(flock.is_empty());
        assert_eq!(flock.speed(0), None);
        assert!(flock.update(0.1, &SimulationParameters::default()).is_ok());

        flock.rebuild(5).unwrap();
        assert_eq!(flock.count(), 5);
    }

    #[test]
    fn test_byte_views_match_arrays() {
        let flock = Flock::seeded(7, bounds(), 11).unwrap();
        assert_eq!(flock.positions_bytes().len(), 7 * 3 * 4);
        assert_eq!(flock.velocities_bytes().len(), flock.velocities().len() * 4);
    }

    #[test]
    fn test_same_seed_same_flock() {
        let params = SimulationParameters::default();
        let mut a = Flock::seeded(64, bounds(), 42).unwrap();
        let mut b = Flock::seeded(64, bounds(), 42).unwrap();
        for _ in 0..10 {
            a.update(1.0 / 60.0, &params).unwrap();
            b.update(1.0 / 60.0, &params).unwrap();
        }
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
    }
}
