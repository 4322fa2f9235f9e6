//! Simulation clock
//!
//! Counts completed steps and simulated seconds. The flock never clamps
//! `dt` itself; render loops use [`clamp_frame_dt`] to absorb spikes such as
//! a resumed window before calling `update`.

/// Frame time assumed by the headless runtime (60 Hz).
pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;

/// Largest frame time the runtime forwards by default.
pub const DEFAULT_MAX_FRAME_DT: f32 = 0.1;

/// Step counter and accumulated simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepClock {
    step_count: u64,
    elapsed: f64,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated seconds across every step since the last reset.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn advance(&mut self, dt: f32) {
        self.step_count += 1;
        self.elapsed += dt as f64;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Clamp a raw frame delta into `[0, max_dt]`.
///
/// Non-finite or negative input collapses to zero so a glitching timer
/// cannot feed the flock an invalid step. Returns the value and whether it
/// was changed.
pub fn clamp_frame_dt(raw: f32, max_dt: f32) -> (f32, bool) {
    if !raw.is_finite() || raw < 0.0 {
        (0.0, true)
    } else if raw > max_dt {
        (max_dt, true)
    } else {
        (raw, false)
    }
}
