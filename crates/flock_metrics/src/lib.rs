//! Flock Metrics - step instrumentation for the flocking core
//!
//! Provides zero-cost abstractions for timing simulation phases that
//! completely vanish in shipping builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use flock_metrics::{PhaseProfiler, StepTimer};
//!
//! let mut timer = StepTimer::new(120); // Track last 120 steps
//! timer.begin();
//! flock.update(dt, &params)?;
//! timer.end();
//! println!("steps/s: {:.1}", timer.steps_per_second());
//! ```
//!
//! Without the `metrics` feature every type below is a unit stub and
//! [`time_phase!`] expands to its body alone.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod phase_profiler;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod step_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use phase_profiler::PhaseProfiler;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use step_timer::StepTimer;

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block and add the elapsed time to `$profiler` under `$name`.
///
/// The feature check is evaluated in the calling crate, so callers forward
/// their own `metrics` feature to `flock_metrics/metrics`.
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let __phase_start = ::std::time::Instant::now();
        let __phase_result = $body;
        #[cfg(feature = "metrics")]
        $profiler.record($name, __phase_start.elapsed());
        __phase_result
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct StepTimer;

#[cfg(not(feature = "metrics"))]
impl StepTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn steps_per_second(&self) -> f64 { 0.0 }
    pub fn mean_step_ms(&self) -> f64 { 0.0 }
    pub fn step_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn add(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct PhaseProfiler;

#[cfg(not(feature = "metrics"))]
impl PhaseProfiler {
    pub fn new() -> Self { Self }
    pub fn record(&mut self, _name: &'static str, _elapsed: std::time::Duration) {}
    pub fn total(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
}
