//! Accumulated timings for named step phases

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct PhaseProfiler {
    phases: HashMap<&'static str, Duration>,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one measurement for `name`. Usually driven by [`crate::time_phase!`].
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        *self.phases.entry(name).or_default() += elapsed;
    }

    /// Sum of every measurement recorded for `name`.
    pub fn total(&self, name: &str) -> Duration {
        self.phases.get(name).copied().unwrap_or(Duration::ZERO)
    }
}
