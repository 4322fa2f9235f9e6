//! Runtime settings

use anyhow::{Context, Result};
use flock_core::time::{DEFAULT_FRAME_DT, DEFAULT_MAX_FRAME_DT};
use flock_core::{Bounds, FlockConfig, SimulationParameters};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Headless run settings, loaded from JSON.
///
/// Missing fields fall back to [`Settings::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub population: usize,
    pub bounds: Bounds,
    pub seed: u64,
    pub frames: u64,
    /// Nominal frame time fed to the flock.
    pub frame_dt: f32,
    /// Frame times above this are clamped before reaching the flock.
    pub max_frame_dt: f32,
    /// Use measured wall-clock frame times instead of `frame_dt`.
    pub realtime: bool,
    /// Log progress every this many frames (0 disables).
    pub report_every: u64,
    pub params: SimulationParameters,
    pub config: FlockConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            population: 1_000,
            bounds: Bounds {
                width: 200.0,
                height: 120.0,
                depth: 200.0,
            },
            seed: 0x5eed,
            frames: 600,
            frame_dt: DEFAULT_FRAME_DT,
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
            realtime: false,
            report_every: 120,
            params: SimulationParameters::default(),
            config: FlockConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing settings in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.params.validate()?;
        settings.bounds.validate()?;
        Ok(settings)
    }
}
