//! Flock Runtime
//!
//! Headless driver: builds a seeded flock from settings and steps it once
//! per simulated frame, standing in for a render loop.

mod settings;

use anyhow::Result;
use flock_core::time::clamp_frame_dt;
use flock_core::Flock;
use flock_metrics::StepTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use settings::Settings;
use std::time::Instant;

/// Speed distribution across the flock.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpeedSummary {
    min: f32,
    mean: f32,
    max: f32,
}

fn speed_summary<R>(flock: &Flock<R>) -> SpeedSummary {
    let mut summary = SpeedSummary {
        min: f32::INFINITY,
        mean: 0.0,
        max: 0.0,
    };
    let count = flock.count();
    for speed in (0..count).filter_map(|i| flock.speed(i)) {
        summary.min = summary.min.min(speed);
        summary.max = summary.max.max(speed);
        summary.mean += speed;
    }
    if count > 0 {
        summary.mean /= count as f32;
    } else {
        summary.min = 0.0;
    }
    summary
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Flock runtime v{}", flock_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    tracing::info!(
        population = settings.population,
        seed = settings.seed,
        frames = settings.frames,
        "Building flock"
    );

    let mut flock = Flock::with_config(
        settings.population,
        settings.bounds,
        settings.config,
        StdRng::seed_from_u64(settings.seed),
    )?;

    let mut timer = StepTimer::new(120);
    let mut last_frame = Instant::now();

    for frame in 1..=settings.frames {
        let raw_dt = if settings.realtime {
            let now = Instant::now();
            let elapsed = now.duration_since(last_frame).as_secs_f32();
            last_frame = now;
            elapsed
        } else {
            settings.frame_dt
        };
        let (dt, clamped) = clamp_frame_dt(raw_dt, settings.max_frame_dt);
        if clamped {
            tracing::warn!(frame, raw_dt, dt, "Frame time clamped");
        }

        timer.begin();
        flock.update(dt, &settings.params)?;
        timer.end();

        if settings.report_every > 0 && frame % settings.report_every == 0 {
            let stats = flock.last_step();
            let speeds = speed_summary(&flock);
            tracing::info!(
                frame,
                mean_speed = speeds.mean,
                candidates_per_agent = stats.candidates as f32 / stats.agents.max(1) as f32,
                occupied_cells = stats.occupied_cells,
                steps_per_sec = timer.steps_per_second(),
                "Progress"
            );
        }
    }

    let speeds = speed_summary(&flock);
    let (fastest_ms, slowest_ms) = timer.step_range_ms();
    tracing::info!(
        steps = flock.clock().step_count(),
        simulated_secs = flock.clock().elapsed(),
        min_speed = speeds.min,
        mean_speed = speeds.mean,
        max_speed = speeds.max,
        "Run complete"
    );
    tracing::info!(
        mean_step_ms = timer.mean_step_ms(),
        fastest_ms,
        slowest_ms,
        grid_ms = flock.profiler().total("grid").as_secs_f64() * 1000.0,
        steer_ms = flock.profiler().total("steer").as_secs_f64() * 1000.0,
        integrate_ms = flock.profiler().total("integrate").as_secs_f64() * 1000.0,
        candidates = flock.counters().get("candidates"),
        "Timing"
    );

    flock.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{Bounds, SimulationParameters};

    #[test]
    fn test_speed_summary_within_limits_after_step() {
        let params = SimulationParameters::default();
        let mut flock = Flock::seeded(50, Bounds::cube(80.0).unwrap(), 3).unwrap();
        flock.update(0.1, &params).unwrap();

        let limits = flock.speed_limits(&params);
        let summary = speed_summary(&flock);
        assert!(summary.min >= limits.min_speed - 1e-3);
        assert!(summary.max <= limits.max_speed + 1e-3);
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
    }

    #[test]
    fn test_speed_summary_of_disposed_flock() {
        let mut flock = Flock::seeded(4, Bounds::cube(10.0).unwrap(), 3).unwrap();
        flock.dispose();
        assert_eq!(
            speed_summary(&flock),
            SpeedSummary { min: 0.0, mean: 0.0, max: 0.0 }
        );
    }
}
