//! Impulse Engine demo
//!
//! Runs the demo scene on a background thread, samples snapshots from the
//! main thread, flips gravity halfway through and prints the final state.
//!
//! Usage: `impulse-engine [settings.json] [seed]`

use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};

use impulse_engine::physics::{DirectionalGravity, ShapeSnapshot};
use impulse_engine::{EngineSettings, Snapshot, SimulationRunner, scene};
use serde_json::json;

/// Wall-clock length of an open-ended demo run
const DEMO_DURATION: Duration = Duration::from_secs(6);
/// Interval between logged snapshots
const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_SEED: u64 = 0x5EED;

fn main() {
    env_logger::init();
    log::info!("Impulse Engine demo starting...");

    if let Err(err) = run() {
        log::error!("Demo failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };
    let seed = match args.next() {
        Some(seed) => seed.parse()?,
        None => DEFAULT_SEED,
    };

    let system = scene::build(seed, &settings)?;
    let mut runner = SimulationRunner::new(system, settings.pacing);
    runner.start()?;

    let started = Instant::now();
    let mut flipped = false;
    while runner.is_running() && started.elapsed() < DEMO_DURATION {
        thread::sleep(SAMPLE_INTERVAL);
        let snapshot = match runner.snapshot() {
            Ok(snapshot) => snapshot,
            // The run ended between the check and the request
            Err(_) if !runner.is_running() => break,
            Err(err) => return Err(err.into()),
        };
        log_stats(&snapshot);

        if !flipped && started.elapsed() >= DEMO_DURATION / 2 {
            if let Some(acceleration) = gravity_of(&snapshot) {
                let flipped_gravity = -acceleration;
                log::info!("Flipping gravity to {flipped_gravity}");
                runner.apply_input(
                    DirectionalGravity::INPUT_KEY,
                    json!([flipped_gravity.x, flipped_gravity.y, flipped_gravity.z]),
                )?;
            }
            flipped = true;
        }
    }

    let summary = if runner.is_running() {
        runner.stop_and_await()?
    } else {
        runner.await_completion()?
    };
    log::info!(
        "Run ended ({:?}): {} steps, {:.3}s simulated in {:.3}s",
        summary.ended,
        summary.steps,
        summary.sim_time,
        summary.real_time.as_secs_f64()
    );

    let system = runner.into_simulation()?;
    println!("{}", system.copy_state().to_json()?);
    Ok(())
}

fn gravity_of(snapshot: &Snapshot) -> Option<glam::DVec3> {
    snapshot.entities.iter().find_map(|entity| match entity.shape {
        ShapeSnapshot::Field { acceleration } => Some(acceleration),
        _ => None,
    })
}

fn log_stats(snapshot: &Snapshot) {
    let moving: Vec<_> = snapshot
        .entities
        .iter()
        .filter(|e| !e.is_static && !matches!(e.shape, ShapeSnapshot::Field { .. }))
        .collect();
    let speeds = moving.iter().map(|e| e.velocity.length());
    let mean_speed = if moving.is_empty() {
        0.0
    } else {
        speeds.sum::<f64>() / moving.len() as f64
    };
    let highest = moving
        .iter()
        .filter_map(|e| e.position())
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);
    log::info!(
        "t={:.3}s steps={} entities={} mean speed={:.2} highest y={:.2}",
        snapshot.sim_time,
        snapshot.steps,
        snapshot.len(),
        mean_speed,
        highest
    );
}
