//! Demo scene
//!
//! A walled box with a few static obstacles, a scripted lift, a self-driven
//! tug and a seeded scatter of balls. Same seed, same scene.

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::physics::{Behavior, Body, DirectionalGravity, MotionProfile, PhysicsError, PhysicsSystem, Polygon};
use crate::settings::EngineSettings;

/// Inner width of the box
pub const BOX_WIDTH: f64 = 100.0;
/// Inner height of the box
pub const BOX_HEIGHT: f64 = 60.0;
/// Balls scattered by `build`
pub const BALL_COUNT: usize = 24;

/// Build the demo scene.
///
/// Gravity comes from `settings` when configured, otherwise standard
/// downward gravity is added.
pub fn build(seed: u64, settings: &EngineSettings) -> Result<PhysicsSystem, PhysicsError> {
    let mut system = PhysicsSystem::from_settings(settings)?;
    if settings.gravity.is_none() {
        system.add_entity(DirectionalGravity::earth())?;
    }

    add_walls(&mut system)?;
    add_obstacles(&mut system)?;
    add_balls(&mut system, &mut Pcg32::seed_from_u64(seed))?;

    log::info!(
        "Built demo scene (seed {seed}): {} static, {} dynamic bodies",
        system.statics().len(),
        system.dynamics().len()
    );
    Ok(system)
}

fn add_walls(system: &mut PhysicsSystem) -> Result<(), PhysicsError> {
    let (w, h) = (BOX_WIDTH, BOX_HEIGHT);
    let corners = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(w, 0.0, 0.0),
        DVec3::new(w, h, 0.0),
        DVec3::new(0.0, h, 0.0),
    ];
    // Each wall faces into the box
    let walls = [
        ("floor", corners[0], corners[1], 1),
        ("right wall", corners[1], corners[2], 1),
        ("ceiling", corners[2], corners[3], 1),
        ("left wall", corners[3], corners[0], 1),
    ];
    for (name, p1, p2, side) in walls {
        system.add_entity(Body::wall(p1, p2, side, 0.9)?.named(name))?;
    }
    Ok(())
}

fn add_obstacles(system: &mut PhysicsSystem) -> Result<(), PhysicsError> {
    let wedge = [
        DVec3::new(44.0, 0.0, 0.0),
        DVec3::new(56.0, 0.0, 0.0),
        DVec3::new(50.0, 9.0, 0.0),
    ];
    system.add_entity(Body::polygon_wall(&wedge, 0.8)?.named("wedge"))?;

    system.add_entity(
        Body::sphere(DVec3::new(72.0, 16.0, 0.0), 4.0, DVec3::ZERO, f64::INFINITY, 1.0)?.named("bumper"),
    )?;

    system.add_entity(
        Body::wall(DVec3::new(4.0, 22.0, 0.0), DVec3::new(30.0, 12.0, 0.0), 1, 0.7)?.named("ramp"),
    )?;

    // Immovable platform that rises 25 units and parks
    let lift = Polygon::rectangle(DVec3::new(88.0, 6.0, 0.0), 12.0, 2.0)?;
    let profile = MotionProfile::symmetric(0.0, 25.0, 3.0, 1.5)?;
    system.add_entity(
        Body::polygon_wall(lift.points(), 0.5)?
            .named("lift")
            .with_behavior(Behavior::profiled(profile, DVec3::Y)),
    )?;

    // Pushes itself rightward, ignoring gravity
    system.add_entity(
        Body::sphere(DVec3::new(10.0, 52.0, 0.0), 2.5, DVec3::ZERO, 20.0, 0.6)?
            .named("tug")
            .with_behavior(Behavior::elevator(DVec3::new(4.0, 0.0, 0.0), 2.0)),
    )?;
    Ok(())
}

/// Scatter balls on a loose grid in the upper half so none start overlapping
fn add_balls(system: &mut PhysicsSystem, rng: &mut Pcg32) -> Result<(), PhysicsError> {
    const COLUMNS: usize = 8;
    let cell = BOX_WIDTH / COLUMNS as f64;
    for i in 0..BALL_COUNT {
        let (column, row) = (i % COLUMNS, i / COLUMNS);
        let radius = rng.random_range(1.0..2.5);
        let jitter = cell * 0.5 - radius - 0.5;
        let center = DVec3::new(
            cell * (column as f64 + 0.5) + rng.random_range(-jitter..jitter),
            BOX_HEIGHT - 16.0 - row as f64 * cell * 0.6,
            0.0,
        );
        let velocity = DVec3::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0), 0.0);
        // Uniform density in 2D
        let mass = radius * radius;
        let restitution = rng.random_range(0.6..0.95);
        system.add_entity(Body::sphere(center, radius, velocity, mass, restitution)?.named(format!("ball {i}")))?;
    }
    Ok(())
}
