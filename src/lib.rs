//! Impulse Engine - threaded 2D impulse physics
//!
//! Core modules:
//! - `geom`: Geometry kernel (spheres, oriented segments, narrow-phase tests)
//! - `physics`: Entity model, collision resolution and the stepping system
//! - `runner`: Background-thread simulation driver with snapshot/input handoff
//! - `settings`: JSON-loadable engine configuration
//! - `scene`: Seeded demo scene

pub mod geom;
pub mod physics;
pub mod runner;
pub mod scene;
pub mod settings;

pub use physics::{Body, Entity, PhysicsSystem, Snapshot};
pub use runner::{
    Pacing, RunEnd, RunSummary, RunnerError, RunnerState, Simulation, SimulationRunner, Throttle,
};
pub use settings::EngineSettings;

use glam::DVec3;

/// Engine tuning constants
pub mod consts {
    /// Default per-group entity capacity
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Largest per-group capacity settings may ask for
    pub const MAX_CAPACITY: usize = 1_000_000;

    /// Approach speed (scaled by combined restitution) below which a contact
    /// is treated as resting and made fully inelastic.
    ///
    /// Heuristic: the product compared against it has no clean physical unit.
    pub const RESTING_THRESHOLD: f64 = 5.0;

    /// Squared speed below which a body counts as stopped
    pub const STOPPED_SPEED_SQUARED: f64 = 1e-14;

    /// Default fixed step (seconds of simulated time)
    pub const DEFAULT_STEP: f64 = 1.0 / 120.0;

    /// Real-time pacing never takes a step longer than this by default
    pub const DEFAULT_MAX_STEP: f64 = 1.0 / 30.0;

    /// Real-time pacing never takes a step shorter than this by default
    pub const DEFAULT_MIN_STEP: f64 = 1.0 / 2000.0;
}

/// Rotate a vector 90° in the XY plane.
///
/// `side > 0` turns counter-clockwise, otherwise clockwise. z is preserved.
#[inline]
pub fn rotate_quarter(v: DVec3, side: i8) -> DVec3 {
    if side > 0 {
        DVec3::new(-v.y, v.x, v.z)
    } else {
        DVec3::new(v.y, -v.x, v.z)
    }
}

/// True when every component of every vector is finite
#[inline]
pub fn all_finite(vectors: &[DVec3]) -> bool {
    vectors.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter() {
        let ccw = rotate_quarter(DVec3::X, 1);
        assert!((ccw - DVec3::Y).length() < 1e-12);

        let cw = rotate_quarter(DVec3::X, -1);
        assert!((cw + DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_all_finite() {
        assert!(all_finite(&[DVec3::ONE, DVec3::ZERO]));
        assert!(!all_finite(&[DVec3::new(f64::NAN, 0.0, 0.0)]));
        assert!(!all_finite(&[DVec3::ONE, DVec3::splat(f64::INFINITY)]));
    }
}
