//! Per-body act hooks
//!
//! A behavior runs during the act pass and only touches its own body.

use glam::DVec3;

use super::body::Body;
use super::profile::MotionProfile;

/// Scripted motion attached to a body
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Push toward `max_velocity`, never accelerating harder than `acceleration`
    Elevator {
        max_velocity: DVec3,
        direction: DVec3,
        acceleration: f64,
    },
    /// Follow `profile` along `axis`, measured from where the body stood on
    /// its first act
    Profiled {
        profile: MotionProfile,
        axis: DVec3,
        origin: Option<DVec3>,
        elapsed: f64,
    },
}

impl Behavior {
    pub fn elevator(max_velocity: DVec3, acceleration: f64) -> Self {
        Behavior::Elevator {
            max_velocity,
            direction: max_velocity.normalize_or_zero(),
            acceleration,
        }
    }

    pub fn profiled(profile: MotionProfile, axis: DVec3) -> Self {
        Behavior::Profiled {
            profile,
            axis: axis.normalize_or_zero(),
            origin: None,
            elapsed: 0.0,
        }
    }

    pub(crate) fn act(&mut self, body: &mut Body, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        match self {
            Behavior::Elevator {
                max_velocity,
                direction,
                acceleration,
            } => {
                // Force only makes sense on something that can accelerate
                if body.inverse_mass() == 0.0 {
                    return;
                }
                let missing = (*max_velocity - body.velocity).dot(*direction);
                let required = (missing / dt).min(*acceleration);
                body.add_force(*direction, required * body.mass());
            }
            Behavior::Profiled {
                profile,
                axis,
                origin,
                elapsed,
            } => {
                let origin = *origin.get_or_insert_with(|| body.position());
                let offset = profile.position_at(*elapsed + dt) - profile.start();
                let target = origin + *axis * offset;
                body.velocity = (target - body.position()) / dt;
                *elapsed += dt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevator_caps_acceleration() {
        let mut body = Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, 2.0, 1.0)
            .unwrap()
            .with_behavior(Behavior::elevator(DVec3::new(0.0, 10.0, 0.0), 4.0));
        body.act(0.1);
        // Needs 100 m/s² to reach 10 m/s in 0.1s, capped to 4 → force 8
        assert!((body.force() - DVec3::new(0.0, 8.0, 0.0)).length() < 1e-12);
        assert!(body.gravity_exempt);
    }

    #[test]
    fn test_elevator_eases_into_target() {
        let mut body = Body::sphere(DVec3::ZERO, 1.0, DVec3::new(0.0, 9.9, 0.0), 1.0, 1.0)
            .unwrap()
            .with_behavior(Behavior::elevator(DVec3::new(0.0, 10.0, 0.0), 4.0));
        body.act(0.1);
        body.integrate(0.1);
        assert!((body.velocity.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_profiled_static_platform() {
        let profile = MotionProfile::symmetric(0.0, 10.0, 2.0, 2.0).unwrap();
        let mut body = Body::wall(DVec3::new(0.0, 5.0, 0.0), DVec3::new(4.0, 5.0, 0.0), 1, 0.5)
            .unwrap()
            .with_behavior(Behavior::profiled(profile, DVec3::X));
        let start = body.position();

        let dt = 0.05;
        let mut t = 0.0;
        // 6s move: 1s ramp up, 4s cruise, 1s ramp down
        for _ in 0..160 {
            body.act(dt);
            body.integrate(dt);
            t += dt;
            let expected = start + DVec3::X * profile.position_at(t);
            assert!((body.position() - expected).length() < 1e-9);
        }
        assert!(profile.is_finished(t));
        assert!((body.position() - (start + DVec3::X * 10.0)).length() < 1e-9);
    }
}
