//! Physical bodies
//!
//! A body has mass, velocity and a shape. Infinite mass means immovable:
//! inverse mass is then exactly 0 and the body is filed as static. Forces
//! accumulate during the act pass and are drained by `integrate`.

use glam::DVec3;

use super::PhysicsError;
use super::behavior::Behavior;
use super::polygon::Polygon;
use super::shape::Shape;
use super::snapshot::{EntitySnapshot, ShapeSnapshot};
use crate::consts::STOPPED_SPEED_SQUARED;
use crate::geom::{OrientedSegment, Sphere};

/// A body with mass, velocity and a collidable shape
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub velocity: DVec3,
    /// Gravity sources skip this body
    pub gravity_exempt: bool,
    shape: Shape,
    mass: f64,
    inverse_mass: f64,
    sqrt_mass: f64,
    restitution: f64,
    force: DVec3,
    behavior: Option<Behavior>,
}

impl Body {
    pub fn new(
        shape: Shape,
        velocity: DVec3,
        mass: f64,
        restitution: f64,
    ) -> Result<Self, PhysicsError> {
        if !(mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if !(0.0..=1.0).contains(&restitution) {
            return Err(PhysicsError::InvalidRestitution(restitution));
        }
        let (inverse_mass, sqrt_mass) = if mass.is_infinite() {
            (0.0, f64::INFINITY)
        } else {
            (1.0 / mass, mass.sqrt())
        };
        Ok(Self {
            name: String::new(),
            velocity,
            gravity_exempt: false,
            shape,
            mass,
            inverse_mass,
            sqrt_mass,
            restitution,
            force: DVec3::ZERO,
            behavior: None,
        })
    }

    pub fn sphere(
        center: DVec3,
        radius: f64,
        velocity: DVec3,
        mass: f64,
        restitution: f64,
    ) -> Result<Self, PhysicsError> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(PhysicsError::InvalidRadius(radius));
        }
        Self::new(
            Shape::Sphere(Sphere::new(center, radius)),
            velocity,
            mass,
            restitution,
        )
    }

    /// Oriented segment; `side` picks which half-plane it faces
    pub fn segment(
        p1: DVec3,
        p2: DVec3,
        side: i8,
        velocity: DVec3,
        mass: f64,
        restitution: f64,
    ) -> Result<Self, PhysicsError> {
        let segment = OrientedSegment::new(p1, p2, side).ok_or(PhysicsError::DegenerateSegment)?;
        Self::new(Shape::Segment(segment), velocity, mass, restitution)
    }

    pub fn polygon(
        points: &[DVec3],
        velocity: DVec3,
        mass: f64,
        restitution: f64,
    ) -> Result<Self, PhysicsError> {
        Self::new(
            Shape::Polygon(Polygon::new(points)?),
            velocity,
            mass,
            restitution,
        )
    }

    /// Immovable, motionless segment
    pub fn wall(p1: DVec3, p2: DVec3, side: i8, restitution: f64) -> Result<Self, PhysicsError> {
        Self::segment(p1, p2, side, DVec3::ZERO, f64::INFINITY, restitution)
    }

    /// Immovable, motionless polygon
    pub fn polygon_wall(points: &[DVec3], restitution: f64) -> Result<Self, PhysicsError> {
        Self::polygon(points, DVec3::ZERO, f64::INFINITY, restitution)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn exempt_from_gravity(mut self) -> Self {
        self.gravity_exempt = true;
        self
    }

    /// Attach a behavior; elevators drive themselves and ignore gravity
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        if matches!(behavior, Behavior::Elevator { .. }) {
            self.gravity_exempt = true;
        }
        self.behavior = Some(behavior);
        self
    }

    /// Run the attached behavior, if any
    pub fn act(&mut self, dt: f64) {
        if let Some(mut behavior) = self.behavior.take() {
            behavior.act(self, dt);
            self.behavior = Some(behavior);
        }
    }

    /// Advance under the accumulated force with constant acceleration, then
    /// drain the force.
    ///
    /// The position term uses the velocity from before this update.
    pub fn integrate(&mut self, dt: f64) {
        let acceleration = self.force * self.inverse_mass;
        let delta = self.velocity * dt + acceleration * (0.5 * dt * dt);
        self.velocity += acceleration * dt;
        self.shape.translate(delta);
        self.force = DVec3::ZERO;
    }

    /// Rigidly move the body
    #[inline]
    pub fn translate(&mut self, delta: DVec3) {
        self.shape.translate(delta);
    }

    pub fn add_force(&mut self, direction: DVec3, magnitude: f64) {
        self.force += direction * magnitude;
    }

    /// Change velocity by `normal * magnitude`
    #[inline]
    pub fn apply_impulse(&mut self, normal: DVec3, magnitude: f64) {
        self.velocity += normal * magnitude;
    }

    pub fn has_motion_stopped(&self) -> bool {
        self.velocity.length_squared() < STOPPED_SPEED_SQUARED
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.shape.is_finite()
    }

    pub fn position(&self) -> DVec3 {
        self.shape.anchor()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn sqrt_mass(&self) -> f64 {
        self.sqrt_mass
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn force(&self) -> DVec3 {
        self.force
    }

    pub fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref()
    }

    /// Independent copy safe to hand to another thread
    pub fn render_copy(&self) -> EntitySnapshot {
        let shape = match &self.shape {
            Shape::Sphere(sphere) => ShapeSnapshot::Sphere {
                center: sphere.center,
                radius: sphere.radius,
            },
            Shape::Segment(segment) => ShapeSnapshot::Segment {
                p1: segment.p1,
                p2: segment.p2,
                normal: segment.normal(),
            },
            Shape::Polygon(polygon) => ShapeSnapshot::Polygon {
                points: polygon.points().to_vec(),
                bounds: polygon.bounds(),
            },
        };
        EntitySnapshot {
            name: self.name.clone(),
            is_static: self.is_static(),
            velocity: self.velocity,
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_invariants() {
        let dynamic = Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, 4.0, 0.5).unwrap();
        assert_eq!(dynamic.inverse_mass(), 0.25);
        assert_eq!(dynamic.sqrt_mass(), 2.0);
        assert!(!dynamic.is_static());

        let wall = Body::wall(DVec3::ZERO, DVec3::X, 1, 0.5).unwrap();
        assert_eq!(wall.mass(), f64::INFINITY);
        assert_eq!(wall.inverse_mass(), 0.0);
        assert!(wall.is_static());
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, 0.0, 0.5),
            Err(PhysicsError::InvalidMass(0.0))
        );
        assert!(matches!(
            Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, f64::NAN, 0.5),
            Err(PhysicsError::InvalidMass(_))
        ));
        assert_eq!(
            Body::sphere(DVec3::ZERO, 1.0, DVec3::ZERO, 1.0, 1.5),
            Err(PhysicsError::InvalidRestitution(1.5))
        );
        assert_eq!(
            Body::sphere(DVec3::ZERO, -1.0, DVec3::ZERO, 1.0, 0.5),
            Err(PhysicsError::InvalidRadius(-1.0))
        );
        assert_eq!(
            Body::wall(DVec3::ONE, DVec3::ONE, 1, 0.5),
            Err(PhysicsError::DegenerateSegment)
        );
    }

    #[test]
    fn test_integrate_constant_force() {
        // Mass 2 under (0, -10, 0) for 10 steps of 0.1s from (0, 100, 0)
        let mut body = Body::sphere(DVec3::new(0.0, 100.0, 0.0), 1.0, DVec3::ZERO, 2.0, 1.0).unwrap();
        for _ in 0..10 {
            body.add_force(DVec3::new(0.0, -10.0, 0.0), 1.0);
            body.integrate(0.1);
            assert_eq!(body.force(), DVec3::ZERO);
        }
        // a = -5: y = 100 - 0.5 * 5 * 1² = 97.5, vy = -5
        assert!((body.position().y - 97.5).abs() < 1e-9);
        assert!((body.velocity.y + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_static_body_ignores_force() {
        let mut wall = Body::wall(DVec3::ZERO, DVec3::X, 1, 0.5).unwrap();
        let start = wall.position();
        wall.add_force(DVec3::Y, 1e6);
        wall.integrate(1.0);
        assert_eq!(wall.position(), start);
        assert_eq!(wall.velocity, DVec3::ZERO);
    }

    #[test]
    fn test_motion_stopped() {
        let mut body = Body::sphere(DVec3::ZERO, 1.0, DVec3::new(1e-8, 0.0, 0.0), 1.0, 1.0).unwrap();
        assert!(body.has_motion_stopped());
        body.apply_impulse(DVec3::X, 1.0);
        assert!(!body.has_motion_stopped());
    }

    #[test]
    fn test_render_copy_is_independent() {
        let mut body = Body::sphere(DVec3::ONE, 2.0, DVec3::X, 1.0, 1.0)
            .unwrap()
            .named("ball");
        let copy = body.render_copy();
        body.translate(DVec3::Y * 5.0);
        body.velocity = DVec3::ZERO;

        assert_eq!(copy.name, "ball");
        assert_eq!(copy.velocity, DVec3::X);
        assert_eq!(
            copy.shape,
            ShapeSnapshot::Sphere {
                center: DVec3::ONE,
                radius: 2.0
            }
        );
    }
}
