//! Entity model
//!
//! An entity is either a physical body or a free-form entity with no shape of
//! its own (force fields and the like). Free-form entities act on the whole
//! body population; bodies only ever act on themselves.

use std::fmt;

use glam::DVec3;
use serde_json::Value;

use super::StepError;
use super::body::Body;
use super::snapshot::{EntitySnapshot, ShapeSnapshot};

/// Mutable view of every body, handed to free-form entities during the act pass.
///
/// Bodies may be edited or replaced in place, but a replacement must keep
/// its mass class: a finite-mass body in the static slice or an immovable
/// one in the dynamic slice fails the step with [`StepError::Misplaced`].
pub struct Population<'a> {
    statics: &'a mut [Body],
    dynamics: &'a mut [Body],
}

impl<'a> Population<'a> {
    pub fn new(statics: &'a mut [Body], dynamics: &'a mut [Body]) -> Self {
        Self { statics, dynamics }
    }

    pub fn statics(&self) -> &[Body] {
        &*self.statics
    }

    pub fn statics_mut(&mut self) -> &mut [Body] {
        &mut *self.statics
    }

    pub fn dynamics(&self) -> &[Body] {
        &*self.dynamics
    }

    pub fn dynamics_mut(&mut self) -> &mut [Body] {
        &mut *self.dynamics
    }

    /// Statics then dynamics
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.statics.iter().chain(self.dynamics.iter())
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.dynamics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entity with no collidable shape that acts on the population each step
pub trait FreeEntity: Send {
    fn name(&self) -> &str;

    /// Runs before any body acts. An error aborts the step.
    fn act(&mut self, dt: f64, population: &mut Population<'_>) -> Result<(), StepError>;

    /// Offer an external input; return true when the key was handled
    fn apply_input(&mut self, _key: &str, _value: &Value) -> bool {
        false
    }

    fn render_copy(&self) -> EntitySnapshot;
}

/// Anything that can be added to a physics system
pub enum Entity {
    Free(Box<dyn FreeEntity>),
    Physical(Body),
}

impl Entity {
    pub fn free(entity: impl FreeEntity + 'static) -> Self {
        Entity::Free(Box::new(entity))
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Free(entity) => entity.name(),
            Entity::Physical(body) => &body.name,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Free(entity) => f.debug_tuple("Free").field(&entity.name()).finish(),
            Entity::Physical(body) => f.debug_tuple("Physical").field(body).finish(),
        }
    }
}

impl From<Body> for Entity {
    fn from(body: Body) -> Self {
        Entity::Physical(body)
    }
}

impl From<DirectionalGravity> for Entity {
    fn from(gravity: DirectionalGravity) -> Self {
        Entity::free(gravity)
    }
}

/// Uniform acceleration applied to every dynamic body not exempt from gravity
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalGravity {
    pub name: String,
    pub acceleration: DVec3,
}

impl DirectionalGravity {
    /// Input key that replaces the acceleration vector
    pub const INPUT_KEY: &'static str = "gravity";

    pub fn new(acceleration: DVec3) -> Self {
        Self {
            name: "gravity".to_string(),
            acceleration,
        }
    }

    /// Standard downward gravity in the XY plane
    pub fn earth() -> Self {
        Self::new(DVec3::new(0.0, -9.81, 0.0))
    }
}

impl FreeEntity for DirectionalGravity {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, _dt: f64, population: &mut Population<'_>) -> Result<(), StepError> {
        for body in population.dynamics_mut() {
            if !body.gravity_exempt {
                let mass = body.mass();
                body.add_force(self.acceleration, mass);
            }
        }
        Ok(())
    }

    fn apply_input(&mut self, key: &str, value: &Value) -> bool {
        if key != Self::INPUT_KEY {
            return false;
        }
        match serde_json::from_value::<[f64; 3]>(value.clone()) {
            Ok(components) if components.iter().all(|c| c.is_finite()) => {
                self.acceleration = DVec3::from_array(components);
                log::debug!("{}: acceleration set to {:?}", self.name, self.acceleration);
            }
            _ => log::warn!("{}: ignoring malformed gravity input {value}", self.name),
        }
        true
    }

    fn render_copy(&self) -> EntitySnapshot {
        EntitySnapshot {
            name: self.name.clone(),
            is_static: false,
            velocity: DVec3::ZERO,
            shape: ShapeSnapshot::Field {
                acceleration: self.acceleration,
            },
        }
    }
}
