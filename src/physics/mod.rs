//! Physics module
//!
//! Entities, impulse collision resolution and the stepping system. Nothing in
//! here locks: the system must only ever be touched by one thread at a time,
//! which the runner guarantees.
//!
//! One step is three passes in a fixed order:
//! - act: every entity's hook (forces, scripted motion)
//! - integrate: constant acceleration over the step, then drain forces
//! - collide: static x dynamic pairs, then each dynamic pair once

pub mod behavior;
pub mod body;
pub mod bounds;
pub mod collision;
pub mod entity;
pub mod narrow;
pub mod polygon;
pub mod profile;
pub mod shape;
pub mod snapshot;
pub mod system;

pub use behavior::Behavior;
pub use body::Body;
pub use bounds::BoundingSphere;
pub use collision::Collision;
pub use entity::{DirectionalGravity, Entity, FreeEntity, Population};
pub use polygon::Polygon;
pub use profile::MotionProfile;
pub use shape::Shape;
pub use snapshot::{EntitySnapshot, ShapeSnapshot, Snapshot};
pub use system::{EntityKey, Group, PhysicsSystem};

use thiserror::Error;

/// Errors raised while building or populating a physics system
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// The target group already holds its fixed number of entities
    #[error("{group} group is full (capacity {capacity})")]
    CapacityExceeded { group: Group, capacity: usize },
    /// Mass must be > 0 (infinity means immovable)
    #[error("invalid mass: {0}")]
    InvalidMass(f64),
    /// Restitution must lie in [0, 1]
    #[error("invalid coefficient of restitution: {0}")]
    InvalidRestitution(f64),
    /// Radius must be finite and > 0
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),
    /// Polygons need at least 3 distinct points and a non-zero area
    #[error("degenerate polygon with {0} points")]
    DegeneratePolygon(usize),
    /// Segment endpoints coincide
    #[error("degenerate line segment")]
    DegenerateSegment,
    /// Motion profile parameters out of range
    #[error("invalid motion profile: {0}")]
    InvalidProfile(&'static str),
}

/// Errors that abort a step; the system state is untrustworthy afterwards
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    /// An act hook refused to continue
    #[error("entity '{entity}' failed to act: {reason}")]
    Act { entity: String, reason: String },
    /// A body's position or velocity stopped being finite
    #[error("entity '{entity}' has a non-finite position or velocity")]
    NonFinite { entity: String },
    /// A body was replaced by one of the other mass class mid-step
    #[error("entity '{entity}' no longer belongs in the {group} group")]
    Misplaced { entity: String, group: Group },
}
