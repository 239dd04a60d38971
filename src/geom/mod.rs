//! Geometry kernel
//!
//! Shapes and exact narrow-phase tests in the XY plane. Vectors are
//! `glam::DVec3` values; every operation here is pure unless its name says
//! otherwise (`translate`, `reshape`).

pub mod intersect;
pub mod segment;
pub mod sphere;

pub use intersect::{Contact, segment_sphere, sphere_sphere};
pub use segment::OrientedSegment;
pub use sphere::Sphere;
