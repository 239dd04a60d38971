//! Narrow-phase intersection tests
//!
//! Each test reports the unit normal pointing from the first shape toward
//! the second and the overlap depth along it, or `None` when the shapes are
//! apart (touching counts as apart).

use glam::DVec3;

use super::segment::OrientedSegment;
use super::sphere::Sphere;

/// Normal used when two sphere centers coincide exactly
const COINCIDENT_NORMAL: DVec3 = DVec3::Y;

/// Result of a successful intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal from the first shape toward the second
    pub normal: DVec3,
    /// Overlap depth along `normal` (always > 0)
    pub penetration: f64,
}

impl Contact {
    /// The same contact seen from the other shape
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            penetration: self.penetration,
        }
    }
}

/// Sphere against sphere
pub fn sphere_sphere(a: &Sphere, b: &Sphere) -> Option<Contact> {
    let diff = b.center - a.center;
    let distance = diff.length();
    let penetration = a.radius + b.radius - distance;
    if penetration <= 0.0 {
        return None;
    }
    let normal = if distance > 0.0 {
        diff / distance
    } else {
        COINCIDENT_NORMAL
    };
    Some(Contact {
        normal,
        penetration,
    })
}

/// Oriented segment against sphere (2D, z ignored)
///
/// Only a sphere whose center is on the faced side of the segment's line can
/// collide. Past either end the contact is against the endpoint, with the
/// normal running from the endpoint to the sphere center.
pub fn segment_sphere(segment: &OrientedSegment, sphere: &Sphere) -> Option<Contact> {
    let center_distance = segment.signed_distance(sphere.center);
    if center_distance < 0.0 {
        return None;
    }

    let line_penetration = sphere.radius - center_distance;
    if line_penetration <= 0.0 {
        return None;
    }

    let along = segment.projected_position(sphere.center);
    if along <= -sphere.radius || along >= segment.length() + sphere.radius {
        return None;
    }

    if along < 0.0 {
        endpoint_sphere(segment.p1, sphere)
    } else if along > segment.length() {
        endpoint_sphere(segment.p2, sphere)
    } else {
        Some(Contact {
            normal: segment.normal(),
            penetration: line_penetration,
        })
    }
}

/// Contact between a segment endpoint and a sphere
fn endpoint_sphere(endpoint: DVec3, sphere: &Sphere) -> Option<Contact> {
    let offset = sphere.center - endpoint;
    let distance = offset.length();
    let penetration = sphere.radius - distance;
    if penetration <= 0.0 || distance == 0.0 {
        return None;
    }
    Some(Contact {
        normal: offset / distance,
        penetration,
    })
}
