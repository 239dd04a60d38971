//! Shape-pair dispatch
//!
//! Maps a pair of bodies to its narrow-phase test and resolves every contact
//! found. Normals always run from the first body to the second; pairs listed
//! the other way round are tested swapped and the contact flipped back.
//!
//! | first \ second | sphere | segment | polygon |
//! |---|---|---|---|
//! | sphere  | sphere_sphere | segment_sphere (flipped) | per edge (flipped) |
//! | segment | segment_sphere | - | - |
//! | polygon | per edge | - | - |

use super::body::Body;
use super::bounds::BoundingSphere;
use super::collision::Collision;
use super::shape::Shape;
use crate::geom::{Contact, OrientedSegment, Sphere, segment_sphere, sphere_sphere};

/// Which narrow-phase test applies to an ordered pair of shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    SphereSphere,
    SegmentSphere,
    SphereSegment,
    PolygonSphere,
    SpherePolygon,
    /// No narrow phase exists for this pair; it never collides
    Unsupported,
}

pub fn pairing(first: &Shape, second: &Shape) -> Pairing {
    match (first, second) {
        (Shape::Sphere(_), Shape::Sphere(_)) => Pairing::SphereSphere,
        (Shape::Segment(_), Shape::Sphere(_)) => Pairing::SegmentSphere,
        (Shape::Sphere(_), Shape::Segment(_)) => Pairing::SphereSegment,
        (Shape::Polygon(_), Shape::Sphere(_)) => Pairing::PolygonSphere,
        (Shape::Sphere(_), Shape::Polygon(_)) => Pairing::SpherePolygon,
        _ => Pairing::Unsupported,
    }
}

/// Test a pair and resolve each contact found; returns the contact count.
///
/// Polygon edges are tested one at a time against the sphere's current
/// position, so an edge sees the correction made for the previous one.
pub fn resolve_pair(first: &mut Body, second: &mut Body, resting_threshold: f64) -> usize {
    match pairing(first.shape(), second.shape()) {
        Pairing::SphereSphere => {
            let contact = sphere(first).zip(sphere(second)).and_then(|(a, b)| sphere_sphere(&a, &b));
            apply(first, second, contact, resting_threshold)
        }
        Pairing::SegmentSphere => {
            let contact = segment(first).zip(sphere(second)).and_then(|(s, b)| segment_sphere(&s, &b));
            apply(first, second, contact, resting_threshold)
        }
        Pairing::SphereSegment => {
            let contact = segment(second)
                .zip(sphere(first))
                .and_then(|(s, a)| segment_sphere(&s, &a))
                .map(Contact::flipped);
            apply(first, second, contact, resting_threshold)
        }
        Pairing::PolygonSphere => {
            if !bounds_overlap(first, second) {
                return 0;
            }
            let mut resolved = 0;
            for index in 0..edge_count(first) {
                let contact = edge(first, index)
                    .zip(sphere(second))
                    .and_then(|(e, b)| segment_sphere(&e, &b));
                resolved += apply(first, second, contact, resting_threshold);
            }
            resolved
        }
        Pairing::SpherePolygon => {
            if !bounds_overlap(second, first) {
                return 0;
            }
            let mut resolved = 0;
            for index in 0..edge_count(second) {
                let contact = edge(second, index)
                    .zip(sphere(first))
                    .and_then(|(e, a)| segment_sphere(&e, &a))
                    .map(Contact::flipped);
                resolved += apply(first, second, contact, resting_threshold);
            }
            resolved
        }
        Pairing::Unsupported => 0,
    }
}

fn apply(first: &mut Body, second: &mut Body, contact: Option<Contact>, resting_threshold: f64) -> usize {
    match contact {
        Some(contact) => {
            Collision::new(first, second, contact, resting_threshold).resolve();
            1
        }
        None => 0,
    }
}

/// Cheap reject before testing every polygon edge
fn bounds_overlap(polygon: &Body, sphere: &Body) -> bool {
    match (polygon.shape().as_polygon(), sphere.shape().as_sphere()) {
        (Some(polygon), Some(sphere)) => polygon
            .bounds()
            .overlaps(&BoundingSphere::new(sphere.center, sphere.radius)),
        _ => false,
    }
}

fn sphere(body: &Body) -> Option<Sphere> {
    body.shape().as_sphere().copied()
}

fn segment(body: &Body) -> Option<OrientedSegment> {
    body.shape().as_segment().copied()
}

fn edge(body: &Body, index: usize) -> Option<OrientedSegment> {
    body.shape()
        .as_polygon()
        .and_then(|polygon| polygon.edges().get(index).copied())
}

fn edge_count(body: &Body) -> usize {
    body.shape().as_polygon().map_or(0, |polygon| polygon.edges().len())
}
