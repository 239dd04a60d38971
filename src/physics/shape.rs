//! Closed set of collidable shapes

use glam::DVec3;

use super::polygon::Polygon;
use crate::geom::{OrientedSegment, Sphere};

/// Shape carried by a physical body
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Segment(OrientedSegment),
    Polygon(Polygon),
}

impl Shape {
    /// Rigidly translate the shape in place
    pub fn translate(&mut self, delta: DVec3) {
        match self {
            Shape::Sphere(sphere) => sphere.translate(delta),
            Shape::Segment(segment) => segment.translate(delta),
            Shape::Polygon(polygon) => polygon.translate(delta),
        }
    }

    /// Reference point that moves with the shape
    pub fn anchor(&self) -> DVec3 {
        match self {
            Shape::Sphere(sphere) => sphere.center,
            Shape::Segment(segment) => segment.midpoint(),
            Shape::Polygon(polygon) => polygon.centroid(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere(_) => "sphere",
            Shape::Segment(_) => "segment",
            Shape::Polygon(_) => "polygon",
        }
    }

    /// Check that every coordinate is finite
    pub fn is_finite(&self) -> bool {
        match self {
            Shape::Sphere(sphere) => sphere.center.is_finite(),
            Shape::Segment(segment) => segment.p1.is_finite() && segment.p2.is_finite(),
            Shape::Polygon(polygon) => crate::all_finite(polygon.points()),
        }
    }

    pub fn as_sphere(&self) -> Option<&Sphere> {
        match self {
            Shape::Sphere(sphere) => Some(sphere),
            _ => None,
        }
    }

    pub fn as_segment(&self) -> Option<&OrientedSegment> {
        match self {
            Shape::Segment(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Shape::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }
}
