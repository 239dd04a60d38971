//! Polygon shapes
//!
//! Edges are derived once at construction, one per vertex including the
//! wrap-around edge, with normals facing out of the polygon whichever way
//! the points wind. Polygons only ever translate rigidly, so the edge cache
//! and bounding sphere are moved, never rebuilt.

use glam::DVec3;

use super::PhysicsError;
use super::bounds::BoundingSphere;
use crate::geom::OrientedSegment;

/// A closed polygon in the XY plane
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<DVec3>,
    edges: Vec<OrientedSegment>,
    bounds: BoundingSphere,
}

impl Polygon {
    pub fn new(points: &[DVec3]) -> Result<Self, PhysicsError> {
        let n = points.len();
        if n < 3 {
            return Err(PhysicsError::DegeneratePolygon(n));
        }

        let area = signed_area(points);
        if !(area.abs() > f64::EPSILON) {
            return Err(PhysicsError::DegeneratePolygon(n));
        }
        // Counter-clockwise winding: outward is a clockwise turn of the tangent
        let side = if area > 0.0 { -1 } else { 1 };

        let edges = (0..n)
            .map(|i| OrientedSegment::new(points[i], points[(i + 1) % n], side))
            .collect::<Option<Vec<_>>>()
            .ok_or(PhysicsError::DegeneratePolygon(n))?;

        let bounds = BoundingSphere::enclosing(points).ok_or(PhysicsError::DegeneratePolygon(n))?;

        Ok(Self {
            points: points.to_vec(),
            edges,
            bounds,
        })
    }

    /// Axis-aligned rectangle centered on `center`
    pub fn rectangle(center: DVec3, width: f64, height: f64) -> Result<Self, PhysicsError> {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(&[
            center + DVec3::new(-hw, -hh, 0.0),
            center + DVec3::new(hw, -hh, 0.0),
            center + DVec3::new(hw, hh, 0.0),
            center + DVec3::new(-hw, hh, 0.0),
        ])
    }

    /// Move every point, edge and the bounding sphere in place
    pub fn translate(&mut self, delta: DVec3) {
        for point in &mut self.points {
            *point += delta;
        }
        for edge in &mut self.edges {
            edge.translate(delta);
        }
        self.bounds.translate(delta);
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn edges(&self) -> &[OrientedSegment] {
        &self.edges
    }

    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    /// Mean of the vertices
    pub fn centroid(&self) -> DVec3 {
        self.points.iter().copied().sum::<DVec3>() / self.points.len() as f64
    }
}

/// Shoelace area in the XY plane, positive for counter-clockwise winding
fn signed_area(points: &[DVec3]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}
