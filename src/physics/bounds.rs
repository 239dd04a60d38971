//! Bounding volumes

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A bounding sphere around a group of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Sphere centered between the farthest-apart pair of points, grown to
    /// reach every point.
    ///
    /// O(n²); only run when a shape is built. Returns `None` for an empty
    /// slice.
    pub fn enclosing(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        let mut best = (first, first, 0.0);
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                let distance_squared = a.distance_squared(b);
                if distance_squared > best.2 {
                    best = (a, b, distance_squared);
                }
            }
        }
        let center = (best.0 + best.1) * 0.5;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0, f64::max);
        Some(Self::new(center, radius))
    }

    /// Check if two bounding spheres overlap (touching does not count)
    pub fn overlaps(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }

    #[inline]
    pub fn translate(&mut self, delta: DVec3) {
        self.center += delta;
    }
}
