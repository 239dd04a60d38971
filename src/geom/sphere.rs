//! Sphere (circle in the XY plane)

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A sphere given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Move the center in place
    #[inline]
    pub fn translate(&mut self, delta: DVec3) {
        self.center += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        let mut sphere = Sphere::new(DVec3::new(1.0, 2.0, 0.0), 3.0);
        sphere.translate(DVec3::new(-1.0, 1.0, 0.0));
        assert_eq!(sphere.center, DVec3::new(0.0, 3.0, 0.0));
        assert_eq!(sphere.radius, 3.0);
    }
}
