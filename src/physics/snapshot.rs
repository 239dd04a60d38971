//! Render copies
//!
//! Plain owned data that shares nothing with the live system, so a snapshot
//! can cross threads and outlive the step that produced it.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::bounds::BoundingSphere;

/// Geometry of one entity at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeSnapshot {
    Sphere { center: DVec3, radius: f64 },
    Segment { p1: DVec3, p2: DVec3, normal: DVec3 },
    Polygon { points: Vec<DVec3>, bounds: BoundingSphere },
    /// A field entity with no geometry (e.g. gravity)
    Field { acceleration: DVec3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub is_static: bool,
    pub velocity: DVec3,
    pub shape: ShapeSnapshot,
}

impl EntitySnapshot {
    /// Sphere center, segment midpoint or polygon vertex mean
    pub fn position(&self) -> Option<DVec3> {
        match &self.shape {
            ShapeSnapshot::Sphere { center, .. } => Some(*center),
            ShapeSnapshot::Segment { p1, p2, .. } => Some((*p1 + *p2) * 0.5),
            ShapeSnapshot::Polygon { points, .. } if !points.is_empty() => {
                Some(points.iter().copied().sum::<DVec3>() / points.len() as f64)
            }
            _ => None,
        }
    }
}

/// Whole-system copy taken between two steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated seconds elapsed when the copy was taken
    pub sim_time: f64,
    pub steps: u64,
    /// Free entities, then statics, then dynamics, each in insertion order
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// First entity with the given name
    pub fn find(&self, name: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(name: &str, y: f64) -> EntitySnapshot {
        EntitySnapshot {
            name: name.to_string(),
            is_static: false,
            velocity: DVec3::ZERO,
            shape: ShapeSnapshot::Sphere {
                center: DVec3::new(0.0, y, 0.0),
                radius: 1.0,
            },
        }
    }

    #[test]
    fn test_find_by_name() {
        let snapshot = Snapshot {
            sim_time: 1.0,
            steps: 10,
            entities: vec![ball("a", 1.0), ball("b", 2.0)],
        };
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find("b").and_then(|e| e.position()), Some(DVec3::new(0.0, 2.0, 0.0)));
        assert!(snapshot.find("c").is_none());
    }

    #[test]
    fn test_json_shape_tag() {
        let snapshot = Snapshot {
            sim_time: 0.5,
            steps: 3,
            entities: vec![ball("a", 1.0)],
        };
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"kind\": \"sphere\""));

        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_field_has_no_position() {
        let field = EntitySnapshot {
            name: "gravity".into(),
            is_static: false,
            velocity: DVec3::ZERO,
            shape: ShapeSnapshot::Field {
                acceleration: DVec3::new(0.0, -9.8, 0.0),
            },
        };
        assert_eq!(field.position(), None);
    }
}
