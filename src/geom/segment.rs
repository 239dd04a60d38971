//! Oriented line segments
//!
//! A segment from `p1` to `p2` with a facing side. The unit normal is the
//! tangent turned a quarter turn toward `side` (+1 counter-clockwise, -1
//! clockwise). Only the faced half-plane collides.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::rotate_quarter;

/// Segment lengths below this are treated as degenerate
pub const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// A line segment with a cached tangent, normal and length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedSegment {
    pub p1: DVec3,
    pub p2: DVec3,
    side: i8,
    tangent: DVec3,
    normal: DVec3,
    length: f64,
}

impl OrientedSegment {
    /// Build a segment, returning `None` if the endpoints coincide
    pub fn new(p1: DVec3, p2: DVec3, side: i8) -> Option<Self> {
        let mut segment = Self {
            p1,
            p2,
            side: if side > 0 { 1 } else { -1 },
            tangent: DVec3::ZERO,
            normal: DVec3::ZERO,
            length: 0.0,
        };
        segment.reshape().then_some(segment)
    }

    /// Recompute tangent, normal and length from the endpoints.
    ///
    /// Needed only when the endpoints move relative to each other; a rigid
    /// translation keeps the cache valid. Returns false for a degenerate
    /// segment (cache left untouched).
    pub fn reshape(&mut self) -> bool {
        let delta = self.p2 - self.p1;
        let length = delta.length();
        if !(length > MIN_SEGMENT_LENGTH) {
            return false;
        }
        self.length = length;
        self.tangent = delta / length;
        self.normal = rotate_quarter(self.tangent, self.side);
        true
    }

    /// Translate both endpoints in place
    #[inline]
    pub fn translate(&mut self, delta: DVec3) {
        self.p1 += delta;
        self.p2 += delta;
    }

    /// Distance of `point` projected along the segment, measured from `p1`
    /// (0 at `p1`, `length` at `p2`, negative before `p1`)
    #[inline]
    pub fn projected_position(&self, point: DVec3) -> f64 {
        (point - self.p1).dot(self.tangent)
    }

    /// Signed distance from the infinite line, positive on the faced side
    #[inline]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.p1).dot(self.normal)
    }

    #[inline]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn midpoint(&self) -> DVec3 {
        (self.p1 + self.p2) * 0.5
    }
}
