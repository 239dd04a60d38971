//! Impulse collision resolution
//!
//! Normal-only impulses (no friction, no spin) followed by a positional
//! correction that leaves the bodies just touching.
//!
//! Given the unit normal `n` from the first body toward the second:
//! - approach speed along `n` is `v1·n - v2·n`; only approaching pairs get
//!   an impulse, every pair gets de-penetrated
//! - restitution is the product of both coefficients, forced to 0 for slow
//!   (resting) contacts so stacks don't jitter
//! - the impulse `j = (v2n - v1n)(e + 1) / (1/m1 + 1/m2)` degenerates
//!   cleanly when one mass is infinite (inverse mass 0)
//! - de-penetration splits the overlap by `sqrt(mass)` so the heavier body
//!   moves less, or moves only the movable body when the other is immovable

use glam::DVec3;

use super::body::Body;
use crate::geom::Contact;

/// Impulse magnitude along the line of action.
///
/// Either inverse mass may be 0, not both.
#[inline]
pub fn impulse_magnitude(
    inverse_mass1: f64,
    normal_speed1: f64,
    inverse_mass2: f64,
    normal_speed2: f64,
    restitution: f64,
) -> f64 {
    (normal_speed2 - normal_speed1) * (restitution + 1.0) / (inverse_mass1 + inverse_mass2)
}

/// Restitution for a pair, zeroed when the contact counts as resting
#[inline]
pub fn effective_restitution(
    restitution1: f64,
    restitution2: f64,
    relative_normal_velocity: f64,
    resting_threshold: f64,
) -> f64 {
    let combined = restitution1 * restitution2;
    if relative_normal_velocity * combined < resting_threshold {
        0.0
    } else {
        combined
    }
}

/// A contact between two bodies, ready to resolve
#[derive(Debug)]
pub struct Collision<'a> {
    first: &'a mut Body,
    second: &'a mut Body,
    /// Unit normal from `first` toward `second`
    normal: DVec3,
    penetration: f64,
    normal_speed1: f64,
    normal_speed2: f64,
    restitution: f64,
}

impl<'a> Collision<'a> {
    pub fn new(
        first: &'a mut Body,
        second: &'a mut Body,
        contact: Contact,
        resting_threshold: f64,
    ) -> Self {
        let normal_speed1 = first.velocity.dot(contact.normal);
        let normal_speed2 = second.velocity.dot(contact.normal);
        let restitution = effective_restitution(
            first.restitution(),
            second.restitution(),
            normal_speed1 - normal_speed2,
            resting_threshold,
        );
        Self {
            first,
            second,
            normal: contact.normal,
            penetration: contact.penetration,
            normal_speed1,
            normal_speed2,
            restitution,
        }
    }

    /// Positive when the bodies close on each other along the normal
    pub fn relative_normal_velocity(&self) -> f64 {
        self.normal_speed1 - self.normal_speed2
    }

    pub fn is_approaching(&self) -> bool {
        self.relative_normal_velocity() >= 0.0
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    pub fn penetration(&self) -> f64 {
        self.penetration
    }

    /// Apply the impulse (if approaching) and separate the bodies
    pub fn resolve(mut self) {
        if self.is_approaching() {
            self.apply_impulses();
        }
        self.unembed();
    }

    fn apply_impulses(&mut self) {
        let inverse_mass1 = self.first.inverse_mass();
        let inverse_mass2 = self.second.inverse_mass();
        if inverse_mass1 + inverse_mass2 == 0.0 {
            return;
        }
        let impulse = impulse_magnitude(
            inverse_mass1,
            self.normal_speed1,
            inverse_mass2,
            self.normal_speed2,
            self.restitution,
        );
        if inverse_mass1 > 0.0 {
            self.first.apply_impulse(self.normal, impulse * inverse_mass1);
        }
        if inverse_mass2 > 0.0 {
            self.second.apply_impulse(self.normal, -impulse * inverse_mass2);
        }
    }

    /// Move the bodies apart along the normal until they just touch
    fn unembed(&mut self) {
        let first_fixed = self.first.is_static();
        let second_fixed = self.second.is_static();
        let correction = self.normal * self.penetration;

        match (first_fixed, second_fixed) {
            (true, true) => {}
            (true, false) => self.second.translate(correction),
            (false, true) => self.first.translate(-correction),
            (false, false) => {
                let share1 = separation_share(self.first.sqrt_mass(), self.second.sqrt_mass());
                self.first.translate(-correction * share1);
                self.second.translate(correction * (1.0 - share1));
            }
        }
    }
}

/// Fraction of the overlap the first body moves back by:
/// `sqrt(m2) / (sqrt(m1) + sqrt(m2))`, exactly half for equal masses
#[inline]
pub fn separation_share(sqrt_mass1: f64, sqrt_mass2: f64) -> f64 {
    if sqrt_mass1 == sqrt_mass2 {
        0.5
    } else {
        sqrt_mass2 / (sqrt_mass1 + sqrt_mass2)
    }
}
