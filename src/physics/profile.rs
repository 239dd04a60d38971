//! Trapezoidal motion profiles
//!
//! Position along one axis for a move that accelerates to a capped speed,
//! cruises, then decelerates to rest exactly at the end point. Short moves
//! never reach the cap and follow a triangular speed curve instead.
//! Infinite acceleration or deceleration is allowed and means an instant
//! speed change.

use super::PhysicsError;

/// Position-over-time curve for a single-axis move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    start: f64,
    end: f64,
    max_velocity: f64,
    acceleration: f64,
    deceleration: f64,
    /// +1, -1, or 0 for a zero-length move
    direction: f64,
    total_distance: f64,
    peak_velocity: f64,
    acceleration_time: f64,
    acceleration_distance: f64,
    cruise_time: f64,
    cruise_distance: f64,
    deceleration_time: f64,
    deceleration_distance: f64,
}

impl MotionProfile {
    /// Profile with equal acceleration and deceleration
    pub fn symmetric(
        start: f64,
        end: f64,
        max_velocity: f64,
        acceleration: f64,
    ) -> Result<Self, PhysicsError> {
        Self::new(start, end, max_velocity, acceleration, acceleration)
    }

    pub fn new(
        start: f64,
        end: f64,
        max_velocity: f64,
        acceleration: f64,
        deceleration: f64,
    ) -> Result<Self, PhysicsError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PhysicsError::InvalidProfile("endpoints must be finite"));
        }
        if !(max_velocity > 0.0) || !max_velocity.is_finite() {
            return Err(PhysicsError::InvalidProfile("max velocity must be finite and > 0"));
        }
        if !(acceleration > 0.0) || !(deceleration > 0.0) {
            return Err(PhysicsError::InvalidProfile("acceleration and deceleration must be > 0"));
        }

        let total_distance = (end - start).abs();
        let direction = if end > start {
            1.0
        } else if end < start {
            -1.0
        } else {
            0.0
        };

        let (mut acceleration_time, mut acceleration_distance) = if acceleration.is_finite() {
            let t = max_velocity / acceleration;
            (t, acceleration * t * t / 2.0)
        } else {
            (0.0, 0.0)
        };
        let (mut deceleration_time, mut deceleration_distance) = if deceleration.is_finite() {
            let t = max_velocity / deceleration;
            (t, max_velocity * t - deceleration * t * t / 2.0)
        } else {
            (0.0, 0.0)
        };

        let (peak_velocity, cruise_time, cruise_distance);
        if acceleration_distance + deceleration_distance > total_distance {
            // Triangular: start braking before the cap is reached.
            // v²/2a + v²/2d = distance, with 1/∞ = 0
            let peak = (2.0 * total_distance / (1.0 / acceleration + 1.0 / deceleration)).sqrt();
            acceleration_time = peak / acceleration;
            acceleration_distance = peak * peak / (2.0 * acceleration);
            deceleration_time = peak / deceleration;
            deceleration_distance = total_distance - acceleration_distance;
            peak_velocity = peak;
            cruise_time = 0.0;
            cruise_distance = 0.0;
        } else {
            peak_velocity = max_velocity;
            cruise_distance = total_distance - acceleration_distance - deceleration_distance;
            cruise_time = cruise_distance / max_velocity;
        }

        Ok(Self {
            start,
            end,
            max_velocity,
            acceleration,
            deceleration,
            direction,
            total_distance,
            peak_velocity,
            acceleration_time,
            acceleration_distance,
            cruise_time,
            cruise_distance,
            deceleration_time,
            deceleration_distance,
        })
    }

    /// Position at `time` (clamped to `start` before 0 and `end` once done)
    pub fn position_at(&self, time: f64) -> f64 {
        let cruise_start = self.acceleration_time;
        let braking_start = cruise_start + self.cruise_time;

        if time <= 0.0 {
            self.start
        } else if time <= cruise_start {
            self.start + self.direction * (0.5 * self.acceleration * time * time)
        } else if time <= braking_start {
            self.start
                + self.direction
                    * (self.acceleration_distance + (time - cruise_start) * self.max_velocity)
        } else if time <= self.total_time() {
            let t = time - braking_start;
            self.start
                + self.direction
                    * (self.acceleration_distance
                        + self.cruise_distance
                        + self.peak_velocity * t
                        - 0.5 * self.deceleration * t * t)
        } else {
            self.end
        }
    }

    /// Check if the move is complete by `time`
    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.total_time()
    }

    pub fn total_time(&self) -> f64 {
        self.acceleration_time + self.cruise_time + self.deceleration_time
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Highest speed reached (the cap, unless the move is too short)
    pub fn peak_velocity(&self) -> f64 {
        self.peak_velocity
    }

    pub fn acceleration_time(&self) -> f64 {
        self.acceleration_time
    }

    pub fn acceleration_distance(&self) -> f64 {
        self.acceleration_distance
    }

    pub fn cruise_time(&self) -> f64 {
        self.cruise_time
    }

    pub fn cruise_distance(&self) -> f64 {
        self.cruise_distance
    }

    pub fn deceleration_time(&self) -> f64 {
        self.deceleration_time
    }

    pub fn deceleration_distance(&self) -> f64 {
        self.deceleration_distance
    }
}
