//! Step sizing and throttling
//!
//! A run is either a fixed number of equal steps or an open-ended walk that
//! sizes each step from the wall-clock time since the previous one. Either
//! way a throttle can hold simulated time back so it never runs ahead of a
//! real-time ratio.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_STEP, DEFAULT_MIN_STEP, DEFAULT_STEP};

/// Limit on how fast simulated time may advance relative to real time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Throttle {
    /// Step as fast as possible
    #[default]
    Unthrottled,
    /// At most `sim_per_real` simulated seconds per real second; infinity
    /// disables the limit
    MaxSimRate { sim_per_real: f64 },
    /// At least `real_per_sim` real seconds per simulated second; 0 disables
    /// the limit
    MinRealPerSim { real_per_sim: f64 },
}

impl Throttle {
    /// Minimum real seconds per simulated second, if any limit applies
    pub fn real_per_sim(&self) -> Option<f64> {
        match *self {
            Throttle::MaxSimRate { sim_per_real } if sim_per_real.is_finite() && sim_per_real > 0.0 => {
                Some(1.0 / sim_per_real)
            }
            Throttle::MinRealPerSim { real_per_sim } if real_per_sim.is_finite() && real_per_sim > 0.0 => {
                Some(real_per_sim)
            }
            _ => None,
        }
    }

    /// Time left to wait before `sim_elapsed` is allowed, given how much real
    /// time has already passed. `None` when no wait is needed.
    pub fn delay(&self, sim_elapsed: f64, real_elapsed: Duration) -> Option<Duration> {
        let ratio = self.real_per_sim()?;
        let remaining = sim_elapsed * ratio - real_elapsed.as_secs_f64();
        if remaining > 0.0 {
            Duration::try_from_secs_f64(remaining).ok()
        } else {
            None
        }
    }
}

/// How the runner sizes and schedules steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pacing {
    /// `steps` steps of `step` simulated seconds each
    FixedStep {
        step: f64,
        steps: u64,
        #[serde(default)]
        throttle: Throttle,
    },
    /// Each step covers `sim_per_real` times the real time since the last
    /// one, clamped to `[min_step, max_step]`. Runs until stopped unless
    /// `step_limit` is set.
    RealTime {
        min_step: f64,
        max_step: f64,
        sim_per_real: f64,
        #[serde(default)]
        step_limit: Option<u64>,
    },
}

impl Default for Pacing {
    fn default() -> Self {
        Self::real_time(1.0)
    }
}

impl Pacing {
    pub fn fixed(step: f64, steps: u64) -> Self {
        Pacing::FixedStep {
            step,
            steps,
            throttle: Throttle::Unthrottled,
        }
    }

    /// Cover `total_sim_time` in `steps` equal steps
    pub fn fixed_total(total_sim_time: f64, steps: u64, throttle: Throttle) -> Self {
        let step = if steps == 0 {
            DEFAULT_STEP
        } else {
            total_sim_time / steps as f64
        };
        Pacing::FixedStep {
            step,
            steps,
            throttle,
        }
    }

    /// Open-ended real-time tracking with the default step band
    pub fn real_time(sim_per_real: f64) -> Self {
        Pacing::RealTime {
            min_step: DEFAULT_MIN_STEP,
            max_step: DEFAULT_MAX_STEP,
            sim_per_real,
            step_limit: None,
        }
    }

    pub fn with_throttle(self, throttle: Throttle) -> Self {
        match self {
            Pacing::FixedStep { step, steps, .. } => Pacing::FixedStep {
                step,
                steps,
                throttle,
            },
            real_time => real_time,
        }
    }

    pub fn with_step_limit(self, limit: u64) -> Self {
        match self {
            Pacing::RealTime {
                min_step,
                max_step,
                sim_per_real,
                ..
            } => Pacing::RealTime {
                min_step,
                max_step,
                sim_per_real,
                step_limit: Some(limit),
            },
            Pacing::FixedStep { step, throttle, .. } => Pacing::FixedStep {
                step,
                steps: limit,
                throttle,
            },
        }
    }

    /// Number of steps after which the run completes on its own
    pub fn step_limit(&self) -> Option<u64> {
        match *self {
            Pacing::FixedStep { steps, .. } => Some(steps),
            Pacing::RealTime { step_limit, .. } => step_limit,
        }
    }

    /// Throttle applied after every step; real-time runs never get ahead of
    /// their own ratio
    pub fn throttle(&self) -> Throttle {
        match *self {
            Pacing::FixedStep { throttle, .. } => throttle,
            Pacing::RealTime { sim_per_real, .. } => Throttle::MaxSimRate { sim_per_real },
        }
    }

    /// Size of the next step, given the real time since the previous one
    pub fn next_step(&self, since_last: Duration) -> f64 {
        match *self {
            Pacing::FixedStep { step, .. } => step,
            Pacing::RealTime {
                min_step,
                max_step,
                sim_per_real,
                ..
            } => clamp_step(sim_per_real * since_last.as_secs_f64(), min_step, max_step),
        }
    }

    /// Reject parameters that cannot drive a run
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Pacing::FixedStep { step, throttle, .. } => {
                if !(step.is_finite() && step > 0.0) {
                    return Err(format!("fixed step must be finite and > 0, got {step}"));
                }
                validate_throttle(&throttle)
            }
            Pacing::RealTime {
                min_step,
                max_step,
                sim_per_real,
                ..
            } => {
                if !(min_step.is_finite() && min_step > 0.0) {
                    return Err(format!("min_step must be finite and > 0, got {min_step}"));
                }
                if !(max_step.is_finite() && max_step >= min_step) {
                    return Err(format!("max_step ({max_step}) must be finite and >= min_step ({min_step})"));
                }
                if !(sim_per_real.is_finite() && sim_per_real > 0.0) {
                    return Err(format!("sim_per_real must be finite and > 0, got {sim_per_real}"));
                }
                Ok(())
            }
        }
    }
}

fn validate_throttle(throttle: &Throttle) -> Result<(), String> {
    match *throttle {
        Throttle::MaxSimRate { sim_per_real } if !(sim_per_real > 0.0) => {
            Err(format!("throttle sim_per_real must be > 0, got {sim_per_real}"))
        }
        Throttle::MinRealPerSim { real_per_sim } if !(real_per_sim >= 0.0 && real_per_sim.is_finite()) => {
            Err(format!("throttle real_per_sim must be finite and >= 0, got {real_per_sim}"))
        }
        _ => Ok(()),
    }
}

/// Clamp a measured step into the band; NaN falls to the minimum
#[inline]
pub fn clamp_step(raw: f64, min_step: f64, max_step: f64) -> f64 {
    if raw.is_nan() {
        min_step
    } else {
        raw.clamp(min_step, max_step)
    }
}
