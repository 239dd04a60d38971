//! Engine settings
//!
//! Loaded from JSON; every field has a default so a partial file works.

use std::fs;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_CAPACITY, MAX_CAPACITY, RESTING_THRESHOLD};
use crate::runner::Pacing;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid settings JSON
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// Parsed, but the values cannot drive a simulation
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Physics and pacing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Physics ===
    /// Maximum entities per group (free, static, dynamic)
    pub capacity: usize,
    /// Contacts closing slower than this (scaled by restitution) are made
    /// fully inelastic
    pub resting_threshold: f64,
    /// Adds a directional gravity field when set
    pub gravity: Option<DVec3>,

    // === Runner ===
    pub pacing: Pacing,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resting_threshold: RESTING_THRESHOLD,
            gravity: None,

            // Track the wall clock 1:1 until stopped
            pacing: Pacing::default(),
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.capacity == 0 {
            return Err(SettingsError::Invalid("capacity must be at least 1".into()));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(SettingsError::Invalid(format!(
                "capacity must be at most {MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }
        if !(self.resting_threshold >= 0.0 && self.resting_threshold.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "resting_threshold must be finite and >= 0, got {}",
                self.resting_threshold
            )));
        }
        if self.gravity.is_some_and(|g| !g.is_finite()) {
            return Err(SettingsError::Invalid("gravity must be finite".into()));
        }
        self.pacing.validate().map_err(SettingsError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsSystem;
    use crate::runner::Throttle;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.capacity, 1000);
        assert_eq!(settings.resting_threshold, 5.0);
        assert!(settings.gravity.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let settings = EngineSettings::from_json(r#"{"capacity": 50, "gravity": [0.0, -9.81, 0.0]}"#).unwrap();
        assert_eq!(settings.capacity, 50);
        assert_eq!(settings.gravity, Some(DVec3::new(0.0, -9.81, 0.0)));
        assert_eq!(settings.pacing, Pacing::default());
    }

    #[test]
    fn test_pacing_section() {
        let json = r#"{
            "pacing": {
                "mode": "fixed_step",
                "step": 0.005,
                "steps": 400,
                "throttle": { "kind": "max_sim_rate", "sim_per_real": 2.0 }
            }
        }"#;
        let settings = EngineSettings::from_json(json).unwrap();
        assert_eq!(
            settings.pacing,
            Pacing::fixed(0.005, 400).with_throttle(Throttle::MaxSimRate { sim_per_real: 2.0 })
        );
    }

    #[test]
    fn test_json_round_trip() {
        let settings = EngineSettings {
            gravity: Some(DVec3::new(0.0, -1.0, 0.0)),
            pacing: Pacing::fixed(0.01, 10),
            ..EngineSettings::default()
        };
        let json = settings.to_json().unwrap();
        assert_eq!(EngineSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineSettings::from_json(r#"{"capacity": 0}"#),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            EngineSettings::from_json(r#"{"resting_threshold": -1.0}"#),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            EngineSettings::from_json(
                r#"{"pacing": {"mode": "real_time", "min_step": 0.1, "max_step": 0.01, "sim_per_real": 1.0}}"#
            ),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            EngineSettings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_huge_capacity_rejected() {
        let json = format!(r#"{{"capacity": {}}}"#, usize::MAX);
        assert!(matches!(
            EngineSettings::from_json(&json),
            Err(SettingsError::Invalid(_))
        ));

        let at_limit = format!(r#"{{"capacity": {MAX_CAPACITY}}}"#);
        let settings = EngineSettings::from_json(&at_limit).unwrap();
        let system = PhysicsSystem::from_settings(&settings).unwrap();
        assert_eq!(system.capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineSettings::load("/definitely/not/here/settings.json");
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }
}
