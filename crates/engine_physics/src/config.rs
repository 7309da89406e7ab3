//! Pipeline configuration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// How two bodies' material coefficients combine into one per contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    Minimum,
    Maximum,
    #[default]
    Average,
}

impl CombineMode {
    /// Combine `a` and `b`. Symmetric in its arguments.
    #[must_use]
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Minimum => a.min(b),
            Self::Maximum => a.max(b),
            Self::Average => (a + b) * 0.5,
        }
    }
}

/// Tunables for [`PhysicsPipeline`](crate::PhysicsPipeline).
///
/// Every field has a default, so a JSON file only needs to name the fields it
/// overrides:
///
/// ```json
/// { "substeps": 4, "gravity": [0.0, -20.0], "restitution_combine": "maximum" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed sub-steps per frame; each one advances `dt / substeps`.
    pub substeps: u32,
    /// Acceleration applied to every dynamic body.
    pub gravity: Vec2,
    /// How two materials' restitution values are merged for a contact.
    pub restitution_combine: CombineMode,
    /// Same for static and dynamic friction.
    pub friction_combine: CombineMode,
    /// Fraction of the penetration depth removed per contact, in `(0, 1]`.
    pub position_correction: f32,
    /// Minimum candidate pairs before narrow phase goes to the thread pool.
    pub parallel_threshold: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            substeps: 8,
            gravity: Vec2::new(0.0, -9.81),
            restitution_combine: CombineMode::Average,
            friction_combine: CombineMode::Average,
            position_correction: 0.8,
            parallel_threshold: 64,
        }
    }
}

impl PhysicsConfig {
    #[must_use]
    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_restitution_combine(mut self, mode: CombineMode) -> Self {
        self.restitution_combine = mode;
        self
    }

    #[must_use]
    pub fn with_friction_combine(mut self, mode: CombineMode) -> Self {
        self.friction_combine = mode;
        self
    }

    #[must_use]
    pub fn with_position_correction(mut self, factor: f32) -> Self {
        self.position_correction = factor;
        self
    }

    #[must_use]
    pub fn with_parallel_threshold(mut self, pairs: usize) -> Self {
        self.parallel_threshold = pairs;
        self
    }

    /// Check the ranges of every field.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "substeps must be at least 1".into(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.position_correction > 0.0 && self.position_correction <= 1.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "position_correction must be in (0, 1], got {}",
                self.position_correction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PhysicsConfig::default();
        assert_eq!(config.substeps, 8);
        assert_eq!(config.gravity, Vec2::new(0.0, -9.81));
        assert_eq!(config.restitution_combine, CombineMode::Average);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_combine_modes() {
        assert_eq!(CombineMode::Minimum.combine(0.2, 0.8), 0.2);
        assert_eq!(CombineMode::Maximum.combine(0.2, 0.8), 0.8);
        assert!((CombineMode::Average.combine(0.2, 0.8) - 0.5).abs() < 1e-6);
        assert_eq!(
            CombineMode::Minimum.combine(0.8, 0.2),
            CombineMode::Minimum.combine(0.2, 0.8)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            PhysicsConfig::default().with_substeps(0).validate(),
            Err(PhysicsError::InvalidConfig(_))
        ));
        assert!(
            PhysicsConfig::default()
                .with_position_correction(1.5)
                .validate()
                .is_err()
        );
        assert!(
            PhysicsConfig::default()
                .with_position_correction(0.0)
                .validate()
                .is_err()
        );
        assert!(
            PhysicsConfig::default()
                .with_gravity(Vec2::new(f32::NAN, 0.0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{ "substeps": 4, "gravity": [0.0, -20.0], "restitution_combine": "maximum" }"#;
        let config: PhysicsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.substeps, 4);
        assert_eq!(config.gravity, Vec2::new(0.0, -20.0));
        assert_eq!(config.restitution_combine, CombineMode::Maximum);
        assert_eq!(config.friction_combine, CombineMode::Average);
        assert_eq!(config.parallel_threshold, 64);
    }
}
