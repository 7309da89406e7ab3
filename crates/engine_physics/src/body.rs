//! Rigid-body and surface-material components.

use engine_component::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Linear and angular motion state of one body.
///
/// Velocity and force are world-space, also for bodies with a parent: the
/// pipeline maps each step's displacement into the parent's space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Static bodies never move and have infinite mass.
    pub is_static: bool,
    /// Keeps angular velocity and force at zero.
    pub lock_rotation: bool,
    /// Force accumulated by scene code, applied every sub-step.
    pub force: Vec2,
    /// Torque accumulated by scene code, applied every sub-step.
    pub angular_force: f32,
    /// World units per second.
    pub velocity: Vec2,
    /// Radians per second, counter-clockwise.
    pub angular_velocity: f32,
    /// Zero or less is treated as immovable.
    pub mass: f32,
}

impl Rigidbody {
    /// A movable body of the given mass.
    #[must_use]
    pub fn dynamic(mass: f32) -> Self {
        Self {
            is_static: false,
            lock_rotation: false,
            force: Vec2::ZERO,
            angular_force: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass,
        }
    }

    /// An immovable body.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            is_static: true,
            mass: 0.0,
            ..Self::dynamic(0.0)
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_locked_rotation(mut self) -> Self {
        self.lock_rotation = true;
        self
    }

    /// `1 / mass`, or zero for static or massless bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse moment of inertia given the shape's inertia per unit mass.
    ///
    /// Zero when the body cannot rotate.
    #[must_use]
    pub fn inverse_inertia(&self, inertia_over_mass: f32) -> f32 {
        let inertia = self.mass * inertia_over_mass;
        if self.is_static || self.lock_rotation || inertia <= f32::EPSILON {
            0.0
        } else {
            1.0 / inertia
        }
    }
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self::dynamic(1.0)
    }
}

impl Component for Rigidbody {
    fn type_name() -> &'static str {
        "Rigidbody"
    }
}

/// Surface coefficients used by collision response and drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Bounciness, 0 (none) to 1 (elastic).
    pub restitution: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    /// Fraction of velocity lost per second.
    pub air_drag: f32,
}

impl Material {
    pub const WOOD: Self = Self {
        restitution: 0.2,
        static_friction: 0.5,
        dynamic_friction: 0.3,
        air_drag: 0.01,
    };

    pub const RUBBER: Self = Self {
        restitution: 0.8,
        static_friction: 0.9,
        dynamic_friction: 0.7,
        air_drag: 0.01,
    };

    pub const ICE: Self = Self {
        restitution: 0.05,
        static_friction: 0.05,
        dynamic_friction: 0.02,
        air_drag: 0.0,
    };

    pub const STONE: Self = Self {
        restitution: 0.1,
        static_friction: 0.7,
        dynamic_friction: 0.5,
        air_drag: 0.0,
    };
}

impl Default for Material {
    fn default() -> Self {
        Self::WOOD
    }
}

impl Component for Material {
    fn type_name() -> &'static str {
        "Material"
    }
}
