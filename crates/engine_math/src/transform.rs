//! 2D transform component.
//!
//! [`Transform2D`] holds position, rotation (radians), and non-uniform scale
//! relative to an optional parent entity, plus the cached local and global
//! matrices the physics pipeline rebuilds every sub-step.

use engine_component::{Component, Entity};
use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

/// A 2D transform with an optional parent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    /// Position relative to the parent (or the world for roots).
    pub position: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
    /// Per-axis scale factor.
    pub scale: Vec2,
    /// Parent entity, if this transform is attached to one.
    pub parent: Option<Entity>,
    /// Cached `position`/`rotation`/`scale` matrix.
    pub local: Affine2,
    /// Cached parent chain times `local`.
    pub global: Affine2,
}

impl Transform2D {
    /// The identity transform: origin, no rotation, unit scale, no parent.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
        parent: None,
        local: Affine2::IDENTITY,
        global: Affine2::IDENTITY,
    };

    /// Create a root transform at `position`, with matrices already cached.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
        .refreshed()
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self.refreshed()
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self.refreshed()
    }

    /// Attach to `parent`. `global` is left equal to `local` until the
    /// parent's matrix is combined in by [`Transform2D::apply_parent`].
    #[must_use]
    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The matrix for the current `position`, `rotation`, and `scale`.
    #[must_use]
    pub fn local_matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Recompute `local`, and `global` as if this were a root.
    pub fn refresh_local(&mut self) {
        self.local = self.local_matrix();
        self.global = self.local;
    }

    /// Set `global = parent_global * local`.
    pub fn apply_parent(&mut self, parent_global: &Affine2) {
        self.global = *parent_global * self.local;
    }

    #[must_use]
    fn refreshed(mut self) -> Self {
        self.refresh_local();
        self
    }

    /// World-space position taken from the cached global matrix.
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        self.global.translation
    }

    /// Move by `offset` in local space.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self.refreshed()
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform2D {
    fn type_name() -> &'static str {
        "Transform2D"
    }
}
