//! Collider component and the shape-assignment system.
//!
//! A collider keeps three forms of its shape:
//!
//! - the model-space **outline** it was built from,
//! - the model-space **convex decomposition**, computed once per
//!   [`ColliderSystem::assign_shape`] and shared between clones,
//! - the **world-space pieces**, overwritten from the decomposition whenever
//!   the owning transform changes. The outline is never re-decomposed.

use std::sync::Arc;

use engine_component::{Component, Entity, Table};
use engine_math::{Aabb, Affine2, ConvexPolygon, GeometryError, Transform2D, Vec2, convex_decompose};
use tracing::debug;

use crate::error::PhysicsError;
use crate::filter::CollisionFilter;

/// Collision shape of one entity.
#[derive(Debug, Clone)]
pub struct Collider {
    outline: Vec<Vec2>,
    pieces: Arc<[ConvexPolygon]>,
    inertia_over_mass: f32,
    /// Tag/mask filter for this shape.
    pub filter: CollisionFilter,
    world_pieces: Vec<ConvexPolygon>,
    world_aabb: Aabb,
}

impl Collider {
    /// Decompose a simple polygon outline into a collider.
    ///
    /// # Errors
    ///
    /// Propagates [`GeometryError`] for outlines that are not simple polygons.
    pub fn from_outline(outline: &[Vec2]) -> Result<Self, GeometryError> {
        let pieces = convex_decompose(outline)?;
        Ok(Self::from_pieces(outline.to_vec(), pieces))
    }

    /// An axis-aligned box centred on the model origin.
    #[must_use]
    pub fn rectangle(half_extents: Vec2) -> Self {
        let piece = ConvexPolygon::rectangle(half_extents);
        Self::from_pieces(piece.vertices().to_vec(), vec![piece])
    }

    fn from_pieces(outline: Vec<Vec2>, pieces: Vec<ConvexPolygon>) -> Self {
        let area: f32 = pieces.iter().map(ConvexPolygon::area).sum();
        let inertia: f32 = pieces.iter().map(ConvexPolygon::inertia_about_origin).sum();
        let inertia_over_mass = if area > f32::EPSILON {
            inertia / area
        } else {
            0.0
        };
        let world_aabb = pieces
            .iter()
            .fold(Aabb::EMPTY, |acc, piece| acc.union(&piece.aabb()));
        Self {
            outline,
            world_pieces: pieces.clone(),
            pieces: pieces.into(),
            inertia_over_mass,
            filter: CollisionFilter::default(),
            world_aabb,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn outline(&self) -> &[Vec2] {
        &self.outline
    }

    /// Model-space convex pieces.
    #[must_use]
    pub fn pieces(&self) -> &[ConvexPolygon] {
        &self.pieces
    }

    /// World-space convex pieces as of the last [`Collider::update_world`].
    #[must_use]
    pub fn world_pieces(&self) -> &[ConvexPolygon] {
        &self.world_pieces
    }

    #[must_use]
    pub fn world_aabb(&self) -> Aabb {
        self.world_aabb
    }

    /// Rotational inertia per unit mass about the model origin.
    #[must_use]
    pub fn inertia_over_mass(&self) -> f32 {
        self.inertia_over_mass
    }

    /// Returns `true` if a shape has been assigned.
    #[must_use]
    pub fn has_shape(&self) -> bool {
        !self.pieces.is_empty()
    }

    /// Re-derive the world pieces and bounds from the model pieces.
    pub fn update_world(&mut self, global: &Affine2) {
        self.world_pieces
            .resize_with(self.pieces.len(), ConvexPolygon::default);
        let mut aabb = Aabb::EMPTY;
        for (model, world) in self.pieces.iter().zip(&mut self.world_pieces) {
            model.transform_into(global, world);
            aabb = aabb.union(&world.aabb());
        }
        self.world_aabb = aabb;
    }

    /// Take `other`'s world pieces if both share the same decomposition.
    pub(crate) fn copy_world_from(&mut self, other: &Collider) {
        if Arc::ptr_eq(&self.pieces, &other.pieces) {
            self.world_pieces.clone_from(&other.world_pieces);
            self.world_aabb = other.world_aabb;
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::from_pieces(Vec::new(), Vec::new())
    }
}

impl Component for Collider {
    fn type_name() -> &'static str {
        "Collider"
    }
}

/// Operations over a table of [`Collider`]s.
pub struct ColliderSystem;

impl ColliderSystem {
    /// Decompose `outline` and store it as `entity`'s shape.
    ///
    /// An existing collider is replaced but keeps its filter; otherwise a row
    /// is pushed, which requires `table`'s schema to be exactly `(Collider,)`.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::Geometry`] for invalid outlines (the table is left
    /// unchanged), or [`PhysicsError::Storage`] if the row cannot be pushed.
    pub fn assign_shape(
        table: &mut Table,
        entity: Entity,
        outline: &[Vec2],
    ) -> Result<(), PhysicsError> {
        let mut collider = Collider::from_outline(outline)?;
        let pieces = collider.pieces().len();
        if let Some(existing) = table.get_mut::<Collider>(entity) {
            collider.filter = std::mem::take(&mut existing.filter);
            *existing = collider;
        } else {
            table.push_back(entity, (collider,))?;
        }
        debug!(%entity, vertices = outline.len(), pieces, "collider shape assigned");
        Ok(())
    }

    /// Refresh the world pieces of every collider whose entity has a
    /// transform. Returns the number of colliders updated.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::Storage`] if `colliders` has no `Collider` column.
    pub fn update_world_shapes(
        transforms: &Table,
        colliders: &mut Table,
    ) -> Result<usize, PhysicsError> {
        let mut view = colliders.view_mut::<(Collider,)>()?;
        let mut updated = 0;
        view.for_each_mut(|entity, (collider,)| {
            if let Some(transform) = transforms.get::<Transform2D>(entity)
                && update_world_shape(collider, transform)
            {
                updated += 1;
            }
        });
        Ok(updated)
    }
}

fn update_world_shape(collider: &mut Collider, transform: &Transform2D) -> bool {
    if !collider.has_shape() {
        return false;
    }
    collider.update_world(&transform.global);
    true
}

/// Row-aligned form of [`ColliderSystem::update_world_shapes`] for tables
/// holding both columns.
pub(crate) fn update_world_slices(colliders: &mut [Collider], transforms: &[Transform2D]) -> usize {
    let mut updated = 0;
    for (collider, transform) in colliders.iter_mut().zip(transforms) {
        if update_world_shape(collider, transform) {
            updated += 1;
        }
    }
    updated
}
