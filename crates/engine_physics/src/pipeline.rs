//! The per-frame physics pipeline.
//!
//! A frame runs in three phases:
//!
//! 1. [`PhysicsPipeline::prepare`] reads the four persistent tables and builds
//!    one transient working [`Table`] holding a copy of every body's
//!    transform, rigidbody, material and collider, plus the parent-first
//!    visiting order of those rows.
//! 2. [`PhysicsPipeline::simulate`] advances the working table by `dt` in
//!    fixed sub-steps: integrate, rebuild transforms, refresh world shapes,
//!    broad phase, filter, narrow phase, resolve.
//! 3. [`PhysicsPipeline::write_back`] copies the results into whichever
//!    persistent rows still exist.
//!
//! Scene code may erase rows between `prepare` and `write_back`; a missing
//! row is skipped for its own table only.

use engine_component::{Entity, Table, hierarchy_order};
use engine_math::{Affine2, Transform2D, Vec2};
use rayon::ThreadPool;
use tracing::{debug, trace};

use crate::body::{Material, Rigidbody};
use crate::broad_phase::sweep_and_prune;
use crate::collider::{Collider, update_world_slices};
use crate::config::PhysicsConfig;
use crate::error::PhysicsError;
use crate::narrow_phase::detect_collisions;
use crate::solver::{BodyMut, CollisionSolver, ImpulseSolver};

type BodyColumns = (Transform2D, Rigidbody, Material, Collider);

#[derive(Debug, Clone, Copy)]
enum ParentLink {
    Root,
    /// Parent is another row of the working table.
    Row(usize),
    /// Parent only exists in the persistent transform table; its global
    /// matrix is frozen for the frame.
    External(Affine2),
}

/// The transient working set of one frame.
#[derive(Debug)]
pub struct PhysicsFrame {
    table: Table,
    order: Vec<usize>,
    parents: Vec<ParentLink>,
}

impl PhysicsFrame {
    /// Number of bodies taking part.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Participating entities in working-row order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.table.entities()
    }

    /// The working table, with `Transform2D`, `Rigidbody`, `Material` and
    /// `Collider` columns.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// Counters for one frame, summed over its sub-steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Rows in the working table.
    pub bodies: usize,
    /// Broad-phase pairs that passed the filter.
    pub candidate_pairs: usize,
    /// Pairs the solver found touching.
    pub contacts: usize,
    /// Bodies whose transform was written back.
    pub written_back: usize,
}

/// Sub-stepped rigid-body simulation over four component tables.
#[derive(Debug, Clone)]
pub struct PhysicsPipeline<S: CollisionSolver = ImpulseSolver> {
    config: PhysicsConfig,
    solver: S,
}

impl PhysicsPipeline<ImpulseSolver> {
    /// A pipeline using the default [`ImpulseSolver`].
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        Self::with_solver(config, ImpulseSolver::default())
    }
}

/// Two distinct elements of one slice, mutably.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Recompute local and global matrices, parents first.
///
/// `global` is always rebuilt from the parent's current global and this
/// row's fresh local matrix, never accumulated onto last sub-step's value.
/// Per row, the map from world-space offsets into the space of the row's
/// parent. Identity for roots and for parents that cannot be inverted.
fn fill_world_to_parent(
    out: &mut Vec<Affine2>,
    transforms: &[Transform2D],
    parents: &[ParentLink],
) {
    out.clear();
    out.extend(parents.iter().map(|link| {
        let parent_global = match *link {
            ParentLink::Root => return Affine2::IDENTITY,
            ParentLink::Row(parent) => transforms[parent].global,
            ParentLink::External(global) => global,
        };
        if parent_global.matrix2.determinant().abs() <= f32::EPSILON {
            Affine2::IDENTITY
        } else {
            parent_global.inverse()
        }
    }));
}

fn rebuild_transforms(transforms: &mut [Transform2D], order: &[usize], parents: &[ParentLink]) {
    for &row in order {
        transforms[row].refresh_local();
        let parent_global = match parents[row] {
            ParentLink::Root => continue,
            ParentLink::Row(parent) => transforms[parent].global,
            ParentLink::External(global) => global,
        };
        transforms[row].apply_parent(&parent_global);
    }
}

impl<S: CollisionSolver> PhysicsPipeline<S> {
    /// A pipeline using a custom solver.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidConfig`] if `config` fails validation.
    pub fn with_solver(config: PhysicsConfig, solver: S) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Build the working set for one frame.
    ///
    /// Every entity of `transforms` that also has a rigidbody or a collider
    /// takes part. A missing rigidbody makes the body static; a missing
    /// material uses [`Material::default`]. The source tables are only read.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::Storage`] if `transforms` has no `Transform2D` column
    /// or the parent links form a cycle.
    pub fn prepare(
        &self,
        transforms: &Table,
        rigidbodies: &Table,
        colliders: &Table,
        materials: &Table,
    ) -> Result<PhysicsFrame, PhysicsError> {
        let source = transforms.view::<(Transform2D,)>()?;
        let mut table = Table::new::<BodyColumns>("physics_working")?;
        for (entity, (transform,)) in source.iter() {
            let rigidbody = rigidbodies.get::<Rigidbody>(entity);
            let collider = colliders.get::<Collider>(entity);
            if rigidbody.is_none() && collider.is_none() {
                continue;
            }
            table.push_back(
                entity,
                (
                    *transform,
                    rigidbody.copied().unwrap_or_else(Rigidbody::fixed),
                    materials.get::<Material>(entity).copied().unwrap_or_default(),
                    collider.cloned().unwrap_or_default(),
                ),
            )?;
        }

        let links: Vec<(Entity, Entity)> = table
            .entities()
            .iter()
            .zip(table.column::<Transform2D>()?.iter())
            .map(|(&entity, transform)| (entity, transform.parent.unwrap_or(entity)))
            .collect();
        let order = hierarchy_order(&links)?;
        let parents = links
            .iter()
            .map(|&(entity, parent)| {
                if parent == entity {
                    ParentLink::Root
                } else if let Some(row) = table.row_of(parent) {
                    ParentLink::Row(row)
                } else if let Some(transform) = transforms.get::<Transform2D>(parent) {
                    ParentLink::External(transform.global)
                } else {
                    ParentLink::Root
                }
            })
            .collect();

        debug!(
            bodies = table.len(),
            bytes = table.len() * table.row_size(),
            "physics frame prepared"
        );
        Ok(PhysicsFrame {
            table,
            order,
            parents,
        })
    }

    /// Advance `frame` by `dt` seconds in `config.substeps` equal steps.
    ///
    /// A non-positive `dt` leaves the frame unchanged. Narrow phase uses
    /// `pool` when given and the step has at least
    /// `config.parallel_threshold` candidate pairs.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidTimeStep`] for a non-finite `dt`.
    pub fn simulate(
        &self,
        frame: &mut PhysicsFrame,
        dt: f32,
        pool: Option<&ThreadPool>,
    ) -> Result<FrameStats, PhysicsError> {
        if !dt.is_finite() {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }
        let mut stats = FrameStats {
            bodies: frame.len(),
            ..FrameStats::default()
        };
        if dt <= 0.0 || frame.is_empty() {
            return Ok(stats);
        }
        let h = dt / self.config.substeps as f32;

        let PhysicsFrame {
            table,
            order,
            parents,
        } = frame;
        let mut view = table.view_mut::<BodyColumns>()?;
        let slices = view.slices_mut();
        let transforms: &mut [Transform2D] = &mut slices.0;
        let bodies: &mut [Rigidbody] = &mut slices.1;
        let materials: &[Material] = &slices.2;
        let colliders: &mut [Collider] = &mut slices.3;

        let mut boxes = Vec::with_capacity(colliders.len());
        let mut world_to_parent = Vec::with_capacity(transforms.len());
        rebuild_transforms(transforms, order, parents);
        fill_world_to_parent(&mut world_to_parent, transforms, parents);
        for step in 0..self.config.substeps {
            self.integrate(transforms, bodies, materials, colliders, &world_to_parent, h);
            rebuild_transforms(transforms, order, parents);
            fill_world_to_parent(&mut world_to_parent, transforms, parents);
            update_world_slices(colliders, transforms);

            boxes.clear();
            boxes.extend(colliders.iter().map(Collider::world_aabb));
            let mut pairs = sweep_and_prune(&boxes);
            pairs.retain(|&(a, b)| {
                !(bodies[a].is_static && bodies[b].is_static)
                    && colliders[a].filter.compatible(&colliders[b].filter)
            });

            let collisions = detect_collisions(
                &self.solver,
                colliders,
                &pairs,
                pool,
                self.config.parallel_threshold,
            );
            for info in &collisions {
                let (transform_a, transform_b) = pair_mut(transforms, info.a, info.b);
                let (body_a, body_b) = pair_mut(bodies, info.a, info.b);
                let mut a = BodyMut {
                    transform: transform_a,
                    rigidbody: body_a,
                    material: &materials[info.a],
                    inertia_over_mass: colliders[info.a].inertia_over_mass(),
                    world_to_parent: world_to_parent[info.a],
                };
                let mut b = BodyMut {
                    transform: transform_b,
                    rigidbody: body_b,
                    material: &materials[info.b],
                    inertia_over_mass: colliders[info.b].inertia_over_mass(),
                    world_to_parent: world_to_parent[info.b],
                };
                self.solver.solve_overlap(info, &mut a, &mut b, &self.config);
                self.solver
                    .process_reaction(info, &mut a, &mut b, &self.config);
            }

            trace!(
                step,
                pairs = pairs.len(),
                contacts = collisions.len(),
                "physics sub-step"
            );
            stats.candidate_pairs += pairs.len();
            stats.contacts += collisions.len();
        }
        Ok(stats)
    }

    /// Forces, gravity, drag and motion for one sub-step.
    ///
    /// Velocities are world-space; the displacement of a parented body is
    /// mapped into its parent's space before moving the local position.
    fn integrate(
        &self,
        transforms: &mut [Transform2D],
        bodies: &mut [Rigidbody],
        materials: &[Material],
        colliders: &[Collider],
        world_to_parent: &[Affine2],
        h: f32,
    ) {
        let rows = transforms
            .iter_mut()
            .zip(bodies.iter_mut())
            .zip(materials)
            .zip(colliders)
            .zip(world_to_parent);
        for ((((transform, body), material), collider), to_parent) in rows {
            if body.is_static {
                body.force = Vec2::ZERO;
                body.velocity = Vec2::ZERO;
                body.angular_force = 0.0;
                body.angular_velocity = 0.0;
                continue;
            }
            if body.lock_rotation {
                body.angular_force = 0.0;
                body.angular_velocity = 0.0;
            }

            body.velocity += (body.force * body.inverse_mass() + self.config.gravity) * h;
            body.angular_velocity +=
                body.angular_force * body.inverse_inertia(collider.inertia_over_mass()) * h;

            // Clamped so drag can stop a body but never reverse it.
            let keep = 1.0 - (material.air_drag * h).clamp(0.0, 1.0);
            body.velocity *= keep;
            body.angular_velocity *= keep;

            transform.position += to_parent.transform_vector2(body.velocity * h);
            transform.rotation += body.angular_velocity * h;
        }
    }

    /// Copy the frame's results into the persistent tables.
    ///
    /// Transforms get position, rotation and both cached matrices;
    /// rigidbodies get linear and angular velocity; colliders get their
    /// world pieces, unless their shape was reassigned during the frame.
    /// Each table is written on its own: an entity erased from one table
    /// still has its rows in the others updated. Returns the number of transforms written.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::Storage`] if the working table cannot be viewed.
    pub fn write_back(
        &self,
        frame: &PhysicsFrame,
        transforms: &mut Table,
        rigidbodies: &mut Table,
        colliders: &mut Table,
    ) -> Result<usize, PhysicsError> {
        let view = frame.table.view::<BodyColumns>()?;
        let mut written = 0;
        for (entity, (transform, body, _, collider)) in view.iter() {
            if let Some(target) = transforms.get_mut::<Transform2D>(entity) {
                target.position = transform.position;
                target.rotation = transform.rotation;
                target.local = transform.local;
                target.global = transform.global;
                written += 1;
            } else {
                debug!(%entity, "transform removed during frame, skipping its write-back");
            }
            if let Some(target) = rigidbodies.get_mut::<Rigidbody>(entity) {
                target.velocity = body.velocity;
                target.angular_velocity = body.angular_velocity;
            }
            if let Some(target) = colliders.get_mut::<Collider>(entity) {
                target.copy_world_from(collider);
            }
        }
        Ok(written)
    }

    /// `prepare`, `simulate` and `write_back` in sequence.
    ///
    /// # Errors
    ///
    /// Any error from the three phases; the persistent tables are only
    /// modified once simulation has succeeded.
    pub fn update(
        &self,
        transforms: &mut Table,
        rigidbodies: &mut Table,
        colliders: &mut Table,
        materials: &Table,
        dt: f32,
        pool: Option<&ThreadPool>,
    ) -> Result<FrameStats, PhysicsError> {
        let mut frame = self.prepare(transforms, rigidbodies, colliders, materials)?;
        let mut stats = self.simulate(&mut frame, dt, pool)?;
        stats.written_back = self.write_back(&frame, transforms, rigidbodies, colliders)?;
        debug!(
            bodies = stats.bodies,
            pairs = stats.candidate_pairs,
            contacts = stats.contacts,
            written = stats.written_back,
            "physics frame"
        );
        Ok(stats)
    }
}

/// Step the four tables by `dt` with the default configuration and solver.
///
/// # Errors
///
/// See [`PhysicsPipeline::update`].
pub fn physics_update(
    transforms: &mut Table,
    rigidbodies: &mut Table,
    colliders: &mut Table,
    materials: &Table,
    dt: f32,
    pool: Option<&ThreadPool>,
) -> Result<FrameStats, PhysicsError> {
    PhysicsPipeline::new(PhysicsConfig::default())?.update(
        transforms,
        rigidbodies,
        colliders,
        materials,
        dt,
        pool,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CollisionFilter;

    struct Scene {
        transforms: Table,
        rigidbodies: Table,
        colliders: Table,
        materials: Table,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                transforms: Table::new::<(Transform2D,)>("transforms").unwrap(),
                rigidbodies: Table::new::<(Rigidbody,)>("rigidbodies").unwrap(),
                colliders: Table::new::<(Collider,)>("colliders").unwrap(),
                materials: Table::new::<(Material,)>("materials").unwrap(),
            }
        }

        fn spawn(
            &mut self,
            id: u64,
            transform: Transform2D,
            body: Option<Rigidbody>,
            collider: Option<Collider>,
        ) -> Entity {
            let entity = Entity(id);
            self.transforms.push_back(entity, (transform,)).unwrap();
            if let Some(body) = body {
                self.rigidbodies.push_back(entity, (body,)).unwrap();
            }
            if let Some(collider) = collider {
                self.colliders.push_back(entity, (collider,)).unwrap();
            }
            entity
        }

        fn update(&mut self, pipeline: &PhysicsPipeline, dt: f32) -> FrameStats {
            pipeline
                .update(
                    &mut self.transforms,
                    &mut self.rigidbodies,
                    &mut self.colliders,
                    &self.materials,
                    dt,
                    None,
                )
                .unwrap()
        }

        fn position(&self, entity: Entity) -> Vec2 {
            self.transforms.get::<Transform2D>(entity).unwrap().position
        }
    }

    fn pipeline() -> PhysicsPipeline {
        PhysicsPipeline::new(PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_prepare_selects_bodies() {
        let mut scene = Scene::new();
        scene.spawn(1, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        scene.spawn(2, Transform2D::IDENTITY, None, Some(Collider::rectangle(Vec2::ONE)));
        scene.spawn(3, Transform2D::IDENTITY, None, None);
        let frame = pipeline()
            .prepare(
                &scene.transforms,
                &scene.rigidbodies,
                &scene.colliders,
                &scene.materials,
            )
            .unwrap();
        assert_eq!(frame.entities(), &[Entity(1), Entity(2)]);
        // No rigidbody row: treated as static.
        assert!(frame.table().get::<Rigidbody>(Entity(2)).unwrap().is_static);
        assert_eq!(
            frame.table().get::<Material>(Entity(1)),
            Some(&Material::default())
        );
    }

    #[test]
    fn test_free_fall_follows_gravity() {
        let mut scene = Scene::new();
        let body = scene.spawn(1, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        let config = PhysicsConfig::default().with_substeps(1);
        let pipeline = PhysicsPipeline::new(config).unwrap();
        scene.update(&pipeline, 0.1);
        let velocity = scene.rigidbodies.get::<Rigidbody>(body).unwrap().velocity;
        // Wood drag: 1% per second.
        let keep = 1.0 - Material::WOOD.air_drag * 0.1;
        assert!((velocity.y - -0.981 * keep).abs() < 1e-5);
        assert!((scene.position(body).y - velocity.y * 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_static_bodies_never_move() {
        let mut scene = Scene::new();
        let a = scene.spawn(
            1,
            Transform2D::IDENTITY,
            Some(Rigidbody::fixed().with_velocity(Vec2::X)),
            Some(Collider::rectangle(Vec2::splat(0.5))),
        );
        let b = scene.spawn(
            2,
            Transform2D::from_position(Vec2::new(0.7, 0.0)),
            Some(Rigidbody::fixed()),
            Some(Collider::rectangle(Vec2::splat(0.5))),
        );
        let pipeline = PhysicsPipeline::new(PhysicsConfig::default().with_substeps(1)).unwrap();
        let stats = scene.update(&pipeline, 1.0 / 60.0);
        assert_eq!(stats.candidate_pairs, 0);
        assert_eq!(scene.position(a), Vec2::ZERO);
        assert_eq!(scene.position(b), Vec2::new(0.7, 0.0));
        let velocity = scene.rigidbodies.get::<Rigidbody>(a).unwrap().velocity;
        assert_eq!(velocity, Vec2::ZERO);
    }

    #[test]
    fn test_child_follows_parent() {
        let mut scene = Scene::new();
        let parent = scene.spawn(
            1,
            Transform2D::from_position(Vec2::new(5.0, 0.0)),
            Some(Rigidbody::dynamic(1.0).with_velocity(Vec2::new(1.0, 0.0))),
            None,
        );
        let child = scene.spawn(
            2,
            Transform2D::from_position(Vec2::new(1.0, 0.0)).with_parent(parent),
            Some(Rigidbody::fixed()),
            None,
        );
        let config = PhysicsConfig::default().with_gravity(Vec2::ZERO);
        scene.update(&PhysicsPipeline::new(config).unwrap(), 1.0);

        let parent_global = scene.transforms.get::<Transform2D>(parent).unwrap().global;
        let child_t = scene.transforms.get::<Transform2D>(child).unwrap();
        assert_eq!(child_t.position, Vec2::new(1.0, 0.0));
        let expected = parent_global.translation + Vec2::X;
        assert!((child_t.world_position() - expected).length() < 1e-5);
    }

    #[test]
    fn test_filter_lets_masked_bodies_pass() {
        let mut scene = Scene::new();
        let ground_filter = CollisionFilter::new().with_tag("ground");
        let ghost_filter = CollisionFilter::new().with_tag("ghost").with_mask("nothing");
        scene.spawn(
            1,
            Transform2D::IDENTITY,
            None,
            Some(Collider::rectangle(Vec2::new(5.0, 0.5)).with_filter(ground_filter)),
        );
        let ghost = scene.spawn(
            2,
            Transform2D::from_position(Vec2::new(0.0, 0.8)),
            Some(Rigidbody::dynamic(1.0)),
            Some(Collider::rectangle(Vec2::splat(0.5)).with_filter(ghost_filter)),
        );
        let stats = scene.update(&pipeline(), 1.0 / 60.0);
        assert_eq!(stats.contacts, 0);
        assert!(scene.position(ghost).y < 0.8);
    }

    #[test]
    fn test_write_back_skips_removed_entities() {
        let mut scene = Scene::new();
        let kept = scene.spawn(1, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        let removed = scene.spawn(2, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        let pipeline = pipeline();
        let mut frame = pipeline
            .prepare(
                &scene.transforms,
                &scene.rigidbodies,
                &scene.colliders,
                &scene.materials,
            )
            .unwrap();
        pipeline.simulate(&mut frame, 1.0 / 60.0, None).unwrap();

        assert!(scene.transforms.erase_by_entity(removed));
        let written = pipeline
            .write_back(
                &frame,
                &mut scene.transforms,
                &mut scene.rigidbodies,
                &mut scene.colliders,
            )
            .unwrap();
        assert_eq!(written, 1);
        assert!(scene.position(kept).y < 0.0);
        assert!(!scene.transforms.contains(removed));
    }

    #[test]
    fn test_invalid_time_step() {
        let mut scene = Scene::new();
        scene.spawn(1, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        let result = pipeline().update(
            &mut scene.transforms,
            &mut scene.rigidbodies,
            &mut scene.colliders,
            &scene.materials,
            f32::NAN,
            None,
        );
        assert!(matches!(result, Err(PhysicsError::InvalidTimeStep(_))));
        assert_eq!(scene.position(Entity(1)), Vec2::ZERO);
    }

    #[test]
    fn test_zero_dt_is_a_no_op() {
        let mut scene = Scene::new();
        let body = scene.spawn(1, Transform2D::IDENTITY, Some(Rigidbody::dynamic(1.0)), None);
        let stats = scene.update(&pipeline(), 0.0);
        assert_eq!(stats.bodies, 1);
        assert_eq!(scene.position(body), Vec2::ZERO);
    }
}
