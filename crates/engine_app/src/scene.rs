//! Demo scene held in the four persistent component tables.

use std::collections::BTreeMap;

use engine_component::{Entity, EntityAllocator, Table};
use engine_math::{Transform2D, Vec2};
use engine_physics::{
    Collider, ColliderSystem, CollisionFilter, CollisionSolver, FrameStats, Material,
    PhysicsError, PhysicsPipeline, Rigidbody,
};
use rayon::ThreadPool;
use tracing::debug;

/// Half extent of every crate box.
const CRATE_HALF: f32 = 0.5;

/// Outline of the U-shaped ground, counter-clockwise.
const GROUND_OUTLINE: [Vec2; 8] = [
    Vec2::new(-8.0, -1.0),
    Vec2::new(8.0, -1.0),
    Vec2::new(8.0, 4.0),
    Vec2::new(6.0, 4.0),
    Vec2::new(6.0, 0.0),
    Vec2::new(-6.0, 0.0),
    Vec2::new(-6.0, 4.0),
    Vec2::new(-8.0, 4.0),
];

/// Entities and their components, one table per component type.
#[derive(Debug)]
pub struct Scene {
    allocator: EntityAllocator,
    pub transforms: Table,
    pub rigidbodies: Table,
    pub colliders: Table,
    pub materials: Table,
    labels: BTreeMap<Entity, String>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Result<Self, PhysicsError> {
        Ok(Self {
            allocator: EntityAllocator::new(),
            transforms: Table::new::<(Transform2D,)>("transforms")?,
            rigidbodies: Table::new::<(Rigidbody,)>("rigidbodies")?,
            colliders: Table::new::<(Collider,)>("colliders")?,
            materials: Table::new::<(Material,)>("materials")?,
            labels: BTreeMap::new(),
        })
    }

    /// Build the demo: a U-shaped ground, `boxes` stacked crates, a player
    /// that only collides with the ground, and a marker riding the top crate.
    pub fn demo(boxes: usize) -> Result<Self, PhysicsError> {
        let mut scene = Self::new()?;
        scene.spawn_ground()?;
        let mut top = None;
        for i in 0..boxes {
            let column = (i % 3) as f32 - 1.0;
            let row = (i / 3) as f32;
            let position = Vec2::new(column * 1.1, 0.6 + row * 1.05);
            top = Some(scene.spawn_crate(position)?);
        }
        scene.spawn_player(Vec2::new(0.3, 0.6 + (boxes / 3 + 2) as f32 * 1.05))?;
        if let Some(parent) = top {
            scene.spawn_marker(parent, Vec2::new(0.0, 0.75))?;
        }
        let placed = ColliderSystem::update_world_shapes(&scene.transforms, &mut scene.colliders)?;
        debug!(placed, "world shapes placed");
        Ok(scene)
    }

    fn spawn(
        &mut self,
        label: impl Into<String>,
        transform: Transform2D,
    ) -> Result<Entity, PhysicsError> {
        let entity = self.allocator.allocate();
        self.transforms.push_back(entity, (transform,))?;
        self.labels.insert(entity, label.into());
        Ok(entity)
    }

    /// Static concave ground tagged `ground`.
    pub fn spawn_ground(&mut self) -> Result<Entity, PhysicsError> {
        let entity = self.spawn("ground", Transform2D::IDENTITY)?;
        ColliderSystem::assign_shape(&mut self.colliders, entity, &GROUND_OUTLINE)?;
        if let Some(collider) = self.colliders.get_mut::<Collider>(entity) {
            collider.filter = CollisionFilter::new().with_tag("ground");
        }
        self.materials.push_back(entity, (Material::STONE,))?;
        Ok(entity)
    }

    /// Dynamic box tagged `crate`.
    pub fn spawn_crate(&mut self, position: Vec2) -> Result<Entity, PhysicsError> {
        let label = format!("crate-{}", self.labels.len());
        let entity = self.spawn(label, Transform2D::from_position(position))?;
        self.rigidbodies.push_back(entity, (Rigidbody::dynamic(1.0),))?;
        let collider = Collider::rectangle(Vec2::splat(CRATE_HALF))
            .with_filter(CollisionFilter::new().with_tag("crate"));
        self.colliders.push_back(entity, (collider,))?;
        self.materials.push_back(entity, (Material::WOOD,))?;
        Ok(entity)
    }

    /// Dynamic triangle whose mask admits only the ground.
    pub fn spawn_player(&mut self, position: Vec2) -> Result<Entity, PhysicsError> {
        let entity = self.spawn("player", Transform2D::from_position(position))?;
        self.rigidbodies
            .push_back(entity, (Rigidbody::dynamic(2.0).with_locked_rotation(),))?;
        let outline = [Vec2::new(-0.4, -0.3), Vec2::new(0.4, -0.3), Vec2::new(0.0, 0.5)];
        ColliderSystem::assign_shape(&mut self.colliders, entity, &outline)?;
        if let Some(collider) = self.colliders.get_mut::<Collider>(entity) {
            collider.filter = CollisionFilter::new().with_tag("player").with_mask("ground");
        }
        self.materials.push_back(entity, (Material::RUBBER,))?;
        Ok(entity)
    }

    /// Small static body carried by `parent`, colliding only with other markers.
    pub fn spawn_marker(&mut self, parent: Entity, offset: Vec2) -> Result<Entity, PhysicsError> {
        let transform = Transform2D::from_position(offset).with_parent(parent);
        let entity = self.spawn("marker", transform)?;
        self.rigidbodies.push_back(entity, (Rigidbody::fixed(),))?;
        let collider = Collider::rectangle(Vec2::splat(0.1))
            .with_filter(CollisionFilter::new().with_tag("marker").with_mask("marker"));
        self.colliders.push_back(entity, (collider,))?;
        Ok(entity)
    }

    /// Advance the scene by one frame.
    pub fn step<S: CollisionSolver>(
        &mut self,
        pipeline: &PhysicsPipeline<S>,
        dt: f32,
        pool: Option<&ThreadPool>,
    ) -> Result<FrameStats, PhysicsError> {
        pipeline.update(
            &mut self.transforms,
            &mut self.rigidbodies,
            &mut self.colliders,
            &self.materials,
            dt,
            pool,
        )
    }

    /// Label and world position of every entity, in spawn order.
    pub fn positions(&self) -> Vec<(&str, Vec2)> {
        self.labels
            .iter()
            .filter_map(|(entity, label)| {
                self.transforms
                    .get::<Transform2D>(*entity)
                    .map(|t| (label.as_str(), t.world_position()))
            })
            .collect()
    }

    /// Entity carrying `label`, if any.
    #[cfg(test)]
    pub fn find(&self, label: &str) -> Option<Entity> {
        self.labels
            .iter()
            .find_map(|(entity, l)| (l == label).then_some(*entity))
    }
}

#[cfg(test)]
mod tests {
    use engine_physics::PhysicsConfig;

    use super::*;

    #[test]
    fn test_demo_populates_tables() {
        let scene = Scene::demo(6).unwrap();
        // ground + 6 crates + player + marker
        assert_eq!(scene.transforms.len(), 9);
        assert_eq!(scene.colliders.len(), 9);
        // ground has no rigidbody
        assert_eq!(scene.rigidbodies.len(), 8);
        assert_eq!(scene.materials.len(), 8);

        let ground = scene.find("ground").unwrap();
        assert!(scene.colliders.get::<Collider>(ground).unwrap().pieces().len() > 1);

        // Shapes start at their bodies' positions.
        let player = scene.find("player").unwrap();
        let bounds = scene.colliders.get::<Collider>(player).unwrap().world_aabb();
        assert!(bounds.min.y > 1.0, "{bounds:?}");
    }

    #[test]
    fn test_player_falls_through_crates_to_ground() {
        let mut scene = Scene::demo(3).unwrap();
        let pipeline = PhysicsPipeline::new(PhysicsConfig::default()).unwrap();
        for _ in 0..240 {
            scene.step(&pipeline, 1.0 / 60.0, None).unwrap();
        }
        let player = scene.find("player").unwrap();
        let y = scene
            .transforms
            .get::<Transform2D>(player)
            .unwrap()
            .world_position()
            .y;
        // Crates top out at y = 1.1; the ground floor is y = 0.
        assert!(y < 0.6, "player at {y}");
        assert!(y > -0.1);
    }

    #[test]
    fn test_marker_follows_parent() {
        let mut scene = Scene::demo(1).unwrap();
        let pipeline = PhysicsPipeline::new(PhysicsConfig::default()).unwrap();
        for _ in 0..30 {
            scene.step(&pipeline, 1.0 / 60.0, None).unwrap();
        }
        let marker = scene.find("marker").unwrap();
        let parent = scene
            .transforms
            .get::<Transform2D>(marker)
            .unwrap()
            .parent
            .unwrap();
        let parent_pos = scene.transforms.get::<Transform2D>(parent).unwrap().world_position();
        let marker_pos = scene.transforms.get::<Transform2D>(marker).unwrap().world_position();
        assert!(((marker_pos - parent_pos).length() - 0.75).abs() < 1e-3);
    }
}
