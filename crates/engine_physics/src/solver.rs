//! Collision detection/response strategy.
//!
//! [`CollisionSolver`] is the seam the pipeline is generic over: detection,
//! positional correction and velocity response can be swapped as a unit at
//! pipeline construction. [`ImpulseSolver`] is the default.

use engine_math::{Affine2, Transform2D, Vec2};

use crate::body::{Material, Rigidbody};
use crate::collider::Collider;
use crate::config::PhysicsConfig;
use crate::narrow_phase::{CollisionInfo, Contact, detect_contacts};

/// Mutable access to one side of a contact.
#[derive(Debug)]
pub struct BodyMut<'a> {
    /// Local transform; `position` is in the parent's space.
    pub transform: &'a mut Transform2D,
    /// Velocities are world-space.
    pub rigidbody: &'a mut Rigidbody,
    /// Surface coefficients for this side.
    pub material: &'a Material,
    /// From the body's collider; zero without one.
    pub inertia_over_mass: f32,
    /// Maps world-space offsets into the parent's space. Identity for roots.
    pub world_to_parent: Affine2,
}

impl BodyMut<'_> {
    #[must_use]
    pub fn inverse_mass(&self) -> f32 {
        self.rigidbody.inverse_mass()
    }

    #[must_use]
    pub fn inverse_inertia(&self) -> f32 {
        self.rigidbody.inverse_inertia(self.inertia_over_mass)
    }

    /// World-space centre of rotation.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.transform.world_position()
    }

    /// Velocity of the material point at world position `point`.
    #[must_use]
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        let r = point - self.center();
        self.rigidbody.velocity + r.perp() * self.rigidbody.angular_velocity
    }

    /// Move the body by a world-space offset.
    pub fn translate(&mut self, offset: Vec2) {
        self.transform.position += self.world_to_parent.transform_vector2(offset);
    }

    /// Apply `impulse` at lever arm `r` from the centre.
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        let inverse_mass = self.inverse_mass();
        let inverse_inertia = self.inverse_inertia();
        self.rigidbody.velocity += impulse * inverse_mass;
        self.rigidbody.angular_velocity += r.perp_dot(impulse) * inverse_inertia;
    }
}

/// Pluggable detection and resolution.
///
/// `detect` must be pure: it may be called from several threads at once.
pub trait CollisionSolver: Send + Sync {
    /// Contacts between two colliders' world-space shapes.
    fn detect(&self, a: &Collider, b: &Collider) -> Vec<Contact>;

    /// Push the bodies apart along the contact normal.
    fn solve_overlap(
        &self,
        info: &CollisionInfo,
        a: &mut BodyMut<'_>,
        b: &mut BodyMut<'_>,
        config: &PhysicsConfig,
    );

    /// Apply the velocity response (bounce and friction).
    fn process_reaction(
        &self,
        info: &CollisionInfo,
        a: &mut BodyMut<'_>,
        b: &mut BodyMut<'_>,
        config: &PhysicsConfig,
    );
}

/// SAT detection with linear projection and a Coulomb-friction impulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseSolver {
    /// Penetration left uncorrected to avoid jitter between resting bodies.
    pub slop: f32,
}

impl ImpulseSolver {
    #[must_use]
    pub fn new() -> Self {
        Self { slop: 0.001 }
    }
}

impl Default for ImpulseSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn effective_mass(a: &BodyMut<'_>, b: &BodyMut<'_>, ra: Vec2, rb: Vec2, axis: Vec2) -> f32 {
    let ra_n = ra.perp_dot(axis);
    let rb_n = rb.perp_dot(axis);
    a.inverse_mass()
        + b.inverse_mass()
        + ra_n * ra_n * a.inverse_inertia()
        + rb_n * rb_n * b.inverse_inertia()
}

impl CollisionSolver for ImpulseSolver {
    fn detect(&self, a: &Collider, b: &Collider) -> Vec<Contact> {
        detect_contacts(a, b)
    }

    fn solve_overlap(
        &self,
        info: &CollisionInfo,
        a: &mut BodyMut<'_>,
        b: &mut BodyMut<'_>,
        config: &PhysicsConfig,
    ) {
        let a_fixed = a.inverse_mass() == 0.0;
        let b_fixed = b.inverse_mass() == 0.0;
        if a_fixed && b_fixed {
            return;
        }
        let depth = (info.contact.depth - self.slop).max(0.0);
        let correction = info.contact.normal * depth * config.position_correction;
        match (a_fixed, b_fixed) {
            (true, _) => b.translate(correction),
            (_, true) => a.translate(-correction),
            _ => {
                a.translate(-correction * 0.5);
                b.translate(correction * 0.5);
            }
        }
    }

    fn process_reaction(
        &self,
        info: &CollisionInfo,
        a: &mut BodyMut<'_>,
        b: &mut BodyMut<'_>,
        config: &PhysicsConfig,
    ) {
        let normal = info.contact.normal;
        let point = info.contact.point;
        let ra = point - a.center();
        let rb = point - b.center();

        let relative = b.velocity_at(point) - a.velocity_at(point);
        let along_normal = relative.dot(normal);
        // Already separating.
        if along_normal > 0.0 {
            return;
        }
        let k = effective_mass(a, b, ra, rb, normal);
        if k <= f32::EPSILON {
            return;
        }

        let restitution = config
            .restitution_combine
            .combine(a.material.restitution, b.material.restitution);
        let j = -(1.0 + restitution) * along_normal / k;
        a.apply_impulse(-normal * j, ra);
        b.apply_impulse(normal * j, rb);

        let relative = b.velocity_at(point) - a.velocity_at(point);
        let tangent = relative - normal * relative.dot(normal);
        if tangent.length_squared() <= 1.0e-12 {
            return;
        }
        let tangent = tangent.normalize();
        let kt = effective_mass(a, b, ra, rb, tangent);
        if kt <= f32::EPSILON {
            return;
        }
        let jt = -relative.dot(tangent) / kt;
        let static_friction = config
            .friction_combine
            .combine(a.material.static_friction, b.material.static_friction);
        let dynamic_friction = config
            .friction_combine
            .combine(a.material.dynamic_friction, b.material.dynamic_friction);
        // Stick while the needed impulse fits in the static cone, slide otherwise.
        let jt = if jt.abs() <= j * static_friction {
            jt
        } else {
            -j * dynamic_friction
        };
        a.apply_impulse(-tangent * jt, ra);
        b.apply_impulse(tangent * jt, rb);
    }
}
