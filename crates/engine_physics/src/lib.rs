//! # engine_physics
//!
//! 2D rigid-body physics over the engine's columnar tables.
//!
//! Scene code owns four persistent tables, one per component:
//! [`Transform2D`](engine_math::Transform2D), [`Rigidbody`], [`Collider`] and
//! [`Material`]. Once per frame it calls [`physics_update`] (or
//! [`PhysicsPipeline::update`] for a custom configuration or solver), which
//! joins them into a transient working table, runs a fixed number of
//! sub-steps and writes the results back.
//!
//! Each sub-step:
//!
//! 1. integrates forces, gravity and drag into velocities and positions,
//! 2. rebuilds local and global transforms parent-first,
//! 3. refreshes world-space collider pieces,
//! 4. finds candidate pairs by [sweep and prune](broad_phase),
//! 5. drops pairs rejected by their [`CollisionFilter`]s,
//! 6. runs [SAT](narrow_phase) on every piece pair, optionally on a thread pool,
//! 7. resolves contacts in broad-phase order through the [`CollisionSolver`].

pub mod body;
pub mod broad_phase;
pub mod collider;
pub mod config;
pub mod error;
pub mod filter;
pub mod narrow_phase;
pub mod pipeline;
pub mod solver;

pub use body::{Material, Rigidbody};
pub use broad_phase::sweep_and_prune;
pub use collider::{Collider, ColliderSystem};
pub use config::{CombineMode, PhysicsConfig};
pub use error::PhysicsError;
pub use filter::CollisionFilter;
pub use narrow_phase::{CollisionInfo, Contact, detect_collisions, detect_contacts};
pub use pipeline::{FrameStats, PhysicsFrame, PhysicsPipeline, physics_update};
pub use solver::{BodyMut, CollisionSolver, ImpulseSolver};
