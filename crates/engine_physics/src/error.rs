//! Error type for the physics pipeline.

use engine_component::StorageError;
use engine_math::GeometryError;
use thiserror::Error;

/// Errors raised while configuring or stepping the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("invalid physics config: {0}")]
    InvalidConfig(String),

    #[error("time step must be finite, got {0}")]
    InvalidTimeStep(f32),
}
