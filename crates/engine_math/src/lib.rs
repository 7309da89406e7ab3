//! # engine_math
//!
//! Math types for the engine. Re-exports [`glam`] for linear algebra and
//! defines the 2D [`Transform2D`] component plus the polygon geometry kernel
//! used by collision detection:
//!
//! - [`Aabb`]: axis-aligned bounding boxes.
//! - [`ConvexPolygon`]: CCW convex pieces with projection and inertia helpers.
//! - [`polygon`]: validation, orientation and point-in-polygon for outlines.
//! - [`decompose`]: ear-clip triangulation and Hertel–Mehlhorn merging.
//! - [`sat`]: separating-axis overlap test between convex pieces.

pub mod aabb;
pub mod convex;
pub mod decompose;
pub mod error;
pub mod polygon;
pub mod sat;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{Affine2, Mat2, Vec2};

pub use aabb::Aabb;
pub use convex::ConvexPolygon;
pub use decompose::{convex_decompose, triangulate};
pub use error::GeometryError;
pub use polygon::{point_in_polygon, signed_area, validate_simple_polygon};
pub use sat::{Overlap, sat_overlap};
pub use transform::Transform2D;

/// Tolerance used by the geometry predicates.
pub const EPSILON: f32 = 1.0e-6;
