//! Geometry error types.

/// Errors raised when an input outline cannot be decomposed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Fewer than three distinct vertices.
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Two vertices coincide.
    #[error("vertices {first} and {second} coincide")]
    DuplicateVertex {
        /// Index of the first vertex.
        first: usize,
        /// Index of the repeated vertex.
        second: usize,
    },

    /// All vertices are collinear.
    #[error("polygon has zero area")]
    ZeroArea,

    /// Two non-adjacent edges touch or cross.
    #[error("non-simple polygon: edge {first_edge} intersects edge {second_edge}")]
    NonSimplePolygon {
        /// Index of the first edge (edge `i` runs from vertex `i` to `i + 1`).
        first_edge: usize,
        /// Index of the second edge.
        second_edge: usize,
    },

    /// Ear clipping ran out of ears before finishing.
    #[error("triangulation failed with {remaining} vertices left")]
    TriangulationFailed {
        /// Vertices left unclipped.
        remaining: usize,
    },
}
