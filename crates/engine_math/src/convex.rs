//! Convex polygons, the unit shape of the collision pipeline.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::EPSILON;
use crate::aabb::Aabb;
use crate::polygon::signed_area;

/// A convex polygon with counter-clockwise winding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConvexPolygon {
    vertices: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Wrap `vertices`, reversing them if they wind clockwise.
    ///
    /// Convexity is not checked; callers build pieces through
    /// [`convex_decompose`](crate::convex_decompose).
    #[must_use]
    pub fn new(mut vertices: Vec<Vec2>) -> Self {
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        Self { vertices }
    }

    /// An axis-aligned rectangle centred on the origin.
    #[must_use]
    pub fn rectangle(half_extents: Vec2) -> Self {
        let h = half_extents;
        Self {
            vertices: vec![
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ],
        }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate edges as `(start, end)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        signed_area(&self.vertices)
    }

    /// Area centroid; falls back to the vertex mean for degenerate pieces.
    #[must_use]
    pub fn centroid(&self) -> Vec2 {
        let area = self.area();
        if area.abs() <= EPSILON {
            if self.vertices.is_empty() {
                return Vec2::ZERO;
            }
            return self.vertices.iter().copied().sum::<Vec2>() / self.vertices.len() as f32;
        }
        let mut c = Vec2::ZERO;
        for (a, b) in self.edges() {
            c += (a + b) * a.perp_dot(b);
        }
        c / (6.0 * area)
    }

    /// Outward unit normals, one per edge.
    #[must_use]
    pub fn edge_normals(&self) -> Vec<Vec2> {
        self.edges()
            .map(|(a, b)| {
                let e = b - a;
                Vec2::new(e.y, -e.x).normalize_or_zero()
            })
            .collect()
    }

    /// Project onto `axis`, returning `(min, max)`.
    #[must_use]
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        self.vertices
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                let d = v.dot(axis);
                (lo.min(d), hi.max(d))
            })
    }

    /// The vertex furthest along `direction`.
    #[must_use]
    pub fn support(&self, direction: Vec2) -> Vec2 {
        self.vertices
            .iter()
            .copied()
            .max_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)))
            .unwrap_or(Vec2::ZERO)
    }

    /// Apply `transform` to every vertex. A reflecting transform would flip
    /// the winding, so the result is re-wound counter-clockwise.
    #[must_use]
    pub fn transformed(&self, transform: &Affine2) -> Self {
        let mut vertices: Vec<Vec2> = self
            .vertices
            .iter()
            .map(|&v| transform.transform_point2(v))
            .collect();
        if transform.matrix2.determinant() < 0.0 {
            vertices.reverse();
        }
        Self { vertices }
    }

    /// Overwrite `out` with this polygon under `transform`, reusing its allocation.
    pub fn transform_into(&self, transform: &Affine2, out: &mut ConvexPolygon) {
        out.vertices.clear();
        out.vertices
            .extend(self.vertices.iter().map(|&v| transform.transform_point2(v)));
        if transform.matrix2.determinant() < 0.0 {
            out.vertices.reverse();
        }
    }

    /// Inclusive containment test; boundary points are inside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.vertices.len() >= 3
            && self
                .edges()
                .all(|(a, b)| (b - a).perp_dot(point - a) >= -EPSILON)
    }

    /// Polar second moment of area about the model origin.
    ///
    /// Dividing the sum over all pieces by the total area gives inertia per
    /// unit mass for a uniform-density body.
    #[must_use]
    pub fn inertia_about_origin(&self) -> f32 {
        let mut sum = 0.0;
        for (a, b) in self.edges() {
            let cross = a.perp_dot(b);
            sum += cross * (a.dot(a) + a.dot(b) + b.dot(b));
        }
        sum / 12.0
    }
}
