//! Predicates on simple polygon outlines.
//!
//! Outlines are plain vertex lists, implicitly closed (the last vertex
//! connects back to the first). Edge `i` runs from vertex `i` to vertex
//! `(i + 1) % n`.

use glam::Vec2;

use crate::EPSILON;
use crate::error::GeometryError;

/// Signed area of a closed outline: positive for counter-clockwise winding.
#[must_use]
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += points[i].perp_dot(points[(i + 1) % n]);
    }
    sum * 0.5
}

/// Even-odd point-in-polygon test for an arbitrary simple outline.
#[must_use]
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Cross product of `(b - a)` and `(c - a)`; positive when `a → b → c` turns left.
#[must_use]
pub fn orient(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Closed-segment intersection test (touching counts).
#[must_use]
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
    {
        return true;
    }
    (d1.abs() <= EPSILON && on_segment(q1, q2, p1))
        || (d2.abs() <= EPSILON && on_segment(q1, q2, p2))
        || (d3.abs() <= EPSILON && on_segment(p1, p2, q1))
        || (d4.abs() <= EPSILON && on_segment(p1, p2, q2))
}

/// Check that `points` describes a simple polygon.
///
/// # Errors
///
/// - [`GeometryError::TooFewVertices`] for fewer than three vertices.
/// - [`GeometryError::DuplicateVertex`] if any two vertices coincide.
/// - [`GeometryError::NonSimplePolygon`] if two non-adjacent edges touch.
/// - [`GeometryError::ZeroArea`] if the outline encloses no area.
pub fn validate_simple_polygon(points: &[Vec2]) -> Result<(), GeometryError> {
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::TooFewVertices(n));
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance_squared(points[j]) <= EPSILON * EPSILON {
                return Err(GeometryError::DuplicateVertex {
                    first: i,
                    second: j,
                });
            }
        }
    }
    for i in 0..n {
        let (a1, a2) = (points[i], points[(i + 1) % n]);
        for j in (i + 1)..n {
            // Adjacent edges share a vertex by construction.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (b1, b2) = (points[j], points[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return Err(GeometryError::NonSimplePolygon {
                    first_edge: i,
                    second_edge: j,
                });
            }
        }
    }
    // After the crossing test, so a symmetric bow tie reports as non-simple.
    if signed_area(points).abs() <= EPSILON {
        return Err(GeometryError::ZeroArea);
    }
    Ok(())
}

/// A counter-clockwise copy of `points` with collinear vertices removed.
#[must_use]
pub fn normalized_outline(points: &[Vec2]) -> Vec<Vec2> {
    let mut outline: Vec<Vec2> = if signed_area(points) < 0.0 {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    };
    let mut i = 0;
    while outline.len() > 3 && i < outline.len() {
        let n = outline.len();
        let prev = outline[(i + n - 1) % n];
        let next = outline[(i + 1) % n];
        if orient(prev, outline[i], next).abs() <= EPSILON {
            outline.remove(i);
        } else {
            i += 1;
        }
    }
    outline
}
