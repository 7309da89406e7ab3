//! Convex decomposition of simple polygons.
//!
//! The outline is validated, normalised to counter-clockwise winding with
//! collinear vertices dropped, then ear-clipped into triangles. Triangles are
//! merged back together across shared diagonals (Hertel–Mehlhorn) as long as
//! both corners touched by the removed diagonal stay convex. The result has at
//! most four times the minimum number of convex pieces.

use glam::Vec2;

use crate::EPSILON;
use crate::convex::ConvexPolygon;
use crate::error::GeometryError;
use crate::polygon::{normalized_outline, orient, validate_simple_polygon};

/// Ear-clip a simple polygon into triangles.
///
/// Triangles are wound counter-clockwise regardless of the input winding.
///
/// # Errors
///
/// Returns the [`validate_simple_polygon`] error for invalid outlines, or
/// [`GeometryError::TriangulationFailed`] if no ear can be found.
pub fn triangulate(points: &[Vec2]) -> Result<Vec<[Vec2; 3]>, GeometryError> {
    validate_simple_polygon(points)?;
    let outline = normalized_outline(points);
    let triangles = ear_clip(&outline)?;
    Ok(triangles
        .into_iter()
        .map(|[a, b, c]| [outline[a], outline[b], outline[c]])
        .collect())
}

/// Split a simple polygon into convex pieces.
///
/// # Errors
///
/// Same as [`triangulate`].
pub fn convex_decompose(points: &[Vec2]) -> Result<Vec<ConvexPolygon>, GeometryError> {
    validate_simple_polygon(points)?;
    let outline = normalized_outline(points);
    let triangles = ear_clip(&outline)?;
    let pieces = merge_convex(&outline, triangles.into_iter().map(Vec::from).collect());
    Ok(pieces
        .into_iter()
        .map(|piece| ConvexPolygon::new(piece.into_iter().map(|i| outline[i]).collect()))
        .collect())
}

fn inside_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    orient(a, b, p) >= -EPSILON && orient(b, c, p) >= -EPSILON && orient(c, a, p) >= -EPSILON
}

/// Triangulate a CCW outline, returning vertex-index triples.
fn ear_clip(outline: &[Vec2]) -> Result<Vec<[usize; 3]>, GeometryError> {
    let mut remaining: Vec<usize> = (0..outline.len()).collect();
    let mut triangles = Vec::with_capacity(outline.len().saturating_sub(2));
    let mut cursor = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let m = remaining.len();
        let prev = remaining[(cursor + m - 1) % m];
        let cur = remaining[cursor];
        let next = remaining[(cursor + 1) % m];
        let (a, b, c) = (outline[prev], outline[cur], outline[next]);

        let is_ear = orient(a, b, c) > EPSILON
            && remaining
                .iter()
                .filter(|&&v| v != prev && v != cur && v != next)
                .all(|&v| !inside_triangle(outline[v], a, b, c));

        if is_ear {
            triangles.push([prev, cur, next]);
            remaining.remove(cursor);
            cursor %= remaining.len();
            misses = 0;
        } else {
            cursor = (cursor + 1) % m;
            misses += 1;
            if misses > m {
                return Err(GeometryError::TriangulationFailed { remaining: m });
            }
        }
    }
    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    Ok(triangles)
}

/// Position `k` such that `poly[k] == a` and `poly[k + 1] == b` (cyclically).
fn find_edge(poly: &[usize], a: usize, b: usize) -> Option<usize> {
    let n = poly.len();
    (0..n).find(|&k| poly[k] == a && poly[(k + 1) % n] == b)
}

fn rotated(poly: &[usize], start: usize) -> Vec<usize> {
    poly[start..].iter().chain(&poly[..start]).copied().collect()
}

/// Try to merge `p` and `q` across a diagonal they share.
fn try_merge(outline: &[Vec2], p: &[usize], q: &[usize]) -> Option<Vec<usize>> {
    let n = p.len();
    for k in 0..n {
        let (a, b) = (p[k], p[(k + 1) % n]);
        let Some(qk) = find_edge(q, b, a) else {
            continue;
        };
        // p as b .. a, q as a .. b
        let p_run = rotated(p, (k + 1) % n);
        let q_run = rotated(q, (qk + 1) % q.len());

        let mut merged = p_run.clone();
        merged.extend_from_slice(&q_run[1..q_run.len() - 1]);

        let at_a = orient(
            outline[p_run[p_run.len() - 2]],
            outline[a],
            outline[q_run[1]],
        );
        let at_b = orient(
            outline[q_run[q_run.len() - 2]],
            outline[b],
            outline[p_run[1]],
        );
        if at_a >= -EPSILON && at_b >= -EPSILON {
            return Some(merged);
        }
    }
    None
}

fn merge_convex(outline: &[Vec2], mut pieces: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    'outer: loop {
        for i in 0..pieces.len() {
            for j in (i + 1)..pieces.len() {
                if let Some(merged) = try_merge(outline, &pieces[i], &pieces[j]) {
                    pieces[i] = merged;
                    pieces.swap_remove(j);
                    continue 'outer;
                }
            }
        }
        return pieces;
    }
}
