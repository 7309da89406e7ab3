//! SAT narrow phase over candidate pairs.
//!
//! Detection only reads the world-space pieces, so a large batch can be
//! spread over a [`rayon::ThreadPool`]. Results are always returned in the
//! order of the candidate pairs, whichever worker finished first.

use engine_math::{ConvexPolygon, Vec2, sat_overlap};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::collider::Collider;
use crate::solver::CollisionSolver;

/// Geometry of one overlapping piece pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first shape towards the second.
    pub normal: Vec2,
    /// Penetration depth along `normal`.
    pub depth: f32,
    /// Representative world-space contact point.
    pub point: Vec2,
}

/// A contact between two rows of the working table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// Working row of the first body.
    pub a: usize,
    /// Working row of the second body.
    pub b: usize,
    /// Normal points from `a` to `b`.
    pub contact: Contact,
}

/// Average of the vertices of each piece lying inside the other, or the
/// midpoint of the two support points when no vertex is contained.
fn contact_point(a: &ConvexPolygon, b: &ConvexPolygon, normal: Vec2) -> Vec2 {
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for &v in a.vertices() {
        if b.contains(v) {
            sum += v;
            count += 1;
        }
    }
    for &v in b.vertices() {
        if a.contains(v) {
            sum += v;
            count += 1;
        }
    }
    if count > 0 {
        sum / count as f32
    } else {
        (a.support(normal) + b.support(-normal)) * 0.5
    }
}

/// Test every piece of `a` against every piece of `b`.
///
/// Piece pairs whose bounds miss are skipped before SAT runs. One entity
/// pair can produce several contacts.
#[must_use]
pub fn detect_contacts(a: &Collider, b: &Collider) -> Vec<Contact> {
    let mut contacts = Vec::new();
    if !a.world_aabb().overlaps(&b.world_aabb()) {
        return contacts;
    }
    for piece_a in a.world_pieces() {
        let bounds_a = piece_a.aabb();
        for piece_b in b.world_pieces() {
            if !bounds_a.overlaps(&piece_b.aabb()) {
                continue;
            }
            if let Some(overlap) = sat_overlap(piece_a, piece_b) {
                contacts.push(Contact {
                    normal: overlap.normal,
                    depth: overlap.depth,
                    point: contact_point(piece_a, piece_b, overlap.normal),
                });
            }
        }
    }
    contacts
}

/// Run `solver.detect` over `pairs` (row indices into `colliders`).
///
/// With a pool and at least `parallel_threshold` pairs, detection runs on
/// the pool; the output order is the same either way.
pub fn detect_collisions<S: CollisionSolver>(
    solver: &S,
    colliders: &[Collider],
    pairs: &[(usize, usize)],
    pool: Option<&ThreadPool>,
    parallel_threshold: usize,
) -> Vec<CollisionInfo> {
    let detect_pair = |&(a, b): &(usize, usize)| -> Vec<CollisionInfo> {
        solver
            .detect(&colliders[a], &colliders[b])
            .into_iter()
            .map(|contact| CollisionInfo { a, b, contact })
            .collect()
    };

    match pool {
        Some(pool) if pairs.len() >= parallel_threshold => {
            let per_pair: Vec<Vec<CollisionInfo>> =
                pool.install(|| pairs.par_iter().map(detect_pair).collect());
            per_pair.into_iter().flatten().collect()
        }
        _ => pairs.iter().flat_map(detect_pair).collect(),
    }
}
