//! Axis-aligned bounding boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// A box that contains nothing; the identity for [`Aabb::union`].
    pub const EMPTY: Self = Self {
        min: Vec2::splat(f32::INFINITY),
        max: Vec2::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two corners.
    #[must_use]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The tightest box around `points`, or [`Aabb::EMPTY`] for no points.
    #[must_use]
    pub fn from_points(points: &[Vec2]) -> Self {
        points.iter().fold(Self::EMPTY, |acc, &p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    /// Returns `true` if the box contains no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Inclusive overlap test: boxes that share only an edge overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Inclusive overlap test on the Y axis only.
    #[must_use]
    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.min.y <= other.max.y && other.min.y <= self.max.y
    }

    /// The smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Full width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points(&[
            Vec2::new(1.0, 5.0),
            Vec2::new(-2.0, 3.0),
            Vec2::new(4.0, -1.0),
        ]);
        assert_eq!(aabb.min, Vec2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(4.0, 5.0));
        assert!(Aabb::from_points(&[]).is_empty());
    }

    #[test]
    fn test_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::new(Vec2::splat(5.0), Vec2::splat(15.0));
        let c = Aabb::new(Vec2::splat(20.0), Vec2::splat(30.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        // Touching edges count as overlapping.
        let d = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(12.0, 1.0));
        assert!(a.overlaps(&d));
    }

    #[test]
    fn test_union_and_center() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::new(Vec2::splat(2.0), Vec2::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u, Aabb::new(Vec2::ZERO, Vec2::splat(3.0)));
        assert_eq!(u.center(), Vec2::splat(1.5));
        assert_eq!(Aabb::EMPTY.union(&a), a);
    }
}
