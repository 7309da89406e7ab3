//! Separating-axis overlap test for convex polygons.

use glam::Vec2;

use crate::convex::ConvexPolygon;

/// Minimum-translation result of a positive SAT test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Unit axis of least penetration, pointing from the first polygon to the second.
    pub normal: Vec2,
    /// Penetration depth along `normal`.
    pub depth: f32,
}

fn interval_overlap((a_min, a_max): (f32, f32), (b_min, b_max): (f32, f32)) -> f32 {
    let mut overlap = a_max.min(b_max) - a_min.max(b_min);
    // One interval inside the other: the cheaper way out is past the nearer end.
    if (a_min <= b_min && a_max >= b_max) || (b_min <= a_min && b_max >= a_max) {
        overlap += (a_min - b_min).abs().min((a_max - b_max).abs());
    }
    overlap
}

/// Test two convex polygons for overlap over the edge normals of both.
///
/// Returns `None` if a separating axis exists. Touching polygons (zero
/// overlap on some axis) are treated as separated.
#[must_use]
pub fn sat_overlap(a: &ConvexPolygon, b: &ConvexPolygon) -> Option<Overlap> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }
    let mut best = Overlap {
        normal: Vec2::ZERO,
        depth: f32::INFINITY,
    };
    for axis in a.edge_normals().into_iter().chain(b.edge_normals()) {
        if axis == Vec2::ZERO {
            continue;
        }
        let depth = interval_overlap(a.project(axis), b.project(axis));
        if depth <= 0.0 {
            return None;
        }
        if depth < best.depth {
            best = Overlap {
                normal: axis,
                depth,
            };
        }
    }
    if !best.depth.is_finite() {
        return None;
    }
    if (b.centroid() - a.centroid()).dot(best.normal) < 0.0 {
        best.normal = -best.normal;
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Affine2;

    fn unit_square_at(x: f32, y: f32) -> ConvexPolygon {
        ConvexPolygon::new(vec![
            Vec2::new(x, y),
            Vec2::new(x + 1.0, y),
            Vec2::new(x + 1.0, y + 1.0),
            Vec2::new(x, y + 1.0),
        ])
    }

    #[test]
    fn test_unit_squares_overlapping_along_x() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(0.7, 0.0);
        let hit = sat_overlap(&a, &b).unwrap();
        assert!((hit.depth - 0.3).abs() < 1e-5);
        assert!((hit.normal - Vec2::X).length() < 1e-5);

        let reversed = sat_overlap(&b, &a).unwrap();
        assert!((reversed.normal + Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_separated_squares() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(1.5, 0.2);
        assert!(sat_overlap(&a, &b).is_none());
    }

    #[test]
    fn test_touching_squares_do_not_overlap() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(1.0, 0.0);
        assert!(sat_overlap(&a, &b).is_none());
    }

    #[test]
    fn test_rotated_square_separated_on_own_axis() {
        // A diamond whose AABB overlaps the square but whose edges don't.
        let square = unit_square_at(0.0, 0.0);
        let diamond = ConvexPolygon::rectangle(Vec2::splat(0.5)).transformed(
            &Affine2::from_angle_translation(std::f32::consts::FRAC_PI_4, Vec2::new(1.65, 1.65)),
        );
        assert!(square.aabb().overlaps(&diamond.aabb()));
        assert!(sat_overlap(&square, &diamond).is_none());
    }

    #[test]
    fn test_contained_polygon_reports_exit_depth() {
        let big = ConvexPolygon::rectangle(Vec2::splat(2.0));
        let small = ConvexPolygon::rectangle(Vec2::splat(0.5))
            .transformed(&Affine2::from_translation(Vec2::new(1.0, 0.0)));
        let hit = sat_overlap(&big, &small).unwrap();
        // Exit through the right side: 1.0 overlap + 0.5 to clear the edge.
        assert!((hit.depth - 1.5).abs() < 1e-5);
        assert!((hit.normal - Vec2::X).length() < 1e-5);
    }
}
