//! Sweep-and-prune broad phase.
//!
//! Every box contributes an open event at `min.x` and a close event at
//! `max.x`. After sorting, a sweep keeps the list of boxes whose X extent
//! contains the sweep position; a newly opened box is tested on Y against
//! each of them. Each overlapping pair is reported exactly once.

use engine_math::Aabb;

#[derive(Debug, Clone, Copy)]
struct Event {
    x: f32,
    close: bool,
    index: usize,
}

/// Candidate pairs `(i, j)` with `i < j` whose boxes overlap (inclusively).
///
/// Pairs come out in sweep order, which depends only on the input, so the
/// result is deterministic. Empty boxes never pair.
#[must_use]
pub fn sweep_and_prune(boxes: &[Aabb]) -> Vec<(usize, usize)> {
    let mut events = Vec::with_capacity(boxes.len() * 2);
    for (index, aabb) in boxes.iter().enumerate() {
        if aabb.is_empty() {
            continue;
        }
        events.push(Event {
            x: aabb.min.x,
            close: false,
            index,
        });
        events.push(Event {
            x: aabb.max.x,
            close: true,
            index,
        });
    }
    // Opens sort before closes at equal x so touching boxes still pair.
    events.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.close.cmp(&b.close)));

    let mut open: Vec<usize> = Vec::new();
    let mut pairs = Vec::new();
    for event in events {
        if event.close {
            if let Some(pos) = open.iter().position(|&i| i == event.index) {
                open.remove(pos);
            }
            continue;
        }
        let current = &boxes[event.index];
        for &other in &open {
            if boxes[other].overlaps_y(current) {
                pairs.push((other.min(event.index), other.max(event.index)));
            }
        }
        open.push(event.index);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_math::Vec2;

    fn aabb(min: (f32, f32), max: (f32, f32)) -> Aabb {
        Aabb::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1))
    }

    #[test]
    fn test_single_overlapping_pair() {
        let boxes = [
            aabb((0.0, 0.0), (10.0, 10.0)),
            aabb((5.0, 5.0), (15.0, 15.0)),
        ];
        assert_eq!(sweep_and_prune(&boxes), vec![(0, 1)]);
    }

    #[test]
    fn test_disjoint_boxes() {
        let boxes = [
            aabb((0.0, 0.0), (10.0, 10.0)),
            aabb((20.0, 20.0), (30.0, 30.0)),
        ];
        assert!(sweep_and_prune(&boxes).is_empty());
    }

    #[test]
    fn test_x_overlap_without_y_overlap() {
        let boxes = [aabb((0.0, 0.0), (10.0, 1.0)), aabb((2.0, 5.0), (3.0, 6.0))];
        assert!(sweep_and_prune(&boxes).is_empty());
    }

    #[test]
    fn test_each_pair_reported_once() {
        let boxes = [
            aabb((0.0, 0.0), (4.0, 4.0)),
            aabb((1.0, 1.0), (5.0, 5.0)),
            aabb((2.0, 2.0), (6.0, 6.0)),
            aabb((100.0, 0.0), (101.0, 1.0)),
        ];
        let mut pairs = sweep_and_prune(&boxes);
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_touching_boxes_pair() {
        let boxes = [aabb((0.0, 0.0), (1.0, 1.0)), aabb((1.0, 0.0), (2.0, 1.0))];
        assert_eq!(sweep_and_prune(&boxes), vec![(0, 1)]);
    }

    #[test]
    fn test_empty_boxes_are_skipped() {
        let boxes = [aabb((0.0, 0.0), (1.0, 1.0)), Aabb::EMPTY];
        assert!(sweep_and_prune(&boxes).is_empty());
    }
}
