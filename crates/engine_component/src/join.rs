//! Cross-table joins.
//!
//! A join visits every entity that has a row in *both* tables, handing the
//! callback the requested columns of each side. Rather than physically
//! reordering the tables so matching rows line up, the join first builds a
//! [`JoinIndex`]: a correspondence list of `(entity, left_row, right_row)`.
//! Neither table's row order changes, so row indices taken before a join stay
//! valid after it and read-only joins can run concurrently.

use tracing::trace;

use crate::entity::Entity;
use crate::error::StorageError;
use crate::set::ComponentSet;
use crate::table::Table;

/// One matched entity and its row in each table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRow {
    /// The shared entity.
    pub entity: Entity,
    /// Row in the left table.
    pub left: usize,
    /// Row in the right table.
    pub right: usize,
}

/// The intersection of two tables' entity sets, in left-table row order.
#[derive(Debug, Clone, Default)]
pub struct JoinIndex {
    rows: Vec<JoinRow>,
}

impl JoinIndex {
    /// Intersect the entity sets of `left` and `right`.
    ///
    /// The smaller table is scanned and the larger one probed, then the
    /// matches are sorted back into left-table row order.
    #[must_use]
    pub fn build(left: &Table, right: &Table) -> Self {
        let mut rows: Vec<JoinRow> = if left.len() <= right.len() {
            left.entities()
                .iter()
                .enumerate()
                .filter_map(|(l, &entity)| {
                    right.row_of(entity).map(|r| JoinRow {
                        entity,
                        left: l,
                        right: r,
                    })
                })
                .collect()
        } else {
            right
                .entities()
                .iter()
                .enumerate()
                .filter_map(|(r, &entity)| {
                    left.row_of(entity).map(|l| JoinRow {
                        entity,
                        left: l,
                        right: r,
                    })
                })
                .collect()
        };
        rows.sort_unstable_by_key(|row| row.left);
        trace!(
            left = left.name(),
            right = right.name(),
            matched = rows.len(),
            "join index built"
        );
        Self { rows }
    }

    /// Number of matched entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the tables share no entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The matched rows.
    #[must_use]
    pub fn rows(&self) -> &[JoinRow] {
        &self.rows
    }
}

/// Visit every entity present in both tables with read-only access.
///
/// Returns the number of entities visited.
///
/// # Errors
///
/// Returns a [`StorageError`] if either table lacks a requested column.
pub fn join<L, R, F>(left: &Table, right: &Table, mut f: F) -> Result<usize, StorageError>
where
    L: ComponentSet,
    R: ComponentSet,
    F: FnMut(Entity, L::Ref<'_>, R::Ref<'_>),
{
    let left_view = left.view::<L>()?;
    let right_view = right.view::<R>()?;
    let index = JoinIndex::build(left, right);
    for row in index.rows() {
        f(
            row.entity,
            L::fetch(left_view.slices(), row.left),
            R::fetch(right_view.slices(), row.right),
        );
    }
    Ok(index.len())
}

/// Visit every entity present in both tables with read/write access.
///
/// Returns the number of entities visited.
///
/// # Errors
///
/// Returns a [`StorageError`] if either table lacks a requested column.
pub fn join_mut<L, R, F>(left: &mut Table, right: &mut Table, mut f: F) -> Result<usize, StorageError>
where
    L: ComponentSet,
    R: ComponentSet,
    F: FnMut(Entity, L::Mut<'_>, R::Mut<'_>),
{
    let index = JoinIndex::build(left, right);
    let mut left_view = left.view_mut::<L>()?;
    let mut right_view = right.view_mut::<R>()?;
    for row in index.rows() {
        f(
            row.entity,
            L::fetch_mut(left_view.slices_mut(), row.left),
            R::fetch_mut(right_view.slices_mut(), row.right),
        );
    }
    Ok(index.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Component;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32);

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Mass(f32);

    impl Component for Mass {
        fn type_name() -> &'static str {
            "Mass"
        }
    }

    fn tables() -> (Table, Table) {
        let mut positions = Table::new::<(Position,)>("positions").unwrap();
        let mut masses = Table::new::<(Mass,)>("masses").unwrap();
        for i in 1..=6u64 {
            positions.push_back(Entity(i), (Position(i as f32),)).unwrap();
        }
        for i in [2u64, 4, 6, 8] {
            masses.push_back(Entity(i), (Mass(i as f32 * 10.0),)).unwrap();
        }
        (positions, masses)
    }

    #[test]
    fn test_join_visits_exact_intersection() {
        let (positions, masses) = tables();
        let mut seen = Vec::new();
        let count = join::<(Position,), (Mass,), _>(&positions, &masses, |e, (p,), (m,)| {
            assert_eq!(m.0, p.0 * 10.0);
            seen.push(e);
        })
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![Entity(2), Entity(4), Entity(6)]);
    }

    #[test]
    fn test_join_leaves_row_order_untouched() {
        let (mut positions, mut masses) = tables();
        let before_p = positions.entities().to_vec();
        let before_m = masses.entities().to_vec();
        join_mut::<(Position,), (Mass,), _>(&mut positions, &mut masses, |_, (p,), (m,)| {
            p.0 += m.0;
        })
        .unwrap();
        assert_eq!(positions.entities(), before_p.as_slice());
        assert_eq!(masses.entities(), before_m.as_slice());
        assert_eq!(positions.get::<Position>(Entity(4)), Some(&Position(44.0)));
        assert_eq!(positions.get::<Position>(Entity(3)), Some(&Position(3.0)));
    }

    #[test]
    fn test_join_disjoint_tables_never_calls_body() {
        let mut a = Table::new::<(Position,)>("a").unwrap();
        let mut b = Table::new::<(Mass,)>("b").unwrap();
        a.push_back(Entity(1), (Position(0.0),)).unwrap();
        b.push_back(Entity(2), (Mass(0.0),)).unwrap();
        let count =
            join::<(Position,), (Mass,), _>(&a, &b, |_, _, _| panic!("no shared entity")).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_join_index_follows_left_order() {
        let (positions, mut masses) = tables();
        // Reorder the right table by erasing and re-adding.
        masses.erase_by_entity(Entity(2));
        masses.push_back(Entity(2), (Mass(20.0),)).unwrap();
        let index = JoinIndex::build(&positions, &masses);
        let lefts: Vec<usize> = index.rows().iter().map(|r| r.left).collect();
        assert_eq!(lefts, vec![1, 3, 5]);
        for row in index.rows() {
            assert_eq!(masses.entities()[row.right], row.entity);
        }
    }
}
