//! Zero-copy projections over table columns.
//!
//! A [`View`] (read-only) or [`ViewMut`] (read/write) holds slices into some
//! of a table's columns plus a reference to its entity map. Views borrow the
//! table they came from, so the borrow checker rejects any `push_back` or
//! `erase_by_entity` while a view is alive: a view can never observe rows
//! being reordered underneath it.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::set::ComponentSet;

/// A read-only projection over the columns named by `S`.
pub struct View<'t, S: ComponentSet> {
    entities: &'t [Entity],
    rows: &'t HashMap<Entity, usize>,
    slices: S::Slices<'t>,
}

impl<'t, S: ComponentSet> Clone for View<'t, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'t, S: ComponentSet> Copy for View<'t, S> {}

impl<'t, S: ComponentSet> View<'t, S> {
    pub(crate) fn new(
        entities: &'t [Entity],
        rows: &'t HashMap<Entity, usize>,
        slices: S::Slices<'t>,
    ) -> Self {
        Self {
            entities,
            rows,
            slices,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in row order.
    #[must_use]
    pub fn entities(&self) -> &'t [Entity] {
        self.entities
    }

    /// Returns `true` if `entity` has a row.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Row index of `entity`.
    #[must_use]
    pub fn row_of(&self, entity: Entity) -> Option<usize> {
        self.rows.get(&entity).copied()
    }

    /// The raw column slices.
    #[must_use]
    pub fn slices(&self) -> S::Slices<'t> {
        self.slices
    }

    /// The entity and components at row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<(Entity, S::Ref<'t>)> {
        let entity = *self.entities.get(index)?;
        Some((entity, S::fetch(self.slices, index)))
    }

    /// The components of `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<S::Ref<'t>> {
        let row = self.row_of(entity)?;
        Some(S::fetch(self.slices, row))
    }

    /// Iterate `(entity, components)` in row order.
    #[must_use]
    pub fn iter(&self) -> ViewIter<'t, S> {
        ViewIter {
            view: *self,
            next: 0,
        }
    }
}

impl<'t, S: ComponentSet> IntoIterator for View<'t, S> {
    type Item = (Entity, S::Ref<'t>);
    type IntoIter = ViewIter<'t, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lockstep iterator over a [`View`].
pub struct ViewIter<'t, S: ComponentSet> {
    view: View<'t, S>,
    next: usize,
}

impl<'t, S: ComponentSet> Iterator for ViewIter<'t, S> {
    type Item = (Entity, S::Ref<'t>);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.view.row(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'t, S: ComponentSet> ExactSizeIterator for ViewIter<'t, S> {}

/// A read/write projection over the columns named by `S`.
pub struct ViewMut<'t, S: ComponentSet> {
    entities: &'t [Entity],
    rows: &'t HashMap<Entity, usize>,
    slices: S::SlicesMut<'t>,
}

impl<'t, S: ComponentSet> ViewMut<'t, S> {
    pub(crate) fn new(
        entities: &'t [Entity],
        rows: &'t HashMap<Entity, usize>,
        slices: S::SlicesMut<'t>,
    ) -> Self {
        Self {
            entities,
            rows,
            slices,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in row order.
    #[must_use]
    pub fn entities(&self) -> &'t [Entity] {
        self.entities
    }

    /// Returns `true` if `entity` has a row.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Row index of `entity`.
    #[must_use]
    pub fn row_of(&self, entity: Entity) -> Option<usize> {
        self.rows.get(&entity).copied()
    }

    /// A read-only view borrowing this one.
    #[must_use]
    pub fn as_view(&self) -> View<'_, S> {
        View::new(self.entities, self.rows, S::reborrow(&self.slices))
    }

    /// The raw mutable column slices, e.g. for splitting two rows apart.
    pub fn slices_mut(&mut self) -> &mut S::SlicesMut<'t> {
        &mut self.slices
    }

    /// The components of `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<S::Ref<'_>> {
        let row = self.row_of(entity)?;
        Some(S::fetch(S::reborrow(&self.slices), row))
    }

    /// The components of `entity`, mutably.
    pub fn get_mut(&mut self, entity: Entity) -> Option<S::Mut<'_>> {
        let row = self.row_of(entity)?;
        Some(S::fetch_mut(&mut self.slices, row))
    }

    /// The components at row `index`, mutably.
    pub fn row_mut(&mut self, index: usize) -> Option<(Entity, S::Mut<'_>)> {
        let entity = *self.entities.get(index)?;
        Some((entity, S::fetch_mut(&mut self.slices, index)))
    }

    /// Call `f` on every row in order.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(Entity, S::Mut<'_>),
    {
        for (row, &entity) in self.entities.iter().enumerate() {
            f(entity, S::fetch_mut(&mut self.slices, row));
        }
    }
}
