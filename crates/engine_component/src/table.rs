//! Table definitions and storage.
//!
//! A [`Table`] is a named group of columns sharing one row index. Data is
//! stored in struct-of-arrays (SoA) layout: one [`Column`](crate::Column) per
//! schema entry, an entity list parallel to the columns, and an
//! `entity → row` map.
//!
//! Invariants, upheld by every method:
//!
//! - `entities[i]` owns row `i` of every column, and `rows[entities[i]] == i`.
//! - An entity has at most one row per table.
//! - All columns have the same length as `entities`.
//!
//! Removal is swap-remove: the last row moves into the hole. This keeps
//! removal O(1) but reorders rows, so row indices must never be cached
//! across a structural mutation.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::column::{AnyColumn, Column};
use crate::component::{Component, ComponentMeta, ComponentTypeId};
use crate::entity::Entity;
use crate::error::StorageError;
use crate::set::ComponentSet;
use crate::view::{View, ViewMut};

/// Column growth policy for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableCapacity {
    /// Columns grow on demand (amortised doubling).
    #[default]
    Growable,
    /// Columns reserve `n` rows up front and reject further pushes.
    Fixed(usize),
}

/// A columnar store of typed rows indexed by entity.
pub struct Table {
    name: String,
    capacity: TableCapacity,
    /// Schema, in construction order. `schema[i]` describes `columns[i]`.
    schema: Vec<ComponentMeta>,
    columns: Vec<Box<dyn AnyColumn>>,
    /// `entities[i]` corresponds to row `i` in every column.
    entities: Vec<Entity>,
    rows: HashMap<Entity, usize>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("schema", &self.schema)
            .field("len", &self.entities.len())
            .finish()
    }
}

impl Table {
    /// Create an empty, growable table with schema `S`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateColumn`] if `S` lists a component twice.
    pub fn new<S: ComponentSet>(name: impl Into<String>) -> Result<Self, StorageError> {
        Self::with_capacity::<S>(name, TableCapacity::Growable)
    }

    /// Create an empty table with schema `S` and the given growth policy.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateColumn`] if `S` lists a component twice.
    pub fn with_capacity<S: ComponentSet>(
        name: impl Into<String>,
        capacity: TableCapacity,
    ) -> Result<Self, StorageError> {
        let schema = S::metas();
        for (i, meta) in schema.iter().enumerate() {
            if schema[..i].iter().any(|m| m.type_id == meta.type_id) {
                return Err(StorageError::DuplicateColumn(meta.name));
            }
        }
        let entities = match capacity {
            TableCapacity::Growable => Vec::new(),
            TableCapacity::Fixed(n) => Vec::with_capacity(n),
        };
        let name = name.into();
        trace!(
            table = %name,
            columns = schema.len(),
            row_bytes = schema.iter().map(|m| m.size).sum::<usize>(),
            "table created"
        );
        Ok(Self {
            name,
            capacity,
            schema,
            columns: S::new_columns(capacity),
            entities,
            rows: HashMap::new(),
        })
    }

    /// An empty table with the same name, schema and capacity policy.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            capacity: self.capacity,
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.empty_like()).collect(),
            entities: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column schema.
    #[must_use]
    pub fn schema(&self) -> &[ComponentMeta] {
        &self.schema
    }

    /// Bytes of component data per row, summed over the schema.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.schema.iter().map(|meta| meta.size).sum()
    }

    /// The growth policy.
    #[must_use]
    pub fn capacity(&self) -> TableCapacity {
        self.capacity
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if this table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in row order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// O(1) membership test.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.rows.contains_key(&entity)
    }

    /// The current row of `entity`. Invalidated by the next insert or erase.
    #[must_use]
    pub fn row_of(&self, entity: Entity) -> Option<usize> {
        self.rows.get(&entity).copied()
    }

    /// Returns `true` if the schema contains component `T`.
    #[must_use]
    pub fn has_column<T: Component>(&self) -> bool {
        self.column_index(T::component_type_id()).is_some()
    }

    fn column_index(&self, type_id: ComponentTypeId) -> Option<usize> {
        self.schema.iter().position(|m| m.type_id == type_id)
    }

    /// Map each entry of `metas` to its column, rejecting duplicates and
    /// components outside the schema.
    pub(crate) fn resolve(&self, metas: &[ComponentMeta]) -> Result<Vec<usize>, StorageError> {
        let mut indices = Vec::with_capacity(metas.len());
        for meta in metas {
            let index =
                self.column_index(meta.type_id)
                    .ok_or_else(|| StorageError::MissingColumn {
                        table: self.name.clone(),
                        component: meta.name,
                    })?;
            if indices.contains(&index) {
                return Err(StorageError::DuplicateColumn(meta.name));
            }
            indices.push(index);
        }
        Ok(indices)
    }

    /// Append one row for `entity`, one value per schema column.
    ///
    /// The tuple may list the schema's components in any order.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SchemaMismatch`] if the value count differs from the schema.
    /// - [`StorageError::MissingColumn`] if a value's type is not in the schema.
    /// - [`StorageError::DuplicateEntity`] if `entity` already has a row.
    /// - [`StorageError::CapacityExceeded`] if the table is fixed-size and full.
    ///
    /// On error the table is unchanged.
    pub fn push_back<S: ComponentSet>(&mut self, entity: Entity, values: S) -> Result<(), StorageError> {
        let metas = S::metas();
        if metas.len() != self.schema.len() {
            return Err(StorageError::SchemaMismatch {
                table: self.name.clone(),
                expected: self.schema.len(),
                found: metas.len(),
            });
        }
        let indices = self.resolve(&metas)?;
        S::check(&self.columns, &indices)?;
        if self.rows.contains_key(&entity) {
            return Err(StorageError::DuplicateEntity {
                table: self.name.clone(),
                entity,
            });
        }
        if let TableCapacity::Fixed(capacity) = self.capacity
            && self.entities.len() >= capacity
        {
            warn!(table = %self.name, capacity, "table is full, row rejected");
            return Err(StorageError::CapacityExceeded {
                column: self.schema[0].name,
                capacity,
            });
        }

        values.push_into(&mut self.columns, &indices)?;
        let row = self.entities.len();
        self.entities.push(entity);
        self.rows.insert(entity, row);
        trace!(table = %self.name, %entity, row, "row pushed");
        Ok(())
    }

    /// Swap-remove the row owned by `entity`.
    ///
    /// Returns `false` (and changes nothing) if the entity has no row.
    pub fn erase_by_entity(&mut self, entity: Entity) -> bool {
        let Some(row) = self.rows.remove(&entity) else {
            return false;
        };
        for column in &mut self.columns {
            column.swap_remove_row(row);
        }
        self.entities.swap_remove(row);
        // The former last row now lives at `row`.
        if let Some(&moved) = self.entities.get(row) {
            self.rows.insert(moved, row);
        }
        trace!(table = %self.name, %entity, row, "row erased");
        true
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
        self.entities.clear();
        self.rows.clear();
    }

    /// The typed column for `T`.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingColumn`] or [`StorageError::TypeMismatch`].
    pub fn column<T: Component>(&self) -> Result<&Column<T>, StorageError> {
        let index = self.resolve(&[T::meta()])?[0];
        self.columns[index].downcast_ref::<T>()
    }

    /// The typed column for `T`, mutably. Values may be edited in place but
    /// rows cannot be added or removed through it.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingColumn`] or [`StorageError::TypeMismatch`].
    pub fn column_slice_mut<T: Component>(&mut self) -> Result<&mut [T], StorageError> {
        let index = self.resolve(&[T::meta()])?[0];
        Ok(self.columns[index].downcast_mut::<T>()?.as_mut_slice())
    }

    /// The `T` component of `entity`, or `None` if the entity has no row here
    /// (or the table has no `T` column).
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let row = self.row_of(entity)?;
        self.column::<T>().ok()?.get(row).ok()
    }

    /// Mutable counterpart of [`Table::get`].
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let row = self.row_of(entity)?;
        let index = self.column_index(T::component_type_id())?;
        self.columns[index]
            .downcast_mut::<T>()
            .ok()?
            .get_mut(row)
            .ok()
    }

    /// Like [`Table::get`] but distinguishes *why* the lookup failed.
    ///
    /// # Errors
    ///
    /// [`StorageError::EntityMissing`], [`StorageError::MissingColumn`] or
    /// [`StorageError::TypeMismatch`].
    pub fn try_get<T: Component>(&self, entity: Entity) -> Result<&T, StorageError> {
        let column = self.column::<T>()?;
        let row = self.row_of(entity).ok_or_else(|| StorageError::EntityMissing {
            table: self.name.clone(),
            entity,
        })?;
        column.get(row)
    }

    /// Shared references to several components of one entity.
    #[must_use]
    pub fn get_set<S: ComponentSet>(&self, entity: Entity) -> Option<S::Ref<'_>> {
        let row = self.row_of(entity)?;
        let indices = self.resolve(&S::metas()).ok()?;
        let slices = S::slices(&self.columns, &indices).ok()?;
        Some(S::fetch(slices, row))
    }

    /// A read-only projection over the columns named by `S`.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingColumn`], [`StorageError::DuplicateColumn`] or
    /// [`StorageError::TypeMismatch`].
    pub fn view<S: ComponentSet>(&self) -> Result<View<'_, S>, StorageError> {
        let indices = self.resolve(&S::metas())?;
        let slices = S::slices(&self.columns, &indices)?;
        Ok(View::new(&self.entities, &self.rows, slices))
    }

    /// A read/write projection over the columns named by `S`.
    ///
    /// The view mutably borrows the table, so no row can be inserted or
    /// erased while it is alive.
    ///
    /// # Errors
    ///
    /// [`StorageError::MissingColumn`], [`StorageError::DuplicateColumn`] or
    /// [`StorageError::TypeMismatch`].
    pub fn view_mut<S: ComponentSet>(&mut self) -> Result<ViewMut<'_, S>, StorageError> {
        let indices = self.resolve(&S::metas())?;
        let slices = S::slices_mut(&mut self.columns, &indices)?;
        Ok(ViewMut::new(&self.entities, &self.rows, slices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32, f32);

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(u32);

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tag;

    impl Component for Tag {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    fn make_table() -> Table {
        Table::new::<(Position, Health)>("actors").unwrap()
    }

    #[test]
    fn test_push_and_read_back() {
        let mut table = make_table();
        for i in 1..=3 {
            table
                .push_back(Entity(i), (Position(i as f32, 0.0), Health(i as u32 * 10)))
                .unwrap();
            assert_eq!(table.len(), i as usize);
        }
        assert_eq!(table.get::<Position>(Entity(2)), Some(&Position(2.0, 0.0)));
        assert_eq!(table.get::<Health>(Entity(3)), Some(&Health(30)));
        assert!(table.contains(Entity(1)));
    }

    #[test]
    fn test_row_size_sums_schema() {
        let table = make_table();
        assert_eq!(
            table.row_size(),
            std::mem::size_of::<Position>() + std::mem::size_of::<Health>()
        );
    }

    #[test]
    fn test_push_accepts_any_tuple_order() {
        let mut table = make_table();
        table
            .push_back(Entity(1), (Health(5), Position(1.0, 2.0)))
            .unwrap();
        assert_eq!(table.get::<Health>(Entity(1)), Some(&Health(5)));
        assert_eq!(table.get::<Position>(Entity(1)), Some(&Position(1.0, 2.0)));
    }

    #[test]
    fn test_push_schema_mismatch() {
        let mut table = make_table();
        let err = table.push_back(Entity(1), (Health(1),)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::SchemaMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
        let err = table.push_back(Entity(1), (Health(1), Tag)).unwrap_err();
        assert!(matches!(err, StorageError::MissingColumn { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_push_duplicate_entity() {
        let mut table = make_table();
        table.push_back(Entity(1), (Position(0.0, 0.0), Health(1))).unwrap();
        let err = table
            .push_back(Entity(1), (Position(1.0, 1.0), Health(2)))
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateEntity { .. }));
        assert_eq!(table.get::<Health>(Entity(1)), Some(&Health(1)));
    }

    #[test]
    fn test_duplicate_schema_rejected() {
        let err = Table::new::<(Health, Health)>("bad").unwrap_err();
        assert_eq!(err, StorageError::DuplicateColumn("Health"));
    }

    #[test]
    fn test_swap_remove_preserves_other_rows() {
        let mut table = make_table();
        for i in 1..=4 {
            table
                .push_back(Entity(i), (Position(i as f32, 0.0), Health(i as u32)))
                .unwrap();
        }
        assert!(table.erase_by_entity(Entity(2)));
        assert!(!table.contains(Entity(2)));
        assert_eq!(table.len(), 3);
        // Entity 4 moved into row 1.
        assert_eq!(table.row_of(Entity(4)), Some(1));
        for i in [1u64, 3, 4] {
            assert_eq!(table.get::<Position>(Entity(i)), Some(&Position(i as f32, 0.0)));
            assert_eq!(table.get::<Health>(Entity(i)), Some(&Health(i as u32)));
        }
    }

    #[test]
    fn test_remove_last_is_truncation() {
        let mut table = make_table();
        for i in 1..=3 {
            table
                .push_back(Entity(i), (Position(0.0, 0.0), Health(i as u32)))
                .unwrap();
        }
        assert!(table.erase_by_entity(Entity(3)));
        assert_eq!(table.entities(), &[Entity(1), Entity(2)]);
        assert_eq!(table.row_of(Entity(1)), Some(0));
        assert_eq!(table.row_of(Entity(2)), Some(1));
    }

    #[test]
    fn test_erase_absent_entity() {
        let mut table = make_table();
        table.push_back(Entity(1), (Position(0.0, 0.0), Health(1))).unwrap();
        assert!(!table.erase_by_entity(Entity(9)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fixed_capacity_overflow() {
        let mut table =
            Table::with_capacity::<(Position, Health)>("small", TableCapacity::Fixed(2)).unwrap();
        table.push_back(Entity(1), (Position(1.0, 1.0), Health(1))).unwrap();
        table.push_back(Entity(2), (Position(2.0, 2.0), Health(2))).unwrap();
        let err = table
            .push_back(Entity(3), (Position(3.0, 3.0), Health(3)))
            .unwrap_err();
        assert!(matches!(err, StorageError::CapacityExceeded { capacity: 2, .. }));
        assert_eq!(table.len(), 2);
        assert!(!table.contains(Entity(3)));
        assert_eq!(table.get::<Health>(Entity(2)), Some(&Health(2)));
    }

    #[test]
    fn test_get_absent_and_try_get() {
        let mut table = make_table();
        table.push_back(Entity(1), (Position(0.0, 0.0), Health(7))).unwrap();
        assert!(table.get::<Health>(Entity(2)).is_none());
        assert!(table.get::<Tag>(Entity(1)).is_none());
        assert!(matches!(
            table.try_get::<Health>(Entity(2)),
            Err(StorageError::EntityMissing { .. })
        ));
        assert!(matches!(
            table.try_get::<Tag>(Entity(1)),
            Err(StorageError::MissingColumn { .. })
        ));
        assert_eq!(table.try_get::<Health>(Entity(1)), Ok(&Health(7)));
    }

    #[test]
    fn test_get_mut_and_get_set() {
        let mut table = make_table();
        table.push_back(Entity(1), (Position(0.0, 0.0), Health(7))).unwrap();
        table.get_mut::<Health>(Entity(1)).unwrap().0 = 8;
        let (pos, health) = table.get_set::<(Position, Health)>(Entity(1)).unwrap();
        assert_eq!(*pos, Position(0.0, 0.0));
        assert_eq!(*health, Health(8));
    }

    #[test]
    fn test_clear_and_empty_like() {
        let mut table = make_table();
        table.push_back(Entity(1), (Position(0.0, 0.0), Health(7))).unwrap();
        let copy = table.empty_like();
        assert!(copy.is_empty());
        assert_eq!(copy.schema(), table.schema());
        table.clear();
        assert!(table.is_empty());
        assert!(!table.contains(Entity(1)));
    }
}
