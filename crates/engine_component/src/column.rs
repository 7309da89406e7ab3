//! Typed column storage.
//!
//! A [`Column<T>`] is a packed, contiguous buffer of one component type. Tables
//! hold their columns behind the object-safe [`AnyColumn`] trait so that rows
//! can be swapped and removed without knowing `T`; typed access goes through a
//! checked downcast.

use std::any::Any;

use crate::component::{Component, ComponentMeta};
use crate::error::StorageError;

/// A homogeneous, append / swap-remove buffer for a single component type.
///
/// By default the column grows geometrically. A column built with
/// [`Column::with_fixed_capacity`] reserves its storage up front and refuses
/// pushes past that ceiling, which keeps element addresses stable for the
/// column's whole lifetime.
#[derive(Debug, Clone)]
pub struct Column<T> {
    data: Vec<T>,
    /// Hard ceiling, if any.
    limit: Option<usize>,
}

impl<T: Component> Column<T> {
    /// Create a new empty, growable column.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            limit: None,
        }
    }

    /// Create a column that holds at most `capacity` rows.
    #[must_use]
    pub fn with_fixed_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            limit: Some(capacity),
        }
    }

    /// Returns the number of rows stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if this column contains no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the hard ceiling, or `None` for a growable column.
    #[must_use]
    pub fn fixed_capacity(&self) -> Option<usize> {
        self.limit
    }

    /// Append a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::CapacityExceeded`] if the column is fixed-size
    /// and already full. The column is left untouched.
    pub fn push(&mut self, value: T) -> Result<(), StorageError> {
        if let Some(capacity) = self.limit
            && self.data.len() >= capacity
        {
            return Err(StorageError::CapacityExceeded {
                column: T::type_name(),
                capacity,
            });
        }
        self.data.push(value);
        Ok(())
    }

    /// Get a reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOutOfRange`] past the end of the column.
    pub fn get(&self, index: usize) -> Result<&T, StorageError> {
        let len = self.data.len();
        self.data
            .get(index)
            .ok_or(StorageError::IndexOutOfRange { index, len })
    }

    /// Get a mutable reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOutOfRange`] past the end of the column.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, StorageError> {
        let len = self.data.len();
        self.data
            .get_mut(index)
            .ok_or(StorageError::IndexOutOfRange { index, len })
    }

    /// Exchange two rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOutOfRange`] if either index is invalid.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), StorageError> {
        let len = self.data.len();
        for index in [i, j] {
            if index >= len {
                return Err(StorageError::IndexOutOfRange { index, len });
            }
        }
        self.data.swap(i, j);
        Ok(())
    }

    /// Remove and return the last row.
    pub fn pop(&mut self) -> Option<T> {
        self.data.pop()
    }

    /// Move the last row into `index` and return the value that was there.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOutOfRange`] if `index` is invalid.
    pub fn swap_remove(&mut self, index: usize) -> Result<T, StorageError> {
        let len = self.data.len();
        if index >= len {
            return Err(StorageError::IndexOutOfRange { index, len });
        }
        Ok(self.data.swap_remove(index))
    }

    /// The rows as a contiguous slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The rows as a contiguous mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate the rows in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`Column<T>`] used by [`Table`](crate::Table).
pub trait AnyColumn: Send + Sync {
    /// Schema metadata of the stored component.
    fn meta(&self) -> ComponentMeta;

    /// The Rust type name of the stored component, for diagnostics.
    fn rust_type_name(&self) -> &'static str;

    /// Number of rows.
    fn len(&self) -> usize;

    /// Returns `true` if there are no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many more rows fit, or `None` if the column grows on demand.
    fn remaining_capacity(&self) -> Option<usize>;

    /// Swap-remove a row, dropping its value.
    fn swap_remove_row(&mut self, row: usize);

    /// Drop every row.
    fn clear(&mut self);

    /// An empty column of the same type and capacity policy.
    fn empty_like(&self) -> Box<dyn AnyColumn>;

    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyColumn for Column<T> {
    fn meta(&self) -> ComponentMeta {
        T::meta()
    }

    fn rust_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn remaining_capacity(&self) -> Option<usize> {
        self.limit.map(|cap| cap.saturating_sub(self.data.len()))
    }

    fn swap_remove_row(&mut self, row: usize) {
        if row < self.data.len() {
            self.data.swap_remove(row);
        }
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn empty_like(&self) -> Box<dyn AnyColumn> {
        match self.limit {
            Some(capacity) => Box::new(Column::<T>::with_fixed_capacity(capacity)),
            None => Box::new(Column::<T>::new()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AnyColumn {
    /// Recover the typed column.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TypeMismatch`] if the column does not store `T`.
    pub fn downcast_ref<T: Component>(&self) -> Result<&Column<T>, StorageError> {
        let found = self.rust_type_name();
        self.as_any()
            .downcast_ref::<Column<T>>()
            .ok_or(StorageError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    /// Recover the typed column mutably.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TypeMismatch`] if the column does not store `T`.
    pub fn downcast_mut<T: Component>(&mut self) -> Result<&mut Column<T>, StorageError> {
        let found = self.rust_type_name();
        self.as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or(StorageError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Mass(f32);

    impl Component for Mass {
        fn type_name() -> &'static str {
            "Mass"
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Charge(i32);

    impl Component for Charge {
        fn type_name() -> &'static str {
            "Charge"
        }
    }

    #[test]
    fn test_column_push_and_get() {
        let mut col = Column::<Mass>::new();
        col.push(Mass(3.5)).unwrap();
        assert_eq!(col.len(), 1);
        assert_eq!(*col.get(0).unwrap(), Mass(3.5));
        assert!(matches!(
            col.get(1),
            Err(StorageError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_fixed_capacity_rejects_overflow_without_corruption() {
        let mut col = Column::<Mass>::with_fixed_capacity(2);
        col.push(Mass(1.0)).unwrap();
        col.push(Mass(2.0)).unwrap();
        let err = col.push(Mass(3.0)).unwrap_err();
        assert_eq!(
            err,
            StorageError::CapacityExceeded {
                column: "Mass",
                capacity: 2
            }
        );
        assert_eq!(col.as_slice(), &[Mass(1.0), Mass(2.0)]);
    }

    #[test]
    fn test_swap_and_pop() {
        let mut col = Column::<Mass>::new();
        for v in [1.0, 2.0, 3.0] {
            col.push(Mass(v)).unwrap();
        }
        col.swap(0, 2).unwrap();
        assert_eq!(col.as_slice(), &[Mass(3.0), Mass(2.0), Mass(1.0)]);
        assert_eq!(col.pop(), Some(Mass(1.0)));
        assert!(col.swap(0, 5).is_err());
    }

    #[test]
    fn test_swap_remove_moves_last_row() {
        let mut col = Column::<Mass>::new();
        for v in [1.0, 2.0, 3.0] {
            col.push(Mass(v)).unwrap();
        }
        assert_eq!(col.swap_remove(0).unwrap(), Mass(1.0));
        assert_eq!(col.as_slice(), &[Mass(3.0), Mass(2.0)]);
    }

    #[test]
    fn test_downcast_type_mismatch() {
        let col: Box<dyn AnyColumn> = Box::new(Column::<Mass>::new());
        assert!(col.downcast_ref::<Mass>().is_ok());
        let err = col.downcast_ref::<Charge>().unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { .. }));
    }

    #[test]
    fn test_remaining_capacity() {
        let mut col = Column::<Charge>::with_fixed_capacity(3);
        col.push(Charge(1)).unwrap();
        let erased: &dyn AnyColumn = &col;
        assert_eq!(erased.remaining_capacity(), Some(2));
        let growable: Box<dyn AnyColumn> = Box::new(Column::<Charge>::new());
        assert_eq!(growable.remaining_capacity(), None);
    }
}
