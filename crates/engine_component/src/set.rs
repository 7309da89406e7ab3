//! Tuples of components.
//!
//! [`ComponentSet`] is implemented for tuples of one to six [`Component`]s. The
//! same tuple type plays three roles:
//!
//! - a table **schema** (`Table::new::<(Transform2D, Rigidbody)>`),
//! - a **row** of owned values passed to `Table::push_back`,
//! - a **projection** requested from `Table::view` / `Table::view_mut`.

use crate::column::{AnyColumn, Column};
use crate::component::{Component, ComponentMeta};
use crate::error::StorageError;
use crate::table::TableCapacity;

/// A statically typed group of components.
pub trait ComponentSet: Sized + 'static {
    /// One row of shared references, e.g. `(&A, &B)`.
    type Ref<'a>;
    /// One row of mutable references, e.g. `(&mut A, &mut B)`.
    type Mut<'a>;
    /// Shared column slices, e.g. `(&[A], &[B])`.
    type Slices<'a>: Copy;
    /// Mutable column slices, e.g. `(&mut [A], &mut [B])`.
    type SlicesMut<'a>;

    /// Column metadata in tuple order.
    fn metas() -> Vec<ComponentMeta>;

    /// Fresh, empty columns in tuple order.
    fn new_columns(capacity: TableCapacity) -> Vec<Box<dyn AnyColumn>>;

    /// Verify that `columns[indices[k]]` stores the `k`-th tuple type.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TypeMismatch`] on the first mismatch.
    fn check(columns: &[Box<dyn AnyColumn>], indices: &[usize]) -> Result<(), StorageError>;

    /// Append each tuple element to its column.
    ///
    /// # Errors
    ///
    /// Propagates type or capacity errors. Callers validate up front so a
    /// failure here never leaves a partially written row.
    fn push_into(
        self,
        columns: &mut [Box<dyn AnyColumn>],
        indices: &[usize],
    ) -> Result<(), StorageError>;

    /// Borrow the selected columns as shared slices.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TypeMismatch`] if a column has the wrong type.
    fn slices<'a>(
        columns: &'a [Box<dyn AnyColumn>],
        indices: &[usize],
    ) -> Result<Self::Slices<'a>, StorageError>;

    /// Borrow the selected columns as disjoint mutable slices.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateColumn`] if two tuple elements map to
    /// the same column, or [`StorageError::TypeMismatch`].
    fn slices_mut<'a>(
        columns: &'a mut [Box<dyn AnyColumn>],
        indices: &[usize],
    ) -> Result<Self::SlicesMut<'a>, StorageError>;

    /// Shared references to one row.
    fn fetch<'a>(slices: Self::Slices<'a>, row: usize) -> Self::Ref<'a>;

    /// Mutable references to one row.
    fn fetch_mut<'a, 'b>(slices: &'b mut Self::SlicesMut<'a>, row: usize) -> Self::Mut<'b>
    where
        'a: 'b;

    /// Downgrade mutable slices to shared ones.
    fn reborrow<'a, 'b>(slices: &'b Self::SlicesMut<'a>) -> Self::Slices<'b>
    where
        'a: 'b;
}

fn new_column<T: Component>(capacity: TableCapacity) -> Box<dyn AnyColumn> {
    match capacity {
        TableCapacity::Growable => Box::new(Column::<T>::new()),
        TableCapacity::Fixed(n) => Box::new(Column::<T>::with_fixed_capacity(n)),
    }
}

fn take_slice_mut<'a, T: Component>(
    slots: &mut [Option<&'a mut Box<dyn AnyColumn>>],
    index: usize,
) -> Result<&'a mut [T], StorageError> {
    let column = slots[index]
        .take()
        .ok_or(StorageError::DuplicateColumn(T::type_name()))?;
    Ok((**column).downcast_mut::<T>()?.as_mut_slice())
}

macro_rules! impl_component_set {
    ($(($T:ident, $idx:tt)),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Ref<'a> = ($(&'a $T,)+);
            type Mut<'a> = ($(&'a mut $T,)+);
            type Slices<'a> = ($(&'a [$T],)+);
            type SlicesMut<'a> = ($(&'a mut [$T],)+);

            fn metas() -> Vec<ComponentMeta> {
                vec![$($T::meta()),+]
            }

            fn new_columns(capacity: TableCapacity) -> Vec<Box<dyn AnyColumn>> {
                vec![$(new_column::<$T>(capacity)),+]
            }

            fn check(
                columns: &[Box<dyn AnyColumn>],
                indices: &[usize],
            ) -> Result<(), StorageError> {
                $( columns[indices[$idx]].downcast_ref::<$T>()?; )+
                Ok(())
            }

            fn push_into(
                self,
                columns: &mut [Box<dyn AnyColumn>],
                indices: &[usize],
            ) -> Result<(), StorageError> {
                $( columns[indices[$idx]].downcast_mut::<$T>()?.push(self.$idx)?; )+
                Ok(())
            }

            fn slices<'a>(
                columns: &'a [Box<dyn AnyColumn>],
                indices: &[usize],
            ) -> Result<Self::Slices<'a>, StorageError> {
                Ok(($( columns[indices[$idx]].downcast_ref::<$T>()?.as_slice(), )+))
            }

            fn slices_mut<'a>(
                columns: &'a mut [Box<dyn AnyColumn>],
                indices: &[usize],
            ) -> Result<Self::SlicesMut<'a>, StorageError> {
                let mut slots: Vec<Option<&'a mut Box<dyn AnyColumn>>> =
                    columns.iter_mut().map(Some).collect();
                Ok(($( take_slice_mut::<$T>(&mut slots, indices[$idx])?, )+))
            }

            fn fetch<'a>(slices: Self::Slices<'a>, row: usize) -> Self::Ref<'a> {
                ($( &slices.$idx[row], )+)
            }

            fn fetch_mut<'a, 'b>(
                slices: &'b mut Self::SlicesMut<'a>,
                row: usize,
            ) -> Self::Mut<'b>
            where
                'a: 'b,
            {
                ($( &mut slices.$idx[row], )+)
            }

            fn reborrow<'a, 'b>(slices: &'b Self::SlicesMut<'a>) -> Self::Slices<'b>
            where
                'a: 'b,
            {
                ($( &*slices.$idx, )+)
            }
        }
    };
}

impl_component_set!((A, 0));
impl_component_set!((A, 0), (B, 1));
impl_component_set!((A, 0), (B, 1), (C, 2));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_component_set!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
