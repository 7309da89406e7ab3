//! # engine_component
//!
//! The storage engine. Defines what a component is, how rows of components
//! are stored in columnar tables, and how systems read them back.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the contract all table data must satisfy.
//! - [`Entity`]: lightweight `u64` entity identifiers.
//! - [`EntityAllocator`]: monotonically increasing, namespaced ID allocator.
//! - [`Column`]: a typed, packed buffer for one component type.
//! - [`Table`]: SoA storage for a fixed schema with O(1) swap-remove.
//! - [`View`] / [`ViewMut`]: zero-copy projections over table columns.
//! - [`join`] / [`join_mut`]: index-mapping joins across two tables.
//! - [`hierarchy_order`]: parent-before-child visitation order.

pub mod column;
pub mod component;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod join;
pub mod set;
pub mod table;
pub mod view;

pub use column::{AnyColumn, Column};
pub use component::{Component, ComponentMeta, ComponentTypeId};
pub use entity::{Entity, EntityAllocator, next_entity, reset_entity_counter};
pub use error::StorageError;
pub use hierarchy::hierarchy_order;
pub use join::{JoinIndex, JoinRow, join, join_mut};
pub use set::ComponentSet;
pub use table::{Table, TableCapacity};
pub use view::{View, ViewIter, ViewMut};
