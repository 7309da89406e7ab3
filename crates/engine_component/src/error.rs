//! Storage-layer error types.

use crate::entity::Entity;

/// Errors that can occur while mutating or reading tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A fixed-capacity column is full.
    #[error("column '{column}' is full (capacity {capacity})")]
    CapacityExceeded {
        /// Component name of the full column.
        column: &'static str,
        /// The declared capacity.
        capacity: usize,
    },

    /// A typed access named a different Rust type than the column stores.
    #[error("type mismatch: column stores '{found}', accessed as '{expected}'")]
    TypeMismatch {
        /// The type the caller asked for.
        expected: &'static str,
        /// The type the column actually holds.
        found: &'static str,
    },

    /// A pushed row does not match the table schema.
    #[error("schema mismatch on table '{table}': expected {expected} columns, got {found}")]
    SchemaMismatch {
        /// Table name.
        table: String,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// The same component type appears twice in one schema or view.
    #[error("component '{0}' listed more than once")]
    DuplicateColumn(&'static str),

    /// The table has no column for the requested component.
    #[error("table '{table}' has no column '{component}'")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Component name.
        component: &'static str,
    },

    /// The entity already owns a row in this table.
    #[error("{entity} already has a row in table '{table}'")]
    DuplicateEntity {
        /// Table name.
        table: String,
        /// The offending entity.
        entity: Entity,
    },

    /// The entity has no row in this table.
    #[error("{entity} is missing from table '{table}'")]
    EntityMissing {
        /// Table name.
        table: String,
        /// The missing entity.
        entity: Entity,
    },

    /// A row index is past the end of a column.
    #[error("row index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested row.
        index: usize,
        /// Current column length.
        len: usize,
    },

    /// A parent relation loops back on itself.
    #[error("parent relation of {0} forms a cycle")]
    HierarchyCycle(Entity),
}
