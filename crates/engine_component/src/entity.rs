//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight `u64` identifier with no inherent data.
//! Entities are never destroyed by the storage layer; they simply stop
//! appearing in any [`Table`](crate::Table).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Number of low bits that hold the per-namespace sequence number.
const SEQUENCE_BITS: u32 = 48;

/// A unique entity identifier.
///
/// Entities are pure identifiers and carry no data of their own. Components
/// are attached to entities by pushing rows into tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The null / invalid entity sentinel.
    pub const INVALID: Entity = Entity(0);

    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns the namespace this entity was allocated in.
    #[must_use]
    pub const fn namespace(self) -> u16 {
        (self.0 >> SEQUENCE_BITS) as u16
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity IDs.
///
/// Each allocator owns a 16-bit namespace stored in the high bits of every ID
/// it hands out, so independently simulated worlds (or parallel tests) never
/// produce colliding entities.
#[derive(Debug)]
pub struct EntityAllocator {
    namespace: u16,
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator in namespace 0. IDs start at 1 (0 is reserved
    /// for [`Entity::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self::namespaced(0)
    }

    /// Creates an allocator whose IDs carry the given namespace.
    #[must_use]
    pub fn namespaced(namespace: u16) -> Self {
        Self {
            namespace,
            next_id: 1,
        }
    }

    /// Allocates a fresh entity ID.
    pub fn allocate(&mut self) -> Entity {
        let id = self.next_id;
        self.next_id += 1;
        Entity((u64::from(self.namespace) << SEQUENCE_BITS) | id)
    }

    /// Returns the number of entities allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_GLOBAL_ENTITY: AtomicU64 = AtomicU64::new(1);

/// Allocates an entity from the process-wide counter.
///
/// Scene code that does not want to thread an [`EntityAllocator`] around can
/// use this. IDs are strictly increasing for the lifetime of the process (or
/// until [`reset_entity_counter`] is called).
pub fn next_entity() -> Entity {
    Entity(NEXT_GLOBAL_ENTITY.fetch_add(1, Ordering::Relaxed))
}

/// Resets the process-wide counter so the next call to [`next_entity`]
/// returns `next`.
///
/// Passing `0` is clamped to `1` to keep [`Entity::INVALID`] reserved.
pub fn reset_entity_counter(next: u64) {
    NEXT_GLOBAL_ENTITY.store(next.max(1), Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let e = Entity::from_raw(42);
        assert_eq!(e.id(), 42);
        assert!(e.is_valid());
    }

    #[test]
    fn test_entity_invalid() {
        assert!(!Entity::INVALID.is_valid());
        assert_eq!(Entity::INVALID.id(), 0);
    }

    #[test]
    fn test_allocator_produces_unique_ids() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        let e3 = alloc.allocate();
        assert_eq!(e1.id(), 1);
        assert_eq!(e2.id(), 2);
        assert_eq!(e3.id(), 3);
        assert_eq!(alloc.count(), 3);
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let mut a = EntityAllocator::namespaced(1);
        let mut b = EntityAllocator::namespaced(2);
        let ea = a.allocate();
        let eb = b.allocate();
        assert_ne!(ea, eb);
        assert_eq!(ea.namespace(), 1);
        assert_eq!(eb.namespace(), 2);
        assert!(ea < eb);
    }

    #[test]
    fn test_global_counter_is_strictly_increasing() {
        let e1 = next_entity();
        let e2 = next_entity();
        assert!(e2 > e1);
        assert!(e1.is_valid());
    }
}
