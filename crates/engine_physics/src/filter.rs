//! Tag/mask collision filtering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What a body is (`tags`) and what it will collide with (`mask`).
///
/// An empty mask accepts every body; a non-empty mask accepts only bodies
/// carrying at least one of its tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub tags: BTreeSet<String>,
    pub mask: BTreeSet<String>,
}

impl CollisionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn with_mask(mut self, tag: impl Into<String>) -> Self {
        self.mask.insert(tag.into());
        self
    }

    fn accepts(&self, other: &CollisionFilter) -> bool {
        self.mask.is_empty() || !self.mask.is_disjoint(&other.tags)
    }

    /// Each side's mask must accept the other side's tags.
    #[must_use]
    pub fn compatible(&self, other: &CollisionFilter) -> bool {
        self.accepts(other) && other.accepts(self)
    }
}
