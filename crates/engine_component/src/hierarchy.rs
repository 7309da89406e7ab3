//! Parent-before-child linearisation of a parent relation.
//!
//! Given `(entity, parent)` pairs, [`hierarchy_order`] returns a permutation
//! of the input indices in which every parent is visited strictly before its
//! children. Entities are bucketed by depth ("layer") and each layer is
//! threaded into a singly linked path as it is encountered; the layers are
//! then spliced head-to-tail so one walk visits layer 0, then layer 1, and so
//! on without rescanning the input.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::StorageError;

const NONE: usize = usize::MAX;

/// Linearise `links` so parents precede children.
///
/// `links[i]` is `(entity, parent)`. An entity that is its own parent, or
/// whose parent is not listed, is a root (layer 0). Input is normally already
/// parent-first; a child listed before its parent is still placed correctly.
///
/// Runs in O(n) time with O(n) auxiliary space.
///
/// # Errors
///
/// Returns [`StorageError::HierarchyCycle`] if following parents from some
/// entity never reaches a root.
pub fn hierarchy_order(links: &[(Entity, Entity)]) -> Result<Vec<usize>, StorageError> {
    let n = links.len();
    let index: HashMap<Entity, usize> = links
        .iter()
        .enumerate()
        .map(|(i, &(entity, _))| (entity, i))
        .collect();

    let parent_of = |i: usize| -> Option<usize> {
        let (entity, parent) = links[i];
        if parent == entity {
            None
        } else {
            index.get(&parent).copied()
        }
    };

    let mut layer = vec![NONE; n];
    let mut next = vec![NONE; n];
    let mut heads: Vec<usize> = Vec::new();
    let mut tails: Vec<usize> = Vec::new();
    let mut chain = Vec::new();

    for i in 0..n {
        if layer[i] == NONE {
            // Walk up until a root or an already-layered ancestor.
            chain.clear();
            let mut cursor = i;
            let base = loop {
                chain.push(cursor);
                if chain.len() > n {
                    return Err(StorageError::HierarchyCycle(links[i].0));
                }
                match parent_of(cursor) {
                    None => break 0,
                    Some(p) if layer[p] != NONE => break layer[p] + 1,
                    Some(p) => cursor = p,
                }
            };
            // `chain` runs child → topmost unlayered ancestor.
            for (offset, &member) in chain.iter().rev().enumerate() {
                layer[member] = base + offset;
            }
        }

        let l = layer[i];
        while tails.len() <= l {
            heads.push(NONE);
            tails.push(NONE);
        }
        if tails[l] == NONE {
            heads[l] = i;
        } else {
            next[tails[l]] = i;
        }
        tails[l] = i;
    }

    for l in 1..heads.len() {
        next[tails[l - 1]] = heads[l];
    }

    let mut order = Vec::with_capacity(n);
    let mut cursor = heads.first().copied().unwrap_or(NONE);
    while cursor != NONE {
        order.push(cursor);
        cursor = next[cursor];
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[usize], i: usize) -> usize {
        order.iter().position(|&x| x == i).unwrap()
    }

    #[test]
    fn test_three_level_chain() {
        let root = Entity(1);
        let child = Entity(2);
        let grandchild = Entity(3);
        let links = [(root, root), (child, root), (grandchild, child)];
        let order = hierarchy_order(&links).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_layers_are_grouped() {
        // Two trees interleaved: 1 → 3 → 5, 2 → 4.
        let links = [
            (Entity(1), Entity(1)),
            (Entity(2), Entity(2)),
            (Entity(3), Entity(1)),
            (Entity(4), Entity(2)),
            (Entity(5), Entity(3)),
        ];
        let order = hierarchy_order(&links).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let links = [
            (Entity(3), Entity(2)),
            (Entity(2), Entity(1)),
            (Entity(1), Entity(1)),
        ];
        let order = hierarchy_order(&links).unwrap();
        assert_eq!(order.len(), 3);
        assert!(position(&order, 2) < position(&order, 1));
        assert!(position(&order, 1) < position(&order, 0));
    }

    #[test]
    fn test_unknown_parent_is_root() {
        let links = [(Entity(5), Entity(99)), (Entity(6), Entity(5))];
        let order = hierarchy_order(&links).unwrap();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let links = [(Entity(1), Entity(2)), (Entity(2), Entity(1))];
        assert!(matches!(
            hierarchy_order(&links),
            Err(StorageError::HierarchyCycle(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(hierarchy_order(&[]).unwrap().is_empty());
    }
}
