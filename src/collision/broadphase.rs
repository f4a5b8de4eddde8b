//! Broad phase collision detection algorithms
//! are responsible for detecting pairs of possibly intersecting colliders
//! for further, more accurate narrow phase inspection.

use itertools::Itertools;

use crate::entity_set::ColliderKey;

/// A broad phase algorithm.
pub trait BroadPhase {
    /// Returns pairs of potentially intersecting colliders, each unordered pair once.
    fn pairs(items: impl Iterator<Item = ColliderKey> + Clone) -> Vec<[ColliderKey; 2]>;
}

/// The simplest possible broad phase algorithm,
/// which pairs every collider with every other collider.
/// Very inefficient, but can work for small scenes.
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn pairs(items: impl Iterator<Item = ColliderKey> + Clone) -> Vec<[ColliderKey; 2]> {
        items.tuple_combinations().map(|(c1, c2)| [c1, c2]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thunderdome as td;

    #[test]
    fn every_unordered_pair_once() {
        let mut arena = td::Arena::new();
        let keys: Vec<ColliderKey> = (0..4).map(|i| ColliderKey(arena.insert(i))).collect();

        let pairs = BruteForce::pairs(keys.iter().copied());
        assert_eq!(pairs.len(), 6);
        for [a, b] in &pairs {
            assert_ne!(a, b);
            assert!(!pairs.contains(&[*b, *a]));
        }
        assert!(BruteForce::pairs(keys[..1].iter().copied()).is_empty());
    }
}
