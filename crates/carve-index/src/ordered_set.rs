//! Ordered-set abstraction backing each shard.
//!
//! The concrete set type is injected through an [`OrderedSetFactory`] so
//! that the tree implementation is a configuration choice. Two
//! implementations ship with the crate:
//!
//! - [`BTreeFactory`]: `std::collections::BTreeSet`, the default.
//! - [`SortedVecFactory`]: a binary-searched `Vec`, cheaper for the small
//!   shards produced by fine-grained size partitioning.
//!
//! Navigational methods return owned clones because callers usually hold
//! the set behind a lock that is released before the result is used.

use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Included, Unbounded};

/// A sorted set with navigational queries.
pub trait OrderedSet<T: Ord + Clone> {
    /// Insert `item`. Returns `false` if it was already present.
    fn insert(&mut self, item: T) -> bool;

    /// Remove `item`. Returns `false` if it was absent.
    fn remove(&mut self, item: &T) -> bool;

    /// Whether `item` is present.
    fn contains(&self, item: &T) -> bool;

    /// Smallest item.
    fn first(&self) -> Option<T>;

    /// Largest item.
    fn last(&self) -> Option<T>;

    /// Remove and return the smallest item.
    fn pop_first(&mut self) -> Option<T>;

    /// Remove and return the largest item.
    fn pop_last(&mut self) -> Option<T>;

    /// Smallest item strictly greater than `item`.
    fn higher(&self, item: &T) -> Option<T>;

    /// Smallest item greater than or equal to `item`.
    fn ceiling(&self, item: &T) -> Option<T>;

    /// Largest item strictly less than `item`.
    fn lower(&self, item: &T) -> Option<T>;

    /// Largest item less than or equal to `item`.
    fn floor(&self, item: &T) -> Option<T>;

    /// Number of items.
    fn len(&self) -> usize;

    /// Whether the set holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every item.
    fn clear(&mut self);

    /// All items in ascending order.
    fn to_vec(&self) -> Vec<T>;
}

/// Builds empty [`OrderedSet`] instances.
pub trait OrderedSetFactory<T: Ord + Clone> {
    /// The set type produced.
    type Set: OrderedSet<T>;

    /// A new, empty set.
    fn create(&self) -> Self::Set;
}

impl<T: Ord + Clone> OrderedSet<T> for BTreeSet<T> {
    fn insert(&mut self, item: T) -> bool {
        BTreeSet::insert(self, item)
    }

    fn remove(&mut self, item: &T) -> bool {
        BTreeSet::remove(self, item)
    }

    fn contains(&self, item: &T) -> bool {
        BTreeSet::contains(self, item)
    }

    fn first(&self) -> Option<T> {
        BTreeSet::first(self).cloned()
    }

    fn last(&self) -> Option<T> {
        BTreeSet::last(self).cloned()
    }

    fn pop_first(&mut self) -> Option<T> {
        BTreeSet::pop_first(self)
    }

    fn pop_last(&mut self) -> Option<T> {
        BTreeSet::pop_last(self)
    }

    fn higher(&self, item: &T) -> Option<T> {
        self.range((Excluded(item), Unbounded)).next().cloned()
    }

    fn ceiling(&self, item: &T) -> Option<T> {
        self.range((Included(item), Unbounded)).next().cloned()
    }

    fn lower(&self, item: &T) -> Option<T> {
        self.range((Unbounded, Excluded(item))).next_back().cloned()
    }

    fn floor(&self, item: &T) -> Option<T> {
        self.range((Unbounded, Included(item))).next_back().cloned()
    }

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn clear(&mut self) {
        BTreeSet::clear(self);
    }

    fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

/// Factory for `BTreeSet`-backed shards.
#[derive(Clone, Copy, Debug, Default)]
pub struct BTreeFactory;

impl<T: Ord + Clone> OrderedSetFactory<T> for BTreeFactory {
    type Set = BTreeSet<T>;

    fn create(&self) -> Self::Set {
        BTreeSet::new()
    }
}

/// Ordered set stored as a sorted, deduplicated `Vec`.
///
/// Lookups are `O(log n)`; inserts and removes shift the tail and are
/// `O(n)`. Competitive with a tree while shards stay small.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortedVecSet<T> {
    items: Vec<T>,
}

impl<T: Ord + Clone> SortedVecSet<T> {
    /// An empty set.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The items as an ascending slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Index of the first item `> item`.
    fn upper_index(&self, item: &T) -> usize {
        self.items.partition_point(|x| x <= item)
    }

    /// Index of the first item `>= item`.
    fn lower_index(&self, item: &T) -> usize {
        self.items.partition_point(|x| x < item)
    }
}

impl<T: Ord + Clone> OrderedSet<T> for SortedVecSet<T> {
    fn insert(&mut self, item: T) -> bool {
        match self.items.binary_search(&item) {
            Ok(_) => false,
            Err(pos) => {
                self.items.insert(pos, item);
                true
            }
        }
    }

    fn remove(&mut self, item: &T) -> bool {
        match self.items.binary_search(item) {
            Ok(pos) => {
                self.items.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    fn contains(&self, item: &T) -> bool {
        self.items.binary_search(item).is_ok()
    }

    fn first(&self) -> Option<T> {
        self.items.first().cloned()
    }

    fn last(&self) -> Option<T> {
        self.items.last().cloned()
    }

    fn pop_first(&mut self) -> Option<T> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    fn pop_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    fn higher(&self, item: &T) -> Option<T> {
        self.items.get(self.upper_index(item)).cloned()
    }

    fn ceiling(&self, item: &T) -> Option<T> {
        self.items.get(self.lower_index(item)).cloned()
    }

    fn lower(&self, item: &T) -> Option<T> {
        self.lower_index(item)
            .checked_sub(1)
            .map(|i| self.items[i].clone())
    }

    fn floor(&self, item: &T) -> Option<T> {
        self.upper_index(item)
            .checked_sub(1)
            .map(|i| self.items[i].clone())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

/// Factory for [`SortedVecSet`]-backed shards.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortedVecFactory;

impl<T: Ord + Clone> OrderedSetFactory<T> for SortedVecFactory {
    type Set = SortedVecSet<T>;

    fn create(&self) -> Self::Set {
        SortedVecSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled<S: OrderedSet<u64>>(mut set: S) -> S {
        for v in [10, 20, 30, 40] {
            assert!(set.insert(v));
        }
        set
    }

    fn check_navigation<S: OrderedSet<u64>>(set: S) {
        let set = filled(set);
        assert_eq!(set.higher(&20), Some(30));
        assert_eq!(set.higher(&25), Some(30));
        assert_eq!(set.ceiling(&20), Some(20));
        assert_eq!(set.ceiling(&21), Some(30));
        assert_eq!(set.lower(&20), Some(10));
        assert_eq!(set.floor(&20), Some(20));
        assert_eq!(set.floor(&19), Some(10));
        assert_eq!(set.lower(&10), None);
        assert_eq!(set.higher(&40), None);
        assert_eq!(set.first(), Some(10));
        assert_eq!(set.last(), Some(40));
        assert_eq!(set.to_vec(), vec![10, 20, 30, 40]);
    }

    fn check_mutation<S: OrderedSet<u64>>(set: S) {
        let mut set = filled(set);
        assert!(!set.insert(20), "duplicate insert must be rejected");
        assert!(set.remove(&20));
        assert!(!set.remove(&20));
        assert!(!set.contains(&20));
        assert_eq!(set.pop_first(), Some(10));
        assert_eq!(set.pop_last(), Some(40));
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.pop_last(), None);
        assert_eq!(set.pop_first(), None);
    }

    #[test]
    fn btree_navigation() {
        check_navigation(BTreeSet::new());
    }

    #[test]
    fn btree_mutation() {
        check_mutation(BTreeSet::new());
    }

    #[test]
    fn sorted_vec_navigation() {
        check_navigation(SortedVecSet::new());
    }

    #[test]
    fn sorted_vec_mutation() {
        check_mutation(SortedVecSet::new());
    }

    #[test]
    fn sorted_vec_stays_sorted() {
        let mut set = SortedVecSet::new();
        for v in [5u64, 1, 4, 2, 3] {
            set.insert(v);
        }
        assert_eq!(set.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sorted_vec_matches_btree(
                items in proptest::collection::vec(0u64..500, 0..64),
                probe in 0u64..500,
            ) {
                let mut tree: BTreeSet<u64> = BTreeSet::new();
                let mut vec = SortedVecSet::new();
                for &v in &items {
                    prop_assert_eq!(OrderedSet::insert(&mut tree, v), vec.insert(v));
                }
                prop_assert_eq!(OrderedSet::higher(&tree, &probe), vec.higher(&probe));
                prop_assert_eq!(OrderedSet::ceiling(&tree, &probe), vec.ceiling(&probe));
                prop_assert_eq!(OrderedSet::lower(&tree, &probe), vec.lower(&probe));
                prop_assert_eq!(OrderedSet::floor(&tree, &probe), vec.floor(&probe));
                prop_assert_eq!(OrderedSet::to_vec(&tree), vec.to_vec());
            }
        }
    }
}
