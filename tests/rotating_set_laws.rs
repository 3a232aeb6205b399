#![cfg(not(loom))]
//! Property-based tests for RotatingSet laws.

use proptest::prelude::*;
use rotating_set::RotatingSet;

fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

// =============================================================================
// Containment Law
// =============================================================================

proptest! {
    /// Containment: elements() is exactly the multiset of added items
    #[test]
    fn prop_elements_is_multiset_of_adds(items in prop::collection::vec(any::<i16>(), 0..64)) {
        let set: RotatingSet<i16> = RotatingSet::default();
        for item in &items {
            set.add(*item);
        }

        prop_assert_eq!(sorted(set.elements()), sorted(items.clone()));
        prop_assert_eq!(set.len(), items.len());
    }
}

// =============================================================================
// Rotation Laws
// =============================================================================

proptest! {
    /// Completeness: k calls to next() serve insertion order, and the
    /// following k calls repeat the same cycle
    #[test]
    fn prop_rotation_completeness(items in prop::collection::hash_set(any::<u32>(), 1..32)) {
        let items: Vec<u32> = items.into_iter().collect();
        let set: RotatingSet<u32> = items.iter().copied().collect();

        let first: Vec<u32> = (0..items.len()).map(|_| set.next()).collect();
        let second: Vec<u32> = (0..items.len()).map(|_| set.next()).collect();

        prop_assert_eq!(&first, &items);
        prop_assert_eq!(&second, &first);
    }

    /// Rotation preserves the multiset and only shifts the front
    #[test]
    fn prop_rotation_is_left_shift(
        items in prop::collection::vec(any::<u8>(), 1..32),
        turns in 0_usize..100,
    ) {
        let set: RotatingSet<u8> = items.iter().copied().collect();
        for _ in 0..turns {
            let _ = set.next();
        }

        let mut expected = items.clone();
        expected.rotate_left(turns % items.len());
        prop_assert_eq!(set.elements(), expected);
    }
}

// =============================================================================
// Removal Laws
// =============================================================================

proptest! {
    /// try_remove deletes exactly the matching items and keeps survivor order
    #[test]
    fn prop_try_remove_filters_matches(
        items in prop::collection::vec(0_u8..8, 0..48),
        target in 0_u8..8,
    ) {
        let set: RotatingSet<u8> = items.iter().copied().collect();
        let expected: Vec<u8> = items.iter().copied().filter(|item| *item != target).collect();

        let removed = set.try_remove(&target);

        prop_assert_eq!(removed, items.contains(&target));
        prop_assert_eq!(set.elements(), expected);
    }

    /// Removing twice is the same as removing once
    #[test]
    fn prop_try_remove_idempotent(
        items in prop::collection::vec(0_u8..4, 0..32),
        target in 0_u8..4,
    ) {
        let set: RotatingSet<u8> = items.into_iter().collect();
        let _ = set.try_remove(&target);
        let snapshot = set.elements();

        prop_assert!(!set.try_remove(&target));
        prop_assert_eq!(set.elements(), snapshot);
    }
}

// =============================================================================
// Empty Set Laws
// =============================================================================

proptest! {
    /// After clear(), next() yields the default and len() is zero
    #[test]
    fn prop_clear_then_next_is_default(items in prop::collection::vec(any::<i64>(), 0..32)) {
        let set: RotatingSet<i64> = items.into_iter().collect();
        set.clear();

        prop_assert_eq!(set.next(), 0);
        prop_assert_eq!(set.try_next(), None);
        prop_assert_eq!(set.len(), 0);
    }
}
