#![cfg(not(loom))]

use rotating_set::RotatingSet;
use rstest::rstest;

fn equals(left: &String, right: &String) -> bool {
    left == right
}

fn hosts() -> Vec<String> {
    ["google.com", "google.nl", "google.de"]
        .into_iter()
        .map(String::from)
        .collect()
}

// =============================================================================
// Elements
// =============================================================================

#[rstest]
fn elements_contains_every_added_item() {
    let set = RotatingSet::new(equals);
    for host in hosts() {
        set.add(host);
    }

    let elements = set.elements();
    assert_eq!(elements.len(), 3);
    for host in hosts() {
        assert!(elements.contains(&host));
    }
}

#[rstest]
fn elements_on_empty_set_is_empty() {
    let set = RotatingSet::new(equals);
    assert!(set.elements().is_empty());
}

#[rstest]
fn elements_does_not_advance_rotation() {
    let set = RotatingSet::new(equals);
    set.add_all(hosts());

    let _ = set.elements();
    let _ = set.elements();
    assert_eq!(set.next(), "google.com");
}

// =============================================================================
// Rotation
// =============================================================================

#[rstest]
fn rotation_serves_every_item_once_per_cycle() {
    let set = RotatingSet::new(equals);
    set.add_all(hosts());

    for _ in 0..4 {
        let served: Vec<String> = (0..3).map(|_| set.next()).collect();
        assert_eq!(served, hosts());
    }
}

#[rstest]
fn empty_next_returns_default() {
    let set = RotatingSet::new(equals);
    assert_eq!(set.next(), "");
    assert_eq!(set.len(), 0);
}

#[rstest]
fn cleared_next_returns_default() {
    let set = RotatingSet::new(equals);
    set.add_all(hosts());
    set.clear();

    assert_eq!(set.next(), "");
    assert_eq!(set.len(), 0);
    assert!(set.elements().is_empty());
}

// =============================================================================
// Removal
// =============================================================================

#[rstest]
fn try_remove_removes_all_duplicates() {
    let set = RotatingSet::with_partial_eq();
    set.add_all(["a", "b", "a", "c", "a"]);

    assert!(set.try_remove(&"a"));
    assert_eq!(set.elements(), vec!["b", "c"]);
    assert!(!set.contains(&"a"));
}

#[rstest]
fn try_remove_without_match_leaves_set_unchanged() {
    let set = RotatingSet::with_partial_eq();
    set.add_all(["a", "b", "c"]);
    let _ = set.next();

    assert!(!set.try_remove(&"z"));
    assert_eq!(set.elements(), vec!["b", "c", "a"]);
}

#[rstest]
fn try_remove_last_item_empties_set() {
    let set = RotatingSet::with_partial_eq();
    set.add(7);

    assert!(set.try_remove(&7));
    assert!(set.is_empty());
    assert_eq!(set.try_next(), None);
}

#[rstest]
fn try_remove_with_case_insensitive_predicate() {
    let set = RotatingSet::new(|left: &String, right: &String| left.eq_ignore_ascii_case(right));
    set.add("Backend-A".to_string());
    set.add("backend-b".to_string());
    set.add("BACKEND-A".to_string());

    assert!(set.try_remove(&"backend-a".to_string()));
    assert_eq!(set.elements(), vec!["backend-b".to_string()]);
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

#[rstest]
fn end_to_end_round_robin() {
    let set = RotatingSet::with_partial_eq();
    set.add("a");
    set.add("b");
    set.add("c");
    assert_eq!(set.elements(), vec!["a", "b", "c"]);

    assert_eq!(set.next(), "a");
    assert_eq!(set.elements(), vec!["b", "c", "a"]);
    assert_eq!(set.next(), "b");
    assert_eq!(set.next(), "c");
    assert_eq!(set.next(), "a");
}

#[rstest]
fn add_during_rotation_joins_at_back() {
    let set = RotatingSet::with_partial_eq();
    set.add_all([1, 2, 3]);
    assert_eq!(set.next(), 1);

    set.add(4);
    let served: Vec<i32> = (0..4).map(|_| set.next()).collect();
    assert_eq!(served, vec![2, 3, 1, 4]);
}
