//! Thread-safe round-robin selection.
//!
//! This module provides [`RotatingSet`], a mutable cyclic sequence that hands
//! out its items one at a time in insertion order, wrapping forever. It is
//! meant as a building block for load-distribution logic such as picking
//! successive backend targets.
//!
//! # Rotation
//!
//! Serving an item moves it to the back of the sequence, so the next call
//! serves the item that followed it:
//!
//! ```text
//!   [a, b, c] ──next()=a──► [b, c, a] ──next()=b──► [c, a, b]
//! ```
//!
//! # Time Complexity
//!
//! | Operation    | Complexity     | Lock      |
//! |--------------|----------------|-----------|
//! | `add`        | O(1) amortized | exclusive |
//! | `next`       | O(1)           | exclusive |
//! | `try_next`   | O(1)           | exclusive |
//! | `clear`      | O(1)           | exclusive |
//! | `try_remove` | O(n)           | exclusive |
//! | `len`        | O(1)           | shared    |
//! | `contains`   | O(n)           | shared    |
//! | `elements`   | O(n)           | shared    |
//!
//! # Equality
//!
//! Items are compared with a predicate supplied at construction time rather
//! than through `PartialEq`, so types without built-in equality can be
//! stored. The predicate should be an equivalence relation; anything else
//! makes [`RotatingSet::try_remove`] remove an unpredictable subset.
//!
//! # Examples
//!
//! ```rust
//! use rotating_set::RotatingSet;
//!
//! let backends = RotatingSet::new(|left: &&str, right: &&str| left == right);
//! backends.add("10.0.0.1");
//! backends.add("10.0.0.2");
//!
//! assert_eq!(backends.next(), "10.0.0.1");
//! assert_eq!(backends.next(), "10.0.0.2");
//! assert_eq!(backends.next(), "10.0.0.1");
//! ```

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

use crate::sync::RwLock;

/// Equality predicate used when none is given explicitly.
pub type Equality<T> = fn(&T, &T) -> bool;

/// A thread-safe, mutable, cyclic sequence served in round-robin order.
///
/// All mutating operations (`add`, `next`, `try_next`, `clear`,
/// `try_remove`, `add_all`) take an exclusive lock; pure reads (`len`,
/// `is_empty`, `contains`, `elements`) take a shared lock. Every operation
/// is a short critical section, and the set never reports errors: empty
/// and no-match cases are signaled through return values.
///
/// # Type Parameters
///
/// * `T` - The element type
/// * `E` - The equality predicate (defaults to `fn(&T, &T) -> bool`)
///
/// # Thread Safety
///
/// `RotatingSet<T, E>` is `Send + Sync` when `T: Send + Sync` and
/// `E: Send + Sync`. Share it between threads with `Arc`.
///
/// # Examples
///
/// ```rust
/// use rotating_set::RotatingSet;
/// use std::sync::Arc;
/// use std::thread;
///
/// let targets = Arc::new(RotatingSet::with_partial_eq());
/// for port in [8080, 8081, 8082] {
///     targets.add(port);
/// }
///
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let targets = Arc::clone(&targets);
///         thread::spawn(move || targets.next())
///     })
///     .collect();
///
/// let mut served: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
/// served.sort_unstable();
/// assert_eq!(served, vec![8080, 8081, 8082]);
/// ```
pub struct RotatingSet<T, E = Equality<T>> {
    ring: RwLock<VecDeque<T>>,
    equals: E,
}

impl<T, E> RotatingSet<T, E>
where
    E: Fn(&T, &T) -> bool,
{
    /// Creates an empty set that compares items with `equals`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// #[derive(Clone, Default)]
    /// struct Backend {
    ///     host: String,
    ///     weight: u32,
    /// }
    ///
    /// let backends = RotatingSet::new(|left: &Backend, right: &Backend| left.host == right.host);
    /// assert!(backends.is_empty());
    /// ```
    #[inline]
    pub fn new(equals: E) -> Self {
        Self::with_capacity(0, equals)
    }

    /// Creates an empty set with room for at least `capacity` items.
    #[inline]
    pub fn with_capacity(capacity: usize, equals: E) -> Self {
        Self {
            ring: RwLock::new(VecDeque::with_capacity(capacity)),
            equals,
        }
    }

    /// Appends `item` to the back of the rotation.
    ///
    /// Duplicates are allowed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// let set = RotatingSet::with_partial_eq();
    /// set.add("a");
    /// set.add("a");
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn add(&self, item: T) {
        self.ring.write().push_back(item);
    }

    /// Appends every item of `items`, in iteration order, under a single
    /// exclusive lock.
    ///
    /// Concurrent callers never observe a partially applied batch.
    pub fn add_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.ring.write().extend(items);
    }

    /// Returns the front item and moves it to the back of the rotation.
    ///
    /// Returns `None` without touching the set when it is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// let set = RotatingSet::with_partial_eq();
    /// assert_eq!(set.try_next(), None);
    ///
    /// set.add(0);
    /// assert_eq!(set.try_next(), Some(0));
    /// ```
    pub fn try_next(&self) -> Option<T>
    where
        T: Clone,
    {
        let mut ring = self.ring.write();
        if ring.is_empty() {
            trace!("rotation requested on an empty set");
            return None;
        }
        ring.rotate_left(1);
        ring.back().cloned()
    }

    /// Returns the front item and moves it to the back of the rotation.
    ///
    /// On an empty set this returns `T::default()` and changes nothing. A
    /// stored item equal to the default is indistinguishable from that case;
    /// check [`len`](Self::len) first or use [`try_next`](Self::try_next)
    /// when the difference matters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// let set: RotatingSet<String> = RotatingSet::with_partial_eq();
    /// assert_eq!(set.next(), "");
    ///
    /// set.add("a".to_string());
    /// set.add("b".to_string());
    /// assert_eq!(set.next(), "a");
    /// assert_eq!(set.elements(), vec!["b".to_string(), "a".to_string()]);
    /// ```
    pub fn next(&self) -> T
    where
        T: Clone + Default,
    {
        self.try_next().unwrap_or_default()
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.ring.read().len()
    }

    /// Returns `true` if the set holds no items.
    pub fn is_empty(&self) -> bool {
        self.ring.read().is_empty()
    }

    /// Removes every item.
    ///
    /// The old storage is swapped out under the lock and dropped after the
    /// lock is released.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.ring.write());
        trace!(dropped = dropped.len(), "cleared rotating set");
    }

    /// Removes every item for which `equals(item_in_set, item)` holds.
    ///
    /// The surviving items keep their relative order. Returns `true` if at
    /// least one item was removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// let set = RotatingSet::with_partial_eq();
    /// for item in ["a", "b", "a", "c"] {
    ///     set.add(item);
    /// }
    ///
    /// assert!(set.try_remove(&"a"));
    /// assert_eq!(set.elements(), vec!["b", "c"]);
    /// assert!(!set.try_remove(&"z"));
    /// ```
    pub fn try_remove(&self, item: &T) -> bool {
        let mut ring = self.ring.write();
        let before = ring.len();
        ring.retain(|element| !(self.equals)(element, item));
        let removed = before - ring.len();
        if removed > 0 {
            trace!(removed, remaining = ring.len(), "removed matching items");
        }
        removed > 0
    }

    /// Returns `true` if any item matches `item` under the equality predicate.
    pub fn contains(&self, item: &T) -> bool {
        self.ring
            .read()
            .iter()
            .any(|element| (self.equals)(element, item))
    }

    /// Returns a snapshot of the items in current front-to-back order.
    ///
    /// Does not advance the rotation. An empty set yields an empty `Vec`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotating_set::RotatingSet;
    ///
    /// let set = RotatingSet::with_partial_eq();
    /// assert!(set.elements().is_empty());
    ///
    /// set.add(1);
    /// set.add(2);
    /// set.add(3);
    /// let _ = set.next();
    /// assert_eq!(set.elements(), vec![2, 3, 1]);
    /// ```
    pub fn elements(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.ring.read().iter().cloned().collect()
    }
}

impl<T: PartialEq> RotatingSet<T> {
    /// Creates an empty set that compares items with `PartialEq`.
    #[inline]
    pub fn with_partial_eq() -> Self {
        Self::new(<T as PartialEq>::eq)
    }
}

impl<T: PartialEq> Default for RotatingSet<T> {
    #[inline]
    fn default() -> Self {
        Self::with_partial_eq()
    }
}

impl<T, E> Extend<T> for RotatingSet<T, E>
where
    E: Fn(&T, &T) -> bool,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.add_all(items);
    }
}

impl<T: PartialEq> FromIterator<T> for RotatingSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let set = Self::with_partial_eq();
        set.add_all(items);
        set
    }
}

impl<T: fmt::Debug, E> fmt::Debug for RotatingSet<T, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RotatingSet")
            .field("elements", &*self.ring.read())
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Display, E> fmt::Display for RotatingSet<T, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.read();
        write!(formatter, "[")?;
        let mut first = true;
        for element in ring.iter() {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

static_assertions::assert_impl_all!(RotatingSet<String>: Send, Sync);
static_assertions::assert_impl_all!(RotatingSet<u64, fn(&u64, &u64) -> bool>: Send, Sync, Default);
static_assertions::assert_not_impl_any!(RotatingSet<std::rc::Rc<u8>>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize, E> serde::Serialize for RotatingSet<T, E> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let ring = self.ring.read();
        let mut seq = serializer.serialize_seq(Some(ring.len()))?;
        for element in ring.iter() {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct RotatingSetVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> RotatingSetVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for RotatingSetVisitor<T>
where
    T: serde::Deserialize<'de> + PartialEq,
{
    type Value = RotatingSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        const MAX_PREALLOCATE: usize = 4096;
        let capacity = seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATE);
        let mut elements = VecDeque::with_capacity(capacity);
        while let Some(element) = seq.next_element()? {
            elements.push_back(element);
        }
        Ok(RotatingSet {
            ring: RwLock::new(elements),
            equals: <T as PartialEq>::eq,
        })
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for RotatingSet<T>
where
    T: serde::Deserialize<'de> + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(RotatingSetVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(all(test, feature = "serde", not(loom)))]
mod serde_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_serialize_empty() {
        let set: RotatingSet<i32> = RotatingSet::default();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[]");
    }

    #[rstest]
    fn test_serialize_follows_rotation_order() {
        let set: RotatingSet<i32> = (1..=3).collect();
        let _ = set.next();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[2,3,1]");
    }

    #[rstest]
    fn test_deserialize_restores_order() {
        let set: RotatingSet<String> = serde_json::from_str(r#"["b","c","a"]"#).unwrap();
        assert_eq!(set.next(), "b");
        assert!(set.try_remove(&"a".to_string()));
        assert_eq!(set.elements(), vec!["c".to_string(), "b".to_string()]);
    }

    #[rstest]
    fn test_deserialize_rejects_non_sequence() {
        let result: Result<RotatingSet<i32>, _> = serde_json::from_str("42");
        assert!(result.is_err());
    }
}
