//! # rotating-set
//!
//! A thread-safe round-robin selector: a mutable collection whose items are
//! handed out one at a time, in insertion order, wrapping forever.
//!
//! ## Overview
//!
//! [`RotatingSet`] is intended as a building block for load-distribution
//! logic, e.g. picking successive backend targets. It provides:
//!
//! - **Rotation**: `next` / `try_next` serve the front item and move it to
//!   the back
//! - **Mutation**: `add`, `add_all`, `try_remove` (removes every match under
//!   a caller-supplied equality predicate), `clear`
//! - **Inspection**: `len`, `is_empty`, `contains`, `elements` (snapshot)
//!
//! Weighting, health checks, retries and persistence are left to the caller.
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` as a sequence in rotation order
//!
//! Loom model checking is enabled with `RUSTFLAGS="--cfg loom"` rather than
//! a feature flag.
//!
//! ## Example
//!
//! ```rust
//! use rotating_set::prelude::*;
//!
//! let set = RotatingSet::with_partial_eq();
//! set.add("a");
//! set.add("b");
//! set.add("c");
//!
//! assert_eq!(set.elements(), vec!["a", "b", "c"]);
//! assert_eq!(set.next(), "a");
//! assert_eq!(set.elements(), vec!["b", "c", "a"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use rotating_set::prelude::*;
/// ```
pub mod prelude {
    pub use crate::rotating_set::{Equality, RotatingSet};
}

mod rotating_set;
mod sync;

pub use rotating_set::{Equality, RotatingSet};
