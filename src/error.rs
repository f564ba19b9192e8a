//! # Error Types for the Red-Black Tree Engine
//!
//! Most tree operations cannot fail. A lookup that finds nothing returns the `end`
//! position rather than an error, and a broken red-black invariant is a bug in the
//! engine (it panics with the violated invariant named) rather than something a
//! caller could recover from.
//!
//! What remains are the operations that take caller-supplied positions. A
//! [`Position`](crate::Position) is a plain handle, so it can outlive the element it
//! named or be handed the `end` position where an element is required. Those calls
//! validate their input up front and return an [`Error`] before touching the tree.
//!
//! ```
//! use redwood::{error::Error, SetTree};
//!
//! let mut tree: SetTree<i32> = SetTree::new();
//! let (pos, _) = tree.insert_unique(1);
//!
//! assert_eq!(tree.erase(pos), Ok(1));
//! assert_eq!(tree.erase(pos), Err(Error::InvalidPosition)); // already gone
//! assert_eq!(tree.erase(tree.end()), Err(Error::InvalidPosition));
//! ```

use thiserror::Error;

/// Errors returned by position-taking tree operations.
///
/// When any of these is returned the tree has not been modified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// The position is `end`, or the element it named has been erased.
	#[error("position does not name a live element")]
	InvalidPosition,

	/// The end of a position range cannot be reached from its start.
	///
	/// Either bound names an erased element, or `last` precedes `first` in order.
	#[error("range end is not reachable from range start")]
	InvalidRange,
}

/// A Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;
