//! # Redwood: An Arena-Backed Red-Black Tree Engine
//!
//! This crate provides the ordered-tree engine behind unique-keyed and multi-keyed
//! ordered containers (sets, maps, multisets, multimaps). It keeps elements in key
//! order with O(log n) point operations, O(1) access to both extremes and O(1)
//! amortized stepping between neighbours.
//!
//! ## Design Overview
//!
//! **Red-black balancing**: Every node is red or black. The root is black, no red
//! node has a red child, and every path from a node down to an absent child crosses
//! the same number of black nodes. Together these bound the height by
//! `2·log2(n + 1)`. Insertions and erasures repair violations locally with
//! recoloring and at most three rotations.
//!
//! **Arena storage**: Nodes live in a [`slab::Slab`] and link to each other by index.
//! Each node owns its children through the arena and only names its parent, so no
//! rotation can leave a dangling reference, and whole-tree teardown is a flat drop
//! of the arena rather than a recursive walk.
//!
//! **Header position**: Each tree has a header that is not an element. It anchors the
//! root, caches the leftmost and rightmost nodes, and is the `end` [`Position`].
//! Stepping forward from the maximum reaches `end`, and stepping back from `end`
//! reaches the maximum.
//!
//! **Keys and ordering**: The tree never compares elements directly. A [`KeyOf`]
//! projection borrows the key from an element ([`Identity`] for bare keys, [`First`]
//! for `(K, V)` tuples) and a [`Compare`] strict weak order ranks keys.
//!
//! ### Tree Structure
//!
//! ```text
//!      header ──────────────► root
//!        │                     │
//!        │             ┌───────┴───────┐
//!        │             ▼               ▼
//!        │          ┌─────┐         ┌─────┐
//!        ├─ left ──►│ min │   ...   │ max │◄── right ─┤
//!                   └─────┘         └─────┘
//!
//!   end() == header     prev(end()) == max     next(max) == end()
//! ```
//!
//! ## Basic Usage
//!
//! ```
//! use redwood::SetTree;
//!
//! let mut tree: SetTree<i32> = SetTree::new();
//!
//! // Unique insertion reports whether the element was accepted
//! let (pos, inserted) = tree.insert_unique(5);
//! assert!(inserted);
//! assert_eq!(tree.insert_unique(5), (pos, false));
//!
//! tree.insert_unique(1);
//! tree.insert_unique(9);
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 5, 9]);
//!
//! // Lookups return positions; a miss is `end()`
//! assert_eq!(tree.get(tree.find(&9)), Some(&9));
//! assert_eq!(tree.find(&4), tree.end());
//! assert_eq!(tree.get(tree.lower_bound(&4)), Some(&5));
//! ```
//!
//! Multi-keyed trees use the `insert_equal` family, which always inserts and keeps
//! equivalent elements in insertion order:
//!
//! ```
//! use redwood::MapTree;
//!
//! let mut tree: MapTree<&str, u32> = MapTree::new();
//! tree.insert_equal(("b", 1));
//! tree.insert_equal(("a", 2));
//! tree.insert_equal(("b", 3));
//!
//! let (lo, hi) = tree.equal_range(&"b");
//! let values: Vec<u32> = tree.range(lo, hi).unwrap().map(|(_, v)| *v).collect();
//! assert_eq!(values, vec![1, 3]);
//! assert_eq!(tree.count(&"b"), 2);
//! ```
//!
//! ## Thread Safety
//!
//! The tree is an ordinary owned value with no interior mutability. Shared reads
//! through `&RbTree` are fine from many threads; mutation requires `&mut RbTree`, so
//! concurrent writers must be serialized by the caller.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

pub mod error;
pub mod iter;
pub mod key;
mod node;
mod rebalance;

pub use iter::{IntoIter, Iter, Position};
pub use key::{Compare, First, Greater, Identity, KeyOf, Natural};
pub use node::Color;

use error::{Error, Result};
use node::{Arena, Node, NodeId, Side, HEADER};

// ---------------------------------------------------------------------------
// Public Type Aliases
// ---------------------------------------------------------------------------

/// A tree whose elements are their own keys, ordered by [`Ord`].
///
/// With `insert_unique` this backs a set; with `insert_equal`, a multiset.
pub type SetTree<K> = RbTree<K, Identity, Natural>;

/// A tree of `(K, V)` tuples keyed by `K`, ordered by [`Ord`].
///
/// With `insert_unique` this backs a map; with `insert_equal`, a multimap.
pub type MapTree<K, V> = RbTree<(K, V), First, Natural>;

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// A red-black tree with a configurable key projection and comparator.
///
/// # Type Parameters
///
/// - `T`: The stored element type.
/// - `S`: The [`KeyOf`] projection extracting the ordering key from a `T`.
///   Default is [`Identity`].
/// - `C`: The [`Compare`] strict weak order over keys. Default is [`Natural`].
///
/// # Invariants
///
/// After every public call returns:
/// 1. The root, if any, is black.
/// 2. No red node has a red child.
/// 3. Every root-to-absent-child path has the same number of black nodes.
/// 4. In-order traversal is non-decreasing under `C` (strictly increasing when only
///    `insert_unique` is used).
/// 5. The cached leftmost and rightmost nodes are the true minimum and maximum, or
///    the header when the tree is empty.
pub struct RbTree<T, S = Identity, C = Natural> {
	/// Nodes plus header fields (root, leftmost, rightmost).
	arena: Arena<T>,
	key_of: S,
	compare: C,
}

impl<T, S: Default, C: Default> Default for RbTree<T, S, C> {
	fn default() -> Self {
		Self::new()
	}
}

// ---------------------------------------------------------------------------
// Construction, Metadata and Positions
// ---------------------------------------------------------------------------

impl<T, S: Default, C: Default> RbTree<T, S, C> {
	/// Creates a new, empty tree. Does not allocate.
	///
	/// # Example
	///
	/// ```
	/// use redwood::SetTree;
	///
	/// let tree: SetTree<String> = SetTree::new();
	/// assert!(tree.is_empty());
	/// assert_eq!(tree.begin(), tree.end());
	/// ```
	pub fn new() -> Self {
		Self::with_comparator(S::default(), C::default())
	}

	/// Creates an empty tree with room for `capacity` elements before the arena grows.
	pub fn with_capacity(capacity: usize) -> Self {
		RbTree {
			arena: Arena::with_capacity(capacity),
			key_of: S::default(),
			compare: C::default(),
		}
	}
}

impl<T, S, C> RbTree<T, S, C> {
	/// Creates an empty tree with an explicit projection and comparator.
	///
	/// # Example
	///
	/// ```
	/// use redwood::{Identity, RbTree};
	///
	/// let mut tree = RbTree::with_comparator(Identity, |a: &i32, b: &i32| a > b);
	/// tree.insert_unique_iter([1, 3, 2]);
	/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
	/// ```
	pub fn with_comparator(key_of: S, compare: C) -> Self {
		RbTree {
			arena: Arena::with_capacity(0),
			key_of,
			compare,
		}
	}

	// -----------------------------------------------------------------------
	// Tree Metadata
	// -----------------------------------------------------------------------

	/// Returns the number of elements. O(1).
	#[inline]
	pub fn len(&self) -> usize {
		self.arena.len()
	}

	/// Returns `true` if the tree holds no elements.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.arena.root.is_none()
	}

	/// Upper bound on the number of elements a tree of this type can ever hold.
	pub fn max_size(&self) -> usize {
		isize::MAX as usize / mem::size_of::<Node<T>>().max(1)
	}

	/// Number of elements the arena holds before it reallocates.
	pub fn capacity(&self) -> usize {
		self.arena.nodes.capacity()
	}

	/// Returns the height in nodes (0 when empty). Never exceeds `2·log2(len + 1)`.
	///
	/// This walks the whole tree and is meant for diagnostics.
	pub fn height(&self) -> usize {
		self.arena.height()
	}

	/// Returns the comparator.
	pub fn key_comp(&self) -> &C {
		&self.compare
	}

	/// Returns the key projection.
	pub fn key_of(&self) -> &S {
		&self.key_of
	}

	// -----------------------------------------------------------------------
	// Positions
	// -----------------------------------------------------------------------

	/// Position of the minimum element, or `end()` when empty.
	#[inline]
	pub fn begin(&self) -> Position {
		self.arena.position(self.arena.leftmost)
	}

	/// The one-past-the-maximum position. Never names an element.
	#[inline]
	pub fn end(&self) -> Position {
		Position::end()
	}

	/// Position of the maximum element, or `end()` when empty. Reverse traversal starts
	/// here and steps with [`prev_position`](Self::prev_position) until [`rend`](Self::rend).
	#[inline]
	pub fn rbegin(&self) -> Position {
		self.arena.position(self.arena.rightmost)
	}

	/// The position reverse traversal ends on: stepping back from the minimum reaches it.
	#[inline]
	pub fn rend(&self) -> Position {
		Position::end()
	}

	/// The in-order successor of `pos`.
	///
	/// Stepping past the maximum gives `end()`, and stepping from `end()` wraps to
	/// `begin()`. A stale position steps to `end()`.
	pub fn next_position(&self, pos: Position) -> Position {
		match self.arena.resolve_or_end(pos) {
			Some(id) => self.arena.position(self.arena.next(id)),
			None => Position::end(),
		}
	}

	/// The in-order predecessor of `pos`.
	///
	/// Stepping back from `end()` gives the maximum, and stepping back from the minimum
	/// gives `end()`. A stale position steps to `end()`.
	pub fn prev_position(&self, pos: Position) -> Position {
		match self.arena.resolve_or_end(pos) {
			Some(id) => self.arena.position(self.arena.prev(id)),
			None => Position::end(),
		}
	}

	/// Returns the element at `pos`, or `None` for `end()` and for erased elements.
	///
	/// # Example
	///
	/// ```
	/// use redwood::SetTree;
	///
	/// let mut tree: SetTree<i32> = SetTree::new();
	/// let (pos, _) = tree.insert_unique(3);
	/// assert_eq!(tree.get(pos), Some(&3));
	/// assert_eq!(tree.get(tree.end()), None);
	///
	/// tree.erase(pos).unwrap();
	/// assert_eq!(tree.get(pos), None);
	/// ```
	pub fn get(&self, pos: Position) -> Option<&T> {
		self.arena.resolve(pos).map(|id| self.arena.value(id))
	}

	/// The minimum element. O(1).
	pub fn first(&self) -> Option<&T> {
		self.get(self.begin())
	}

	/// The maximum element. O(1).
	pub fn last(&self) -> Option<&T> {
		self.get(self.rbegin())
	}

	// -----------------------------------------------------------------------
	// Iteration
	// -----------------------------------------------------------------------

	/// In-order iterator over every element. Use `.rev()` for descending order.
	pub fn iter(&self) -> Iter<'_, T> {
		Iter::new(&self.arena, self.arena.leftmost, HEADER, self.len())
	}

	/// Iterator over the half-open position range `[first, last)`.
	///
	/// Fails with [`Error::InvalidRange`] if either bound is stale or `last` cannot be
	/// reached from `first`.
	pub fn range(&self, first: Position, last: Position) -> Result<Iter<'_, T>> {
		let (front, back) = self.range_ids(first, last)?;
		let len = self.distance(front, back)?;
		Ok(Iter::new(&self.arena, front, back, len))
	}

	fn range_ids(&self, first: Position, last: Position) -> Result<(NodeId, NodeId)> {
		match (self.arena.resolve_or_end(first), self.arena.resolve_or_end(last)) {
			(Some(front), Some(back)) => Ok((front, back)),
			_ => Err(Error::InvalidRange),
		}
	}

	/// Number of forward steps from `front` to `back`, refusing to walk through `end`.
	fn distance(&self, front: NodeId, back: NodeId) -> Result<usize> {
		let mut steps = 0;
		let mut cur = front;
		while cur != back {
			if cur == HEADER {
				return Err(Error::InvalidRange);
			}
			cur = self.arena.next(cur);
			steps += 1;
		}
		Ok(steps)
	}

	// -----------------------------------------------------------------------
	// Erasure by Position
	// -----------------------------------------------------------------------

	/// Removes the element at `pos` and returns it.
	///
	/// Every other position stays valid. Fails with [`Error::InvalidPosition`] for
	/// `end()` or an already-erased element, leaving the tree untouched.
	pub fn erase(&mut self, pos: Position) -> Result<T> {
		let id = self.arena.resolve(pos).ok_or(Error::InvalidPosition)?;
		Ok(self.arena.detach(id))
	}

	/// Removes every element in `[first, last)` and returns how many were removed.
	///
	/// The range is validated before anything is removed. An empty range is a no-op,
	/// and a range covering the whole tree is cleared in one step.
	///
	/// # Example
	///
	/// ```
	/// use redwood::SetTree;
	///
	/// let mut tree: SetTree<i32> = SetTree::new();
	/// tree.insert_unique_iter(1..=6);
	///
	/// let removed = tree.erase_range(tree.find(&2), tree.find(&5)).unwrap();
	/// assert_eq!(removed, 3);
	/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 5, 6]);
	/// ```
	pub fn erase_range(&mut self, first: Position, last: Position) -> Result<usize> {
		let (front, back) = self.range_ids(first, last)?;

		if front == self.arena.leftmost && back == HEADER {
			let removed = self.len();
			self.clear();
			return Ok(removed);
		}

		let removed = self.distance(front, back)?;
		tracing::trace!(removed, remaining = self.len() - removed, "erasing position range");

		// Erasure relocates nodes, never renumbers them, so `next` survives the detach.
		let mut cur = front;
		while cur != back {
			let next = self.arena.next(cur);
			self.arena.detach(cur);
			cur = next;
		}
		Ok(removed)
	}

	// -----------------------------------------------------------------------
	// Whole-Tree Operations
	// -----------------------------------------------------------------------

	/// Removes every element, keeping the arena's allocation.
	///
	/// Positions taken before the call never become valid again, even once new
	/// elements reuse the freed slots.
	pub fn clear(&mut self) {
		tracing::trace!(len = self.len(), "clearing tree");
		self.arena.clear();
	}

	/// Exchanges the contents of two trees in O(1), comparators and projections
	/// included. Positions follow their elements into the other tree.
	pub fn swap(&mut self, other: &mut Self) {
		tracing::trace!(left = self.len(), right = other.len(), "swapping trees");
		mem::swap(self, other);
	}
}

// ---------------------------------------------------------------------------
// Keyed Operations
// ---------------------------------------------------------------------------

impl<T, S, C> RbTree<T, S, C>
where
	S: KeyOf<T>,
	C: Compare<S::Key>,
{
	#[inline]
	fn key(&self, id: NodeId) -> &S::Key {
		self.key_of.key(self.arena.value(id))
	}

	#[inline]
	fn less(&self, a: &S::Key, b: &S::Key) -> bool {
		self.compare.less(a, b)
	}

	/// Orders two stored elements by their keys.
	pub fn value_less(&self, a: &T, b: &T) -> bool {
		self.less(self.key_of.key(a), self.key_of.key(b))
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Walks from the root to the empty slot where `key` belongs after any equivalent
	/// keys. Returns the slot's parent (`None` for an empty tree) and side.
	fn descend(&self, key: &S::Key) -> (Option<NodeId>, Side) {
		let mut parent = None;
		let mut side = Side::Left;
		let mut cur = self.arena.root;
		while let Some(id) = cur {
			parent = Some(id);
			side = if self.less(key, self.key(id)) {
				Side::Left
			} else {
				Side::Right
			};
			cur = self.arena.child(id, side);
		}
		(parent, side)
	}

	/// Finds the slot for a unique insertion of `key`, or the equivalent element that
	/// blocks it.
	///
	/// After the descent, only the in-order predecessor of the slot can be equivalent
	/// to `key`, so one extra comparison settles it.
	fn unique_slot(&self, key: &S::Key) -> std::result::Result<(Option<NodeId>, Side), NodeId> {
		let (parent, side) = self.descend(key);
		let Some(parent_id) = parent else {
			return Ok((None, side));
		};

		let candidate = match side {
			Side::Right => parent_id,
			Side::Left if parent_id == self.arena.leftmost => return Ok((parent, side)),
			Side::Left => self.arena.prev(parent_id),
		};

		if self.compare.equivalent(self.key(candidate), key) {
			Err(candidate)
		} else {
			Ok((parent, side))
		}
	}

	fn attach(&mut self, parent: Option<NodeId>, side: Side, value: T) -> Position {
		let id = self.arena.attach(parent, side, value);
		self.arena.position(id)
	}

	/// Inserts `value` unless an element with an equivalent key is present.
	///
	/// Returns the position of the inserted element and `true`, or the position of the
	/// blocking element and `false` (in which case `value` is dropped and the tree is
	/// unchanged).
	///
	/// # Example
	///
	/// ```
	/// use redwood::MapTree;
	///
	/// let mut tree: MapTree<i32, &str> = MapTree::new();
	/// let (pos, inserted) = tree.insert_unique((1, "one"));
	/// assert!(inserted);
	///
	/// let (again, inserted) = tree.insert_unique((1, "uno"));
	/// assert!(!inserted);
	/// assert_eq!(again, pos);
	/// assert_eq!(tree.get(pos), Some(&(1, "one")));
	/// ```
	pub fn insert_unique(&mut self, value: T) -> (Position, bool) {
		match self.unique_slot(self.key_of.key(&value)) {
			Ok((parent, side)) => (self.attach(parent, side, value), true),
			Err(existing) => (self.arena.position(existing), false),
		}
	}

	/// Unique insertion with a position hint.
	///
	/// If `value` belongs immediately before `hint`, it is linked in O(1) amortized
	/// time; otherwise (or if `hint` is stale) this falls back to
	/// [`insert_unique`](Self::insert_unique). Returns the position of the inserted
	/// element, or of the equivalent element that blocked it.
	pub fn insert_unique_hint(&mut self, hint: Position, value: T) -> Position {
		let slot = match self.arena.resolve_or_end(hint) {
			Some(hint) if !self.is_empty() => self.unique_hint_slot(hint, self.key_of.key(&value)),
			_ => None,
		};
		match slot {
			Some((parent, side)) => self.attach(Some(parent), side, value),
			None => self.insert_unique(value).0,
		}
	}

	fn unique_hint_slot(&self, hint: NodeId, key: &S::Key) -> Option<(NodeId, Side)> {
		if hint == self.arena.leftmost {
			return self.less(key, self.key(hint)).then_some((hint, Side::Left));
		}
		if hint == HEADER {
			let last = self.arena.rightmost;
			return self.less(self.key(last), key).then_some((last, Side::Right));
		}
		let before = self.arena.prev(hint);
		if self.less(self.key(before), key) && self.less(key, self.key(hint)) {
			Some(self.slot_between(before, hint))
		} else {
			None
		}
	}

	/// Adjacent nodes `before` and `after`: one of them has a free inner slot.
	fn slot_between(&self, before: NodeId, after: NodeId) -> (NodeId, Side) {
		if self.arena.child(before, Side::Right).is_none() {
			(before, Side::Right)
		} else {
			(after, Side::Left)
		}
	}

	/// Unique-inserts every element of `iter` and returns how many were accepted.
	///
	/// Each element is first tried just before `end()`, so ascending input costs O(1)
	/// amortized per element.
	pub fn insert_unique_iter<I>(&mut self, iter: I) -> usize
	where
		I: IntoIterator<Item = T>,
	{
		let before = self.len();
		for value in iter {
			self.insert_unique_hint(Position::end(), value);
		}
		self.len() - before
	}

	/// Inserts `value` unconditionally, after any elements with equivalent keys.
	///
	/// # Example
	///
	/// ```
	/// use redwood::SetTree;
	///
	/// let mut tree: SetTree<i32> = SetTree::new();
	/// for _ in 0..3 {
	///     tree.insert_equal(3);
	/// }
	/// assert_eq!(tree.len(), 3);
	/// assert_eq!(tree.count(&3), 3);
	/// ```
	pub fn insert_equal(&mut self, value: T) -> Position {
		let (parent, side) = self.descend(self.key_of.key(&value));
		self.attach(parent, side, value)
	}

	/// Multi insertion with a position hint.
	///
	/// If `value` may sit immediately before `hint` without breaking the order, it is
	/// linked there in O(1) amortized time; otherwise (or if `hint` is stale) this
	/// falls back to [`insert_equal`](Self::insert_equal).
	pub fn insert_equal_hint(&mut self, hint: Position, value: T) -> Position {
		let slot = match self.arena.resolve_or_end(hint) {
			Some(hint) if !self.is_empty() => self.equal_hint_slot(hint, self.key_of.key(&value)),
			_ => None,
		};
		match slot {
			Some((parent, side)) => self.attach(Some(parent), side, value),
			None => self.insert_equal(value),
		}
	}

	fn equal_hint_slot(&self, hint: NodeId, key: &S::Key) -> Option<(NodeId, Side)> {
		if hint == self.arena.leftmost {
			return (!self.less(self.key(hint), key)).then_some((hint, Side::Left));
		}
		if hint == HEADER {
			let last = self.arena.rightmost;
			return (!self.less(key, self.key(last))).then_some((last, Side::Right));
		}
		let before = self.arena.prev(hint);
		if !self.less(key, self.key(before)) && !self.less(self.key(hint), key) {
			Some(self.slot_between(before, hint))
		} else {
			None
		}
	}

	/// Multi-inserts every element of `iter`. Ascending input costs O(1) amortized per
	/// element.
	pub fn insert_equal_iter<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = T>,
	{
		for value in iter {
			self.insert_equal_hint(Position::end(), value);
		}
	}

	// -----------------------------------------------------------------------
	// Lookup
	// -----------------------------------------------------------------------

	fn lower_bound_id(&self, key: &S::Key) -> NodeId {
		let mut bound = HEADER;
		let mut cur = self.arena.root;
		while let Some(id) = cur {
			if self.less(self.key(id), key) {
				cur = self.arena.child(id, Side::Right);
			} else {
				bound = id;
				cur = self.arena.child(id, Side::Left);
			}
		}
		bound
	}

	fn upper_bound_id(&self, key: &S::Key) -> NodeId {
		let mut bound = HEADER;
		let mut cur = self.arena.root;
		while let Some(id) = cur {
			if self.less(key, self.key(id)) {
				bound = id;
				cur = self.arena.child(id, Side::Left);
			} else {
				cur = self.arena.child(id, Side::Right);
			}
		}
		bound
	}

	/// Position of the first element whose key is not less than `key`, or `end()`.
	pub fn lower_bound(&self, key: &S::Key) -> Position {
		self.arena.position(self.lower_bound_id(key))
	}

	/// Position of the first element whose key is greater than `key`, or `end()`.
	pub fn upper_bound(&self, key: &S::Key) -> Position {
		self.arena.position(self.upper_bound_id(key))
	}

	/// `(lower_bound(key), upper_bound(key))`: the span of elements equivalent to `key`.
	pub fn equal_range(&self, key: &S::Key) -> (Position, Position) {
		(self.lower_bound(key), self.upper_bound(key))
	}

	/// Position of an element equivalent to `key` (the first, in a multi tree), or
	/// `end()` if there is none.
	pub fn find(&self, key: &S::Key) -> Position {
		let bound = self.lower_bound_id(key);
		if bound == HEADER || !self.compare.equivalent(key, self.key(bound)) {
			Position::end()
		} else {
			self.arena.position(bound)
		}
	}

	/// Returns `true` if an element equivalent to `key` is present.
	pub fn contains(&self, key: &S::Key) -> bool {
		!self.find(key).is_end()
	}

	/// Number of elements equivalent to `key`. O(log n + count).
	pub fn count(&self, key: &S::Key) -> usize {
		let last = self.upper_bound_id(key);
		let mut cur = self.lower_bound_id(key);
		let mut count = 0;
		while cur != last {
			cur = self.arena.next(cur);
			count += 1;
		}
		count
	}

	/// Removes every element equivalent to `key` and returns how many were removed.
	pub fn erase_key(&mut self, key: &S::Key) -> usize {
		let last = self.upper_bound_id(key);
		let mut cur = self.lower_bound_id(key);
		let mut removed = 0;
		while cur != last {
			let next = self.arena.next(cur);
			self.arena.detach(cur);
			cur = next;
			removed += 1;
		}
		removed
	}
}

// ---------------------------------------------------------------------------
// Key-Value Trees
// ---------------------------------------------------------------------------

impl<K, V, C> RbTree<(K, V), First, C> {
	/// Mutable access to the value half of the element at `pos`.
	///
	/// The key stays immutable, so the ordering cannot be disturbed.
	///
	/// # Example
	///
	/// ```
	/// use redwood::MapTree;
	///
	/// let mut tree: MapTree<&str, i32> = MapTree::new();
	/// let (pos, _) = tree.insert_unique(("hits", 0));
	/// *tree.get_value_mut(pos).unwrap() += 1;
	/// assert_eq!(tree.get(pos), Some(&("hits", 1)));
	/// ```
	pub fn get_value_mut(&mut self, pos: Position) -> Option<&mut V> {
		let id = self.arena.resolve(pos)?;
		Some(&mut self.arena.node_mut(id).value.1)
	}
}

// ---------------------------------------------------------------------------
// Trait Implementations
// ---------------------------------------------------------------------------

impl<T: Clone, S: Clone, C: Clone> Clone for RbTree<T, S, C> {
	/// Deep structural copy: same shape and colors, fresh nodes.
	///
	/// Positions of the source do not carry over to the copy.
	fn clone(&self) -> Self {
		tracing::trace!(len = self.len(), "cloning tree");
		RbTree {
			arena: self.arena.duplicate(),
			key_of: self.key_of.clone(),
			compare: self.compare.clone(),
		}
	}
}

impl<T: fmt::Debug, S, C> fmt::Debug for RbTree<T, S, C> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

/// Equal when both trees have the same length and pairwise equal elements in order.
/// Comparators are not compared.
impl<T: PartialEq, S, C> PartialEq for RbTree<T, S, C> {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().eq(other.iter())
	}
}

impl<T: Eq, S, C> Eq for RbTree<T, S, C> {}

/// Lexicographic comparison of the in-order sequences.
impl<T: PartialOrd, S, C> PartialOrd for RbTree<T, S, C> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.iter().partial_cmp(other.iter())
	}
}

impl<T: Ord, S, C> Ord for RbTree<T, S, C> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.iter().cmp(other.iter())
	}
}

impl<T: Hash, S, C> Hash for RbTree<T, S, C> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_usize(self.len());
		for value in self.iter() {
			value.hash(state);
		}
	}
}

impl<'a, T, S, C> IntoIterator for &'a RbTree<T, S, C> {
	type Item = &'a T;
	type IntoIter = Iter<'a, T>;

	fn into_iter(self) -> Iter<'a, T> {
		self.iter()
	}
}

impl<T, S, C> IntoIterator for RbTree<T, S, C> {
	type Item = T;
	type IntoIter = IntoIter<T>;

	fn into_iter(self) -> IntoIter<T> {
		IntoIter::new(self.arena)
	}
}

// ===========================================================================
// Test-Only Validation Module
// ===========================================================================

/// Invariant validation for testing. Walks the whole tree and panics with the
/// offending node if any red-black or bookkeeping invariant is broken.
#[cfg(any(test, feature = "test-utils"))]
impl<T, S, C> RbTree<T, S, C>
where
	S: KeyOf<T>,
	C: Compare<S::Key>,
{
	/// Validates all tree invariants. Panics with diagnostic info if any is violated.
	///
	/// # Invariants Checked
	///
	/// 1. Root color: the root is black
	/// 2. Red rule: no red node has a red child
	/// 3. Black height: equal on every path
	/// 4. Ordering: in-order keys are non-decreasing
	/// 5. Extremes: cached leftmost/rightmost are the true minimum/maximum
	/// 6. Links: every child points back at its parent, the root has no parent
	/// 7. Size: every arena node is reachable from the root
	/// 8. Height bound: height <= 2·log2(len + 1)
	pub fn assert_invariants(&self) {
		let Some(root) = self.arena.root else {
			assert_eq!(self.len(), 0, "tree without a root holds {} nodes", self.len());
			assert_eq!(self.arena.leftmost, HEADER, "empty tree caches a leftmost node");
			assert_eq!(self.arena.rightmost, HEADER, "empty tree caches a rightmost node");
			return;
		};

		// Invariant 1
		assert_eq!(self.arena.node(root).color, Color::Black, "root {} is red", root);
		// Invariant 6 (root)
		assert_eq!(self.arena.parent(root), None, "root {} has a parent", root);

		let mut reached = 0;
		self.validate_subtree(root, &mut reached);

		// Invariant 7
		assert_eq!(reached, self.len(), "{} of {} nodes reachable", reached, self.len());

		// Invariant 5
		assert_eq!(self.arena.leftmost, self.arena.minimum(root), "stale leftmost");
		assert_eq!(self.arena.rightmost, self.arena.maximum(root), "stale rightmost");

		// Invariant 4
		let mut prev: Option<NodeId> = None;
		let mut cur = self.arena.leftmost;
		while cur != HEADER {
			if let Some(prev) = prev {
				assert!(
					!self.less(self.key(cur), self.key(prev)),
					"node {} orders before its predecessor {}",
					cur,
					prev
				);
			}
			prev = Some(cur);
			cur = self.arena.next(cur);
		}

		// Invariant 8
		let bound = 2.0 * ((self.len() + 1) as f64).log2();
		assert!(
			self.height() as f64 <= bound,
			"height {} exceeds 2·log2(n+1) = {:.2}",
			self.height(),
			bound
		);
	}

	/// Like [`assert_invariants`](Self::assert_invariants), and additionally checks that
	/// no two in-order neighbours are equivalent.
	pub fn assert_unique_invariants(&self) {
		self.assert_invariants();
		for (a, b) in self.iter().zip(self.iter().skip(1)) {
			assert!(self.value_less(a, b), "equivalent neighbours in a unique tree");
		}
	}

	/// Black nodes on every path from the root to an absent child (0 when empty).
	pub fn black_height(&self) -> usize {
		let mut height = 0;
		let mut cur = self.arena.root;
		while let Some(id) = cur {
			if self.arena.node(id).color == Color::Black {
				height += 1;
			}
			cur = self.arena.child(id, Side::Left);
		}
		height
	}

	/// Color of the root, `None` when empty.
	pub fn root_color(&self) -> Option<Color> {
		self.arena.root.map(|root| self.arena.node(root).color)
	}

	/// Color of the node at `pos`, `None` for `end()` or a stale position.
	pub fn color_at(&self, pos: Position) -> Option<Color> {
		self.arena.resolve(pos).map(|id| self.arena.node(id).color)
	}

	/// Returns the black height of the subtree below `id` (counting `id`).
	fn validate_subtree(&self, id: NodeId, reached: &mut usize) -> usize {
		*reached += 1;
		let node = self.arena.node(id);

		let mut heights = [0; 2];
		for side in [Side::Left, Side::Right] {
			let Some(child) = node.child(side) else {
				continue;
			};

			// Invariant 6
			assert_eq!(
				self.arena.parent(child),
				Some(id),
				"node {} does not point back at its parent {}",
				child,
				id
			);

			// Invariant 2
			if node.color == Color::Red {
				assert_eq!(
					self.arena.node(child).color,
					Color::Black,
					"red node {} has red child {}",
					id,
					child
				);
			}

			heights[side as usize] = self.validate_subtree(child, reached);
		}

		// Invariant 3
		assert_eq!(
			heights[0], heights[1],
			"black height differs below node {}: left {} right {}",
			id, heights[0], heights[1]
		);

		heights[0] + usize::from(node.color == Color::Black)
	}
}
