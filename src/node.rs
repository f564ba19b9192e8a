//! Arena-resident tree nodes and the structural walks over them.
//!
//! Every value node lives in a [`Slab`] and is addressed by its slab key (a
//! [`NodeId`]). A node owns its children through the arena and only *names* its
//! parent, so relinking during a rotation can never leave a dangling reference.
//! An absent child is always `None`; there is no shared nil leaf.
//!
//! The header is not an arena slot. [`Arena`] keeps the root and the cached
//! extremes directly, and the reserved id [`HEADER`] stands for the header
//! wherever a position is needed (most importantly as the `end` position).
//!
//! ```text
//!            header ─── root ──────────┐
//!              │                       ▼
//!              │                    ┌──────┐
//!              │                    │  B   │  parent: None
//!              │                    └──┬───┘
//!              │               ┌───────┴───────┐
//!              │            ┌──▼───┐        ┌──▼───┐
//!              ├─ leftmost ►│  R   │        │  R   │◄─ rightmost
//!                           └──────┘        └──────┘
//! ```

use crate::iter::Position;
use slab::Slab;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable address of a value node inside its tree's arena.
pub(crate) type NodeId = usize;

/// Reserved id of the header. It is never handed out by the slab, so looking it up
/// in the arena always misses.
pub(crate) const HEADER: NodeId = usize::MAX;

/// Inline capacity of explicit traversal stacks. A red-black tree of height 64 holds
/// at least 2^32 - 1 elements, so the stacks almost never spill to the heap.
pub(crate) const STACK_INLINE: usize = 64;

/// Source of insertion stamps, shared by every arena in the process. Stamp 0 is
/// reserved for the `end` position.
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Color of a node. Absent children count as black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
	Red,
	Black,
}

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
	Left = 0,
	Right = 1,
}

impl Side {
	#[inline]
	pub(crate) fn opposite(self) -> Side {
		match self {
			Side::Left => Side::Right,
			Side::Right => Side::Left,
		}
	}
}

/// A value node: structural links plus the stored element.
pub(crate) struct Node<T> {
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: [Option<NodeId>; 2],
	pub(crate) color: Color,
	/// Insertion stamp, unique across all arenas. Lets a [`Position`] tell its own node
	/// apart from a later node that reused the same slab slot, and from a node of
	/// another tree (a clone included) that happens to sit in the same slot.
	pub(crate) stamp: u64,
	pub(crate) value: T,
}

impl<T> Node<T> {
	/// A fresh, unlinked red node. The arena stamps it on allocation.
	pub(crate) fn new(value: T, parent: Option<NodeId>) -> Node<T> {
		Node {
			parent,
			children: [None, None],
			color: Color::Red,
			stamp: 0,
			value,
		}
	}

	#[inline]
	pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
		self.children[side as usize]
	}
}

/// All nodes of one tree together with the header fields.
///
/// The header fields obey one rule after every public mutation: `leftmost` and
/// `rightmost` name the minimum and maximum nodes, or both equal [`HEADER`] when
/// `root` is `None`.
pub(crate) struct Arena<T> {
	pub(crate) nodes: Slab<Node<T>>,
	pub(crate) root: Option<NodeId>,
	pub(crate) leftmost: NodeId,
	pub(crate) rightmost: NodeId,
}

impl<T> Arena<T> {
	pub(crate) fn with_capacity(capacity: usize) -> Arena<T> {
		Arena {
			nodes: Slab::with_capacity(capacity),
			root: None,
			leftmost: HEADER,
			rightmost: HEADER,
		}
	}

	/// Stores `node` in a fresh slot, stamping it first.
	pub(crate) fn alloc(&mut self, mut node: Node<T>) -> NodeId {
		node.stamp = NEXT_STAMP.fetch_add(1, Ordering::Relaxed);
		self.nodes.insert(node)
	}

	/// The position naming `id` (or `end` for the header).
	pub(crate) fn position(&self, id: NodeId) -> Position {
		if id == HEADER {
			Position::end()
		} else {
			Position {
				id,
				stamp: self.node(id).stamp,
			}
		}
	}

	/// The node a position names, if that element is still in the tree.
	pub(crate) fn resolve(&self, pos: Position) -> Option<NodeId> {
		self.nodes.get(pos.id).filter(|node| node.stamp == pos.stamp).map(|_| pos.id)
	}

	/// Like [`resolve`](Arena::resolve), but also accepts `end` and maps it to the header.
	pub(crate) fn resolve_or_end(&self, pos: Position) -> Option<NodeId> {
		if pos.is_end() {
			Some(HEADER)
		} else {
			self.resolve(pos)
		}
	}

	#[inline]
	pub(crate) fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Returns `true` if `id` names a live value node.
	#[cfg(test)]
	pub(crate) fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains(id)
	}

	#[inline]
	pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
		&self.nodes[id]
	}

	#[inline]
	pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
		&mut self.nodes[id]
	}

	#[inline]
	pub(crate) fn value(&self, id: NodeId) -> &T {
		&self.nodes[id].value
	}

	#[inline]
	pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.nodes[id].parent
	}

	#[inline]
	pub(crate) fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
		self.nodes[id].child(side)
	}

	/// Color of a possibly absent node; absent means black.
	#[inline]
	pub(crate) fn color(&self, id: Option<NodeId>) -> Color {
		match id {
			Some(id) => self.nodes[id].color,
			None => Color::Black,
		}
	}

	#[inline]
	pub(crate) fn is_red(&self, id: Option<NodeId>) -> bool {
		self.color(id) == Color::Red
	}

	#[inline]
	pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
		self.nodes[id].color = color;
	}

	/// The slot `id` occupies in its parent, or `None` for the root.
	pub(crate) fn side_of(&self, id: NodeId) -> Option<Side> {
		let parent = self.parent(id)?;
		if self.child(parent, Side::Left) == Some(id) {
			Some(Side::Left)
		} else {
			Some(Side::Right)
		}
	}

	/// Descends along `side` until that child is absent.
	pub(crate) fn extreme(&self, mut id: NodeId, side: Side) -> NodeId {
		while let Some(next) = self.child(id, side) {
			id = next;
		}
		id
	}

	#[inline]
	pub(crate) fn minimum(&self, id: NodeId) -> NodeId {
		self.extreme(id, Side::Left)
	}

	#[inline]
	pub(crate) fn maximum(&self, id: NodeId) -> NodeId {
		self.extreme(id, Side::Right)
	}

	/// The in-order neighbour of `id` in direction `side`, or `None` past the end.
	///
	/// Either the extreme of the subtree on `side`, or the nearest ancestor reached by
	/// climbing while the current node hangs on `side` of its parent.
	pub(crate) fn step(&self, mut id: NodeId, side: Side) -> Option<NodeId> {
		if let Some(child) = self.child(id, side) {
			return Some(self.extreme(child, side.opposite()));
		}
		let mut parent = self.parent(id);
		while let Some(p) = parent {
			if self.child(p, side) != Some(id) {
				break;
			}
			id = p;
			parent = self.parent(p);
		}
		parent
	}

	#[inline]
	pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
		self.step(id, Side::Right)
	}

	#[inline]
	pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
		self.step(id, Side::Left)
	}

	/// Successor on the position ring: past the maximum is the header, and past the
	/// header is the minimum.
	pub(crate) fn next(&self, id: NodeId) -> NodeId {
		if id == HEADER {
			return self.leftmost;
		}
		self.successor(id).unwrap_or(HEADER)
	}

	/// Predecessor on the position ring: before the header is the cached maximum, and
	/// before the minimum is the header.
	pub(crate) fn prev(&self, id: NodeId) -> NodeId {
		if id == HEADER {
			return self.rightmost;
		}
		self.predecessor(id).unwrap_or(HEADER)
	}

	/// Height of the tree in nodes (0 when empty), computed without recursion.
	pub(crate) fn height(&self) -> usize {
		let mut best = 0;
		let mut stack: SmallVec<[(NodeId, usize); STACK_INLINE]> = SmallVec::new();
		if let Some(root) = self.root {
			stack.push((root, 1));
		}
		while let Some((id, depth)) = stack.pop() {
			best = best.max(depth);
			for child in self.node(id).children.into_iter().flatten() {
				stack.push((child, depth + 1));
			}
		}
		best
	}

	/// Drops every node and resets the header to the empty state.
	pub(crate) fn clear(&mut self) {
		self.nodes.clear();
		self.root = None;
		self.leftmost = HEADER;
		self.rightmost = HEADER;
	}
}

impl<T: Clone> Arena<T> {
	/// Structural deep copy into a fresh, compact arena: same shape, same colors, no
	/// shared nodes.
	///
	/// Preorder walk with an explicit stack. If cloning an element panics, the partial
	/// copy is dropped while unwinding and `self` is untouched.
	pub(crate) fn duplicate(&self) -> Arena<T> {
		let mut out = Arena::with_capacity(self.len());
		let mut stack: SmallVec<[(NodeId, Option<NodeId>, Side); STACK_INLINE]> = SmallVec::new();
		if let Some(root) = self.root {
			stack.push((root, None, Side::Left));
		}

		while let Some((src, parent, side)) = stack.pop() {
			let node = self.node(src);
			let mut copy = Node::new(node.value.clone(), parent);
			copy.color = node.color;
			let id = out.alloc(copy);

			match parent {
				None => out.root = Some(id),
				Some(p) => out.node_mut(p).children[side as usize] = Some(id),
			}
			if src == self.leftmost {
				out.leftmost = id;
			}
			if src == self.rightmost {
				out.rightmost = id;
			}

			for side in [Side::Right, Side::Left] {
				if let Some(child) = node.child(side) {
					stack.push((child, Some(id), side));
				}
			}
		}
		out
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// Links `child` under `parent` on `side` without any balancing.
	pub(crate) fn hang<T>(arena: &mut Arena<T>, parent: NodeId, side: Side, value: T) -> NodeId {
		let id = arena.alloc(Node::new(value, Some(parent)));
		arena.node_mut(parent).children[side as usize] = Some(id);
		id
	}

	/// Builds the perfect tree 1..=7 rooted at 4 and returns it with ids indexed by key.
	pub(crate) fn perfect_seven() -> (Arena<i32>, [NodeId; 8]) {
		let mut arena = Arena::with_capacity(7);
		let mut ids = [HEADER; 8];
		ids[4] = arena.alloc(Node::new(4, None));
		arena.root = Some(ids[4]);
		ids[2] = hang(&mut arena, ids[4], Side::Left, 2);
		ids[6] = hang(&mut arena, ids[4], Side::Right, 6);
		ids[1] = hang(&mut arena, ids[2], Side::Left, 1);
		ids[3] = hang(&mut arena, ids[2], Side::Right, 3);
		ids[5] = hang(&mut arena, ids[6], Side::Left, 5);
		ids[7] = hang(&mut arena, ids[6], Side::Right, 7);
		arena.leftmost = ids[1];
		arena.rightmost = ids[7];
		(arena, ids)
	}

	#[test]
	fn extremes() {
		let (arena, ids) = perfect_seven();
		assert_eq!(arena.minimum(ids[4]), ids[1]);
		assert_eq!(arena.maximum(ids[4]), ids[7]);
		assert_eq!(arena.minimum(ids[6]), ids[5]);
		assert_eq!(arena.maximum(ids[3]), ids[3]);
	}

	#[test]
	fn successor_walks_in_order() {
		let (arena, ids) = perfect_seven();
		let mut seen = vec![];
		let mut cur = Some(arena.leftmost);
		while let Some(id) = cur {
			seen.push(*arena.value(id));
			cur = arena.successor(id);
		}
		assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
		assert_eq!(arena.successor(ids[3]), Some(ids[4]));
		assert_eq!(arena.successor(ids[7]), None);
	}

	#[test]
	fn predecessor_walks_in_reverse() {
		let (arena, ids) = perfect_seven();
		let mut seen = vec![];
		let mut cur = Some(arena.rightmost);
		while let Some(id) = cur {
			seen.push(*arena.value(id));
			cur = arena.predecessor(id);
		}
		assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
		assert_eq!(arena.predecessor(ids[5]), Some(ids[4]));
		assert_eq!(arena.predecessor(ids[1]), None);
	}

	#[test]
	fn header_closes_the_ring() {
		let (arena, ids) = perfect_seven();
		assert_eq!(arena.prev(HEADER), ids[7]);
		assert_eq!(arena.next(ids[7]), HEADER);
		assert_eq!(arena.next(HEADER), ids[1]);
		assert_eq!(arena.prev(ids[1]), HEADER);

		let empty: Arena<i32> = Arena::with_capacity(0);
		assert_eq!(empty.next(HEADER), HEADER);
		assert_eq!(empty.prev(HEADER), HEADER);
	}

	#[test]
	fn side_and_height() {
		let (mut arena, ids) = perfect_seven();
		assert_eq!(arena.side_of(ids[4]), None);
		assert_eq!(arena.side_of(ids[2]), Some(Side::Left));
		assert_eq!(arena.side_of(ids[7]), Some(Side::Right));
		assert_eq!(arena.height(), 3);

		arena.clear();
		assert_eq!(arena.height(), 0);
		assert_eq!(arena.leftmost, HEADER);
		assert_eq!(arena.rightmost, HEADER);
		assert!(!arena.contains(ids[4]));
	}

	#[test]
	fn duplicate_copies_shape_and_colors() {
		let (mut arena, ids) = perfect_seven();
		arena.set_color(ids[4], Color::Black);
		arena.set_color(ids[2], Color::Black);
		arena.set_color(ids[6], Color::Black);

		let copy = arena.duplicate();
		assert_eq!(copy.len(), 7);
		assert_eq!(copy.height(), 3);
		assert_eq!(*copy.value(copy.leftmost), 1);
		assert_eq!(*copy.value(copy.rightmost), 7);

		let root = copy.root.unwrap();
		assert_eq!(*copy.value(root), 4);
		assert_eq!(copy.node(root).color, Color::Black);
		let left = copy.child(root, Side::Left).unwrap();
		assert_eq!(*copy.value(left), 2);
		assert_eq!(copy.node(left).color, Color::Black);
		assert_eq!(copy.parent(left), Some(root));
		let leaf = copy.child(left, Side::Right).unwrap();
		assert_eq!(*copy.value(leaf), 3);
		assert_eq!(copy.node(leaf).color, Color::Red);

		// Mutating the source leaves the copy alone.
		arena.clear();
		assert_eq!(copy.len(), 7);
	}

	#[test]
	fn stale_positions_do_not_resolve() {
		let (mut arena, ids) = perfect_seven();
		let pos = arena.position(ids[3]);
		assert_eq!(arena.resolve(pos), Some(ids[3]));
		assert_eq!(arena.resolve_or_end(Position::end()), Some(HEADER));
		assert_eq!(arena.resolve(Position::end()), None);

		// Reusing the slot hands out a new stamp, so the old position stays dead.
		arena.nodes.remove(ids[3]);
		arena.node_mut(ids[2]).children[Side::Right as usize] = None;
		let reused = hang(&mut arena, ids[2], Side::Right, 30);
		assert_eq!(reused, ids[3]);
		assert_eq!(arena.resolve(pos), None);
		assert_eq!(arena.resolve(arena.position(reused)), Some(reused));
	}

	#[test]
	fn positions_are_bound_to_their_arena() {
		let (arena, ids) = perfect_seven();
		let copy = arena.duplicate();
		let pos = arena.position(ids[4]);

		// The copy may reuse the slot id, but never the stamp
		assert!(copy.contains(pos.id));
		assert_eq!(copy.resolve(pos), None);
		assert_eq!(arena.resolve(pos), Some(ids[4]));

		let (other, _) = perfect_seven();
		assert_eq!(other.resolve(pos), None);
	}
}
