//! Structural mutation: linking, unlinking, rotations and the two fixup passes.
//!
//! Both fixups are written once against a [`Side`] and its opposite, so every case
//! covers its mirror image as well.
//!
//! ## Insert fixup
//!
//! ```text
//! Case 1 (uncle red)      Case 2 (inner grandchild)   Case 3 (outer grandchild)
//!
//!      g(B)                    g(B)                        g(B)            p(B)
//!     /    \                  /                           /              /    \
//!   p(R)   u(R)   recolor   p(R)    rotate at p         p(R)   ─►     z(R)   g(R)
//!   /             ─►         \      ─► case 3          /
//! z(R)                       z(R)                    z(R)
//! ```
//!
//! ## Erase fixup
//!
//! `x` carries an extra black. With `w` the sibling of `x`:
//! 1. `w` red: recolor and rotate at the parent so the sibling becomes black.
//! 2. both children of `w` black: paint `w` red and push the extra black upward.
//! 3. near child of `w` red, far child black: rotate at `w` to reach case 4.
//! 4. far child of `w` red: rotate at the parent and finish.

use crate::node::{Arena, Color, Node, NodeId, Side, HEADER};

impl<T> Arena<T> {
	/// Replaces `old` with `new` in `old`'s parent (or as the root).
	///
	/// `old` keeps its own parent link; the caller either discards or relinks it.
	pub(crate) fn transplant(&mut self, old: NodeId, new: Option<NodeId>) {
		let parent = self.parent(old);
		match (parent, self.side_of(old)) {
			(Some(p), Some(side)) => self.node_mut(p).children[side as usize] = new,
			_ => self.root = new,
		}
		if let Some(new) = new {
			self.node_mut(new).parent = parent;
		}
	}

	/// Rotates `id` down toward `side`, lifting its child on the opposite side.
	///
	/// ```text
	///     x                     y
	///    / \     rotate(x,     / \
	///   a   y      Left)      x   c
	///      / \     ─►        / \
	///     b   c             a   b
	/// ```
	pub(crate) fn rotate(&mut self, id: NodeId, side: Side) {
		let up = side.opposite();
		let pivot = match self.child(id, up) {
			Some(pivot) => pivot,
			None => unreachable!("rotation requires a child on the lifted side"),
		};
		let inner = self.child(pivot, side);

		self.node_mut(id).children[up as usize] = inner;
		if let Some(inner) = inner {
			self.node_mut(inner).parent = Some(id);
		}

		self.transplant(id, Some(pivot));

		self.node_mut(pivot).children[side as usize] = Some(id);
		self.node_mut(id).parent = Some(pivot);
	}

	/// Allocates a red node for `value`, hangs it under `parent` on `side` (or makes it
	/// the root), refreshes the cached extremes and restores balance.
	///
	/// The slot on `side` of `parent` must be empty.
	pub(crate) fn attach(&mut self, parent: Option<NodeId>, side: Side, value: T) -> NodeId {
		let id = self.alloc(Node::new(value, parent));

		match parent {
			None => {
				self.root = Some(id);
				self.leftmost = id;
				self.rightmost = id;
			}
			Some(p) => {
				debug_assert!(self.child(p, side).is_none(), "attach target slot is occupied");
				self.node_mut(p).children[side as usize] = Some(id);
				match side {
					Side::Left if p == self.leftmost => self.leftmost = id,
					Side::Right if p == self.rightmost => self.rightmost = id,
					_ => {}
				}
			}
		}

		self.insert_fixup(id);
		id
	}

	fn insert_fixup(&mut self, mut id: NodeId) {
		while let Some(parent) = self.parent(id) {
			if !self.is_red(Some(parent)) {
				break;
			}
			let grand = match self.parent(parent) {
				Some(grand) => grand,
				None => unreachable!("a red node is never the root"),
			};
			let parent_side = match self.side_of(parent) {
				Some(side) => side,
				None => unreachable!("parent has a grandparent"),
			};
			let uncle = self.child(grand, parent_side.opposite());

			// Case 1: push the red up two levels
			if let Some(uncle) = uncle.filter(|&u| self.is_red(Some(u))) {
				self.set_color(parent, Color::Black);
				self.set_color(uncle, Color::Black);
				self.set_color(grand, Color::Red);
				id = grand;
				continue;
			}

			// Case 2: turn an inner grandchild into an outer one
			let mut parent = parent;
			if self.child(parent, parent_side.opposite()) == Some(id) {
				self.rotate(parent, parent_side);
				id = parent;
				parent = match self.parent(id) {
					Some(p) => p,
					None => unreachable!("rotated node keeps a parent"),
				};
			}

			// Case 3
			self.set_color(parent, Color::Black);
			self.set_color(grand, Color::Red);
			self.rotate(grand, parent_side.opposite());
			break;
		}

		if let Some(root) = self.root {
			self.set_color(root, Color::Black);
		}
	}

	/// Unlinks `id`, restores balance and returns the stored element.
	///
	/// A node with two children is replaced by its in-order successor *node*, so every
	/// other node keeps its id and outstanding positions stay valid.
	pub(crate) fn detach(&mut self, id: NodeId) -> T {
		if id == self.leftmost {
			self.leftmost = self.successor(id).unwrap_or(HEADER);
		}
		if id == self.rightmost {
			self.rightmost = self.predecessor(id).unwrap_or(HEADER);
		}

		let node = self.node(id);
		let (left, right, color) = (node.child(Side::Left), node.child(Side::Right), node.color);

		// `x` takes the removed slot; `x_parent` tracks its parent even when `x` is absent.
		let (x, x_parent, removed_color) = match (left, right) {
			(None, only) | (only, None) => {
				let parent = self.parent(id);
				self.transplant(id, only);
				(only, parent, color)
			}
			(Some(left), Some(right)) => {
				let succ = self.minimum(right);
				let succ_color = self.node(succ).color;
				let x = self.child(succ, Side::Right);

				let x_parent = if self.parent(succ) == Some(id) {
					Some(succ)
				} else {
					let parent = self.parent(succ);
					self.transplant(succ, x);
					self.node_mut(succ).children[Side::Right as usize] = Some(right);
					self.node_mut(right).parent = Some(succ);
					parent
				};

				self.transplant(id, Some(succ));
				self.node_mut(succ).children[Side::Left as usize] = Some(left);
				self.node_mut(left).parent = Some(succ);
				self.set_color(succ, color);

				(x, x_parent, succ_color)
			}
		};

		let removed = self.nodes.remove(id);

		if removed_color == Color::Black {
			self.erase_fixup(x, x_parent);
		}

		removed.value
	}

	fn erase_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
		while x != self.root && !self.is_red(x) {
			let p = match parent {
				Some(p) => p,
				None => break,
			};
			// `x` may be absent, but its sibling never is: the removed black node left
			// a black-height of at least one on the other side.
			let side = if self.child(p, Side::Left) == x {
				Side::Left
			} else {
				Side::Right
			};
			let far_side = side.opposite();
			let mut sibling = self.sibling(p, far_side);

			// Case 1
			if self.is_red(Some(sibling)) {
				self.set_color(sibling, Color::Black);
				self.set_color(p, Color::Red);
				self.rotate(p, side);
				sibling = self.sibling(p, far_side);
			}

			let near = self.child(sibling, side);
			let far = self.child(sibling, far_side);

			// Case 2
			if !self.is_red(near) && !self.is_red(far) {
				self.set_color(sibling, Color::Red);
				x = Some(p);
				parent = self.parent(p);
				continue;
			}

			// Case 3
			if !self.is_red(far) {
				if let Some(near) = near {
					self.set_color(near, Color::Black);
				}
				self.set_color(sibling, Color::Red);
				self.rotate(sibling, far_side);
				sibling = self.sibling(p, far_side);
			}

			// Case 4
			let parent_color = self.node(p).color;
			self.set_color(sibling, parent_color);
			self.set_color(p, Color::Black);
			if let Some(far) = self.child(sibling, far_side) {
				self.set_color(far, Color::Black);
			}
			self.rotate(p, side);
			x = self.root;
			break;
		}

		if let Some(x) = x {
			self.set_color(x, Color::Black);
		}
	}

	#[inline]
	fn sibling(&self, parent: NodeId, side: Side) -> NodeId {
		match self.child(parent, side) {
			Some(sibling) => sibling,
			None => unreachable!("doubly-black node without a sibling: black-height violated"),
		}
	}
}
