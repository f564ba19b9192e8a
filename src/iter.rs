//! Positions and iterators for the `RbTree` data structure
use crate::node::{Arena, NodeId, HEADER};
use std::fmt;
use std::iter::FusedIterator;

/// A position in a tree: one element, or the `end` position one past the maximum.
///
/// Positions are plain handles. They stay valid while other elements are inserted or
/// erased, and become stale once their own element is erased. A stale position is
/// never dereferenced: [`RbTree::get`](crate::RbTree::get) returns `None` for it and
/// position-taking mutations reject it. A position only ever resolves in the tree that
/// handed it out (or the tree its elements were swapped into).
///
/// Two positions are equal when they name the same node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
	pub(crate) id: NodeId,
	pub(crate) stamp: u64,
}

impl Position {
	/// Returns `true` for the `end` position.
	#[inline]
	pub fn is_end(&self) -> bool {
		self.id == HEADER
	}

	#[inline]
	pub(crate) fn end() -> Position {
		Position {
			id: HEADER,
			stamp: 0,
		}
	}
}

impl fmt::Debug for Position {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.is_end() {
			f.write_str("Position(end)")
		} else {
			f.debug_tuple("Position").field(&self.id).finish()
		}
	}
}

/// Double-ended iterator over the elements of a half-open position range.
pub struct Iter<'a, T> {
	arena: &'a Arena<T>,
	front: NodeId,
	back: NodeId,
	len: usize,
}

impl<'a, T> Iter<'a, T> {
	/// `len` must be the number of steps from `front` to `back`.
	pub(crate) fn new(arena: &'a Arena<T>, front: NodeId, back: NodeId, len: usize) -> Self {
		Iter {
			arena,
			front,
			back,
			len,
		}
	}
}

impl<T> Clone for Iter<'_, T> {
	fn clone(&self) -> Self {
		Iter {
			arena: self.arena,
			front: self.front,
			back: self.back,
			len: self.len,
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_list().entries(self.clone()).finish()
	}
}

impl<'a, T> Iterator for Iter<'a, T> {
	type Item = &'a T;

	fn next(&mut self) -> Option<&'a T> {
		if self.len == 0 {
			return None;
		}
		let id = self.front;
		self.front = self.arena.next(id);
		self.len -= 1;
		Some(self.arena.value(id))
	}

	#[inline]
	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.len, Some(self.len))
	}

	fn last(mut self) -> Option<&'a T> {
		self.next_back()
	}
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
	fn next_back(&mut self) -> Option<&'a T> {
		if self.len == 0 {
			return None;
		}
		self.back = self.arena.prev(self.back);
		self.len -= 1;
		Some(self.arena.value(self.back))
	}
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Owning in-order iterator, created by `RbTree::into_iter`.
pub struct IntoIter<T> {
	values: std::vec::IntoIter<T>,
}

impl<T> IntoIter<T> {
	pub(crate) fn new(mut arena: Arena<T>) -> IntoIter<T> {
		let mut order = Vec::with_capacity(arena.len());
		let mut cur = arena.leftmost;
		while cur != HEADER {
			order.push(cur);
			cur = arena.next(cur);
		}
		let values: Vec<T> = order.into_iter().map(|id| arena.nodes.remove(id).value).collect();
		IntoIter {
			values: values.into_iter(),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_list().entries(self.values.as_slice()).finish()
	}
}

impl<T> Iterator for IntoIter<T> {
	type Item = T;

	#[inline]
	fn next(&mut self) -> Option<T> {
		self.values.next()
	}

	#[inline]
	fn size_hint(&self) -> (usize, Option<usize>) {
		self.values.size_hint()
	}
}

impl<T> DoubleEndedIterator for IntoIter<T> {
	#[inline]
	fn next_back(&mut self) -> Option<T> {
		self.values.next_back()
	}
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
