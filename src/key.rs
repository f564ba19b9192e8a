//! Key projection and ordering.
//!
//! The tree never compares stored elements directly. A [`KeyOf`] projection borrows
//! the key out of an element and a [`Compare`] strict weak order ranks two keys.
//! Two keys are *equivalent* when neither is less than the other.

/// Extracts the ordering key from a stored element.
pub trait KeyOf<T> {
	type Key: ?Sized;

	fn key<'a>(&self, value: &'a T) -> &'a Self::Key;
}

/// Projection for trees whose elements are their own keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Identity;

impl<T> KeyOf<T> for Identity {
	type Key = T;

	#[inline]
	fn key<'a>(&self, value: &'a T) -> &'a T {
		value
	}
}

/// Projection for key-value trees storing `(K, V)` tuples, keyed by `K`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct First;

impl<K, V> KeyOf<(K, V)> for First {
	type Key = K;

	#[inline]
	fn key<'a>(&self, value: &'a (K, V)) -> &'a K {
		&value.0
	}
}

/// A strict weak order over keys.
///
/// Implementations must be irreflexive and transitive, and equivalence must be
/// transitive as well. Any closure `Fn(&K, &K) -> bool` acting as "less than" is a
/// comparator.
pub trait Compare<K: ?Sized> {
	/// Returns `true` if `a` orders strictly before `b`.
	fn less(&self, a: &K, b: &K) -> bool;

	/// Returns `true` if neither key orders before the other.
	#[inline]
	fn equivalent(&self, a: &K, b: &K) -> bool {
		!self.less(a, b) && !self.less(b, a)
	}
}

/// Ascending order via [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		a < b
	}
}

/// Descending order via [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Greater;

impl<K: Ord + ?Sized> Compare<K> for Greater {
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		a > b
	}
}

impl<K: ?Sized, F> Compare<K> for F
where
	F: Fn(&K, &K) -> bool,
{
	#[inline]
	fn less(&self, a: &K, b: &K) -> bool {
		self(a, b)
	}
}
