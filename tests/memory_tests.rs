//! Drop accounting tests for redwood.
//!
//! These tests verify that every element a tree takes ownership of is dropped
//! exactly once, whichever path removes it: erasure, rejection by a unique insert,
//! clearing, dropping the tree, owned iteration or a panic during a deep copy.
//!
//! # Running Memory Tests
//!
//! These tests can be run normally:
//!
//! ```bash
//! cargo test -p redwood --test memory_tests
//! ```
//!
//! For more thorough leak detection, run under LeakSanitizer:
//!
//! ```bash
//! RUSTFLAGS="-Zsanitizer=leak" cargo +nightly test -p redwood --target x86_64-unknown-linux-gnu
//! ```

use redwood::{MapTree, SetTree};
use std::cell::Cell;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

// ===========================================================================
// Helper Types
// ===========================================================================

/// Shared counters of live and dropped tracked values.
#[derive(Default)]
struct Ledger {
	created: Cell<usize>,
	dropped: Cell<usize>,
	/// Clone calls left before a clone panics; `usize::MAX` disables the panic.
	clones_before_panic: Cell<usize>,
}

impl Ledger {
	fn new() -> Rc<Ledger> {
		let ledger = Ledger::default();
		ledger.clones_before_panic.set(usize::MAX);
		Rc::new(ledger)
	}

	fn live(&self) -> usize {
		self.created.get() - self.dropped.get()
	}
}

/// A key that reports its drops to a [`Ledger`] and orders by `key` alone.
struct Tracked {
	key: u32,
	ledger: Rc<Ledger>,
}

impl Tracked {
	fn new(key: u32, ledger: &Rc<Ledger>) -> Tracked {
		ledger.created.set(ledger.created.get() + 1);
		Tracked {
			key,
			ledger: Rc::clone(ledger),
		}
	}
}

impl Clone for Tracked {
	fn clone(&self) -> Tracked {
		let left = self.ledger.clones_before_panic.get();
		if left == 0 {
			panic!("clone budget exhausted");
		}
		if left != usize::MAX {
			self.ledger.clones_before_panic.set(left - 1);
		}
		Tracked::new(self.key, &self.ledger)
	}
}

impl Drop for Tracked {
	fn drop(&mut self) {
		self.ledger.dropped.set(self.ledger.dropped.get() + 1);
	}
}

impl PartialEq for Tracked {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Tracked {
	fn cmp(&self, other: &Self) -> Ordering {
		self.key.cmp(&other.key)
	}
}

fn tracked_set(keys: impl IntoIterator<Item = u32>, ledger: &Rc<Ledger>) -> SetTree<Tracked> {
	let mut tree = SetTree::new();
	for k in keys {
		tree.insert_unique(Tracked::new(k, ledger));
	}
	tree
}

// ===========================================================================
// Basic Drop Tests
// ===========================================================================

/// Dropping the tree drops every element.
#[test]
fn drop_releases_all_elements() {
	let ledger = Ledger::new();
	let tree = tracked_set(0..1_000, &ledger);
	assert_eq!(ledger.live(), 1_000);

	drop(tree);
	assert_eq!(ledger.live(), 0);
}

/// A rejected unique insert drops the rejected value and keeps the original.
#[test]
fn rejected_insert_drops_value() {
	let ledger = Ledger::new();
	let mut tree = tracked_set(0..10, &ledger);

	let (pos, inserted) = tree.insert_unique(Tracked::new(5, &ledger));
	assert!(!inserted);
	assert_eq!(ledger.live(), 10);
	assert_eq!(tree.get(pos).map(|t| t.key), Some(5));
}

/// Erase hands the element back; dropping it is the caller's business.
#[test]
fn erase_returns_ownership() {
	let ledger = Ledger::new();
	let mut tree = tracked_set(0..10, &ledger);

	let taken = tree.erase(tree.find(&Tracked::new(3, &ledger))).unwrap();
	// The probe key above was dropped at the end of the statement
	assert_eq!(ledger.live(), 10);
	assert_eq!(taken.key, 3);

	drop(taken);
	assert_eq!(ledger.live(), 9);
}

/// Erase by key and range erase drop what they remove.
#[test]
fn erase_key_and_range_drop_elements() {
	let ledger = Ledger::new();
	let mut tree = tracked_set(0..100, &ledger);
	let probe = Tracked::new(50, &ledger);

	assert_eq!(tree.erase_key(&probe), 1);
	assert_eq!(ledger.live(), 100);
	drop(probe);

	let first = tree.begin();
	let last = tree.find(&Tracked::new(20, &ledger));
	assert_eq!(tree.erase_range(first, last), Ok(20));
	assert_eq!(ledger.live(), 79);

	tree.erase_range(tree.begin(), tree.end()).unwrap();
	assert_eq!(ledger.live(), 0);
	assert!(tree.is_empty());
}

/// Clear drops everything but the tree stays usable.
#[test]
fn clear_then_reuse() {
	let ledger = Ledger::new();
	let mut tree = tracked_set(0..500, &ledger);

	tree.clear();
	assert_eq!(ledger.live(), 0);

	tree.insert_unique(Tracked::new(1, &ledger));
	assert_eq!(ledger.live(), 1);
	drop(tree);
	assert_eq!(ledger.live(), 0);
}

// ===========================================================================
// Owned Iteration Tests
// ===========================================================================

/// A partially consumed owning iterator drops the remainder.
#[test]
fn into_iter_drops_unconsumed() {
	let ledger = Ledger::new();
	let tree = tracked_set(0..100, &ledger);

	let mut iter = tree.into_iter();
	let first = iter.next().unwrap();
	let last = iter.next_back().unwrap();
	assert_eq!((first.key, last.key), (0, 99));
	assert_eq!(ledger.live(), 100);

	drop(iter);
	assert_eq!(ledger.live(), 2);
	drop((first, last));
	assert_eq!(ledger.live(), 0);
}

// ===========================================================================
// Copy Tests
// ===========================================================================

/// A clone owns its own copies of every element.
#[test]
fn clone_owns_copies() {
	let ledger = Ledger::new();
	let tree = tracked_set(0..200, &ledger);
	let copy = tree.clone();
	assert_eq!(ledger.live(), 400);

	drop(tree);
	assert_eq!(ledger.live(), 200);
	assert_eq!(copy.len(), 200);
	copy.assert_unique_invariants();

	drop(copy);
	assert_eq!(ledger.live(), 0);
}

/// A panic midway through a deep copy leaves the source intact and drops every
/// element the partial copy had already cloned.
#[test]
fn panicking_clone_leaves_source_intact() {
	let ledger = Ledger::new();
	let tree = tracked_set(0..64, &ledger);
	ledger.clones_before_panic.set(20);

	let result = panic::catch_unwind(AssertUnwindSafe(|| tree.clone()));
	assert!(result.is_err());

	// 20 copies were made and all of them were dropped during unwinding
	assert_eq!(ledger.created.get(), 84);
	assert_eq!(ledger.live(), 64);
	assert_eq!(tree.len(), 64);
	tree.assert_unique_invariants();

	ledger.clones_before_panic.set(usize::MAX);
	let copy = tree.clone();
	assert!(copy == tree);
}

/// Map trees drop both halves of each element.
#[test]
fn map_values_are_dropped() {
	let ledger = Ledger::new();
	let mut tree: MapTree<u32, Tracked> = MapTree::new();
	for k in 0..50 {
		tree.insert_equal((k % 5, Tracked::new(k, &ledger)));
	}
	assert_eq!(tree.erase_key(&0), 10);
	assert_eq!(ledger.live(), 40);

	let pos = tree.find(&1);
	*tree.get_value_mut(pos).unwrap() = Tracked::new(1_000, &ledger);
	assert_eq!(ledger.live(), 40);

	drop(tree);
	assert_eq!(ledger.live(), 0);
}
