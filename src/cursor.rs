//! Sequence counters that wait strategies read from.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use crossbeam_utils::CachePadded;

use crate::Sequence;

/// Read side of a monotonically increasing sequence.
///
/// Implementations must load with (at least) [`Ordering::Acquire`] so that everything written
/// before the sequence was published is visible to the reader.
pub trait Dependency: Send + Sync {
	/// Gets the current value of the sequence.
	fn get(&self) -> Sequence;
}

/// Cache padded atomic sequence written by one stage of a pipeline and read by others.
pub struct Cursor {
	counter: CachePadded<AtomicI64>
}

impl Cursor {
	/// Creates a new `Cursor` starting at `start_value`.
	pub fn new(start_value: Sequence) -> Self {
		Self {
			counter: CachePadded::new(AtomicI64::new(start_value))
		}
	}

	/// Claims the next sequence and returns it.
	#[inline]
	pub fn next(&self) -> Sequence {
		self.counter.fetch_add(1, Ordering::AcqRel) + 1
	}

	/// Publishes `sequence` with [`Ordering::Release`] semantics.
	#[inline]
	pub fn set(&self, sequence: Sequence) {
		self.counter.store(sequence, Ordering::Release);
	}

	/// Sets `new` if the cursor currently holds `current`.
	///
	/// Returns the previous value in both cases, wrapped in `Ok` on success.
	#[inline]
	pub fn compare_and_set(&self, current: Sequence, new: Sequence) -> Result<Sequence, Sequence> {
		self.counter.compare_exchange(current, new, Ordering::AcqRel, Ordering::Acquire)
	}

	#[inline]
	pub(crate) fn relaxed_value(&self) -> Sequence {
		self.counter.load(Ordering::Relaxed)
	}
}

impl Default for Cursor {
	/// Creates a `Cursor` at [`crate::barrier::NONE`].
	fn default() -> Self {
		Self::new(crate::barrier::NONE)
	}
}

impl std::fmt::Debug for Cursor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Cursor").field(&self.relaxed_value()).finish()
	}
}

impl Dependency for Cursor {
	#[inline]
	fn get(&self) -> Sequence {
		self.counter.load(Ordering::Acquire)
	}
}

impl<D: Dependency + ?Sized> Dependency for &D {
	#[inline]
	fn get(&self) -> Sequence {
		(**self).get()
	}
}

impl<D: Dependency + ?Sized> Dependency for Arc<D> {
	#[inline]
	fn get(&self) -> Sequence {
		(**self).get()
	}
}

/// A group of cursors read as one: the position of the slowest member.
///
/// An empty group never gates anything and reads as [`i64::MAX`].
#[derive(Default, Clone)]
pub struct SequenceGroup {
	cursors: Vec<Arc<Cursor>>
}

impl SequenceGroup {
	/// Creates a group over `cursors`.
	pub fn new(cursors: Vec<Arc<Cursor>>) -> Self {
		Self { cursors }
	}

	/// Adds a cursor to the group.
	pub fn add(&mut self, cursor: Arc<Cursor>) {
		self.cursors.push(cursor);
	}

	/// Number of cursors in the group.
	pub fn len(&self) -> usize {
		self.cursors.len()
	}

	/// Whether the group has no cursors.
	pub fn is_empty(&self) -> bool {
		self.cursors.is_empty()
	}
}

impl Dependency for SequenceGroup {
	#[inline]
	fn get(&self) -> Sequence {
		self.cursors.iter()
			.map(|cursor| cursor.get())
			.min()
			.unwrap_or(i64::MAX)
	}
}
