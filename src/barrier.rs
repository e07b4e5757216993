//! Barriers aggregate the sequences a consumer depends on and carry the alert (shutdown) signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::cursor::{Cursor, SequenceGroup};
use crate::wait_strategies::{WaitError, WaitStrategy};
use crate::Sequence;

/// Indicates no sequence number has been claimed (yet).
pub const NONE: Sequence = -1;

/// Alert state consulted by wait strategies while they wait.
pub trait Barrier: Send + Sync {
	/// Whether the barrier has been alerted, i.e. the consumer should stop waiting.
	fn is_alerted(&self) -> bool;

	/// Returns [`WaitError::Alerted`] if the barrier has been alerted.
	#[inline]
	fn check_alert(&self) -> Result<(), WaitError> {
		if self.is_alerted() {
			Err(WaitError::Alerted)
		} else {
			Ok(())
		}
	}
}

/// Barrier used by a consumer to wait for the producer's cursor and any upstream consumers.
///
/// The wait strategy is shared (via [`Arc`]) with the producer side, which must call
/// [`WaitStrategy::signal_all_when_blocking`] whenever it publishes.
pub struct SequenceBarrier<W> {
	wait_strategy: Arc<W>,
	cursor:        Arc<Cursor>,
	dependents:    SequenceGroup,
	alerted:       AtomicBool,
}

impl<W: WaitStrategy> SequenceBarrier<W> {
	/// Creates a barrier gated on the producer `cursor` and all `dependents`.
	///
	/// With no dependents, the barrier waits for the producer `cursor` directly.
	pub fn new(wait_strategy: Arc<W>, cursor: Arc<Cursor>, dependents: Vec<Arc<Cursor>>) -> Self {
		debug!(dependents = dependents.len(), "Creating sequence barrier.");
		Self {
			wait_strategy,
			cursor,
			dependents: SequenceGroup::new(dependents),
			alerted: AtomicBool::new(false),
		}
	}

	/// Waits until `sequence` is available and returns the highest available sequence.
	///
	/// # Errors
	///
	/// Returns [`WaitError::Alerted`] if the barrier is (or gets) alerted, and any other error
	/// raised by the wait strategy.
	pub fn wait_for(&self, sequence: Sequence) -> Result<Sequence, WaitError> {
		self.check_alert()?;

		if self.dependents.is_empty() {
			self.wait_strategy.wait_for(sequence, &*self.cursor, &*self.cursor, self)
		} else {
			self.wait_strategy.wait_for(sequence, &*self.cursor, &self.dependents, self)
		}
	}

	/// Alerts the barrier and wakes any consumer blocked in the wait strategy.
	pub fn alert(&self) {
		debug!("Alerting sequence barrier.");
		self.alerted.store(true, Ordering::Release);
		self.wait_strategy.signal_all_when_blocking();
	}

	/// Clears a previous alert.
	pub fn clear_alert(&self) {
		debug!("Clearing sequence barrier alert.");
		self.alerted.store(false, Ordering::Release);
	}

	/// The producer cursor this barrier is gated on.
	pub fn cursor(&self) -> &Arc<Cursor> {
		&self.cursor
	}
}

impl<W: WaitStrategy> Barrier for SequenceBarrier<W> {
	#[inline]
	fn is_alerted(&self) -> bool {
		self.alerted.load(Ordering::Acquire)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wait_strategies::{BusySpin, SpinCountBackoff};
	use std::thread;
	use std::time::Duration;

	#[test]
	fn waits_for_cursor_without_dependents() {
		let cursor  = Arc::new(Cursor::new(7));
		let barrier = SequenceBarrier::new(Arc::new(BusySpin), Arc::clone(&cursor), vec![]);

		assert_eq!(barrier.wait_for(5), Ok(7));
		assert!(Arc::ptr_eq(barrier.cursor(), &cursor));
	}

	#[test]
	fn waits_for_slowest_dependent() {
		let cursor   = Arc::new(Cursor::new(20));
		let upstream = Arc::new(Cursor::new(3));
		let barrier  = SequenceBarrier::new(Arc::new(BusySpin), cursor, vec![upstream.clone()]);

		thread::scope(|s| {
			s.spawn(|| {
				thread::sleep(Duration::from_millis(5));
				upstream.set(9);
			});
			assert_eq!(barrier.wait_for(8), Ok(9));
		});
	}

	#[test]
	fn alerted_barrier_fails_before_waiting() {
		let cursor  = Arc::new(Cursor::new(100));
		let barrier = SequenceBarrier::new(Arc::new(BusySpin), cursor, vec![]);

		barrier.alert();
		assert!(barrier.is_alerted());
		assert_eq!(barrier.wait_for(0), Err(WaitError::Alerted));

		barrier.clear_alert();
		assert_eq!(barrier.wait_for(0), Ok(100));
	}

	#[test]
	fn alert_releases_waiting_consumer() {
		let cursor   = Arc::new(Cursor::default());
		let strategy = Arc::new(SpinCountBackoff::with_blocking(10));
		let barrier  = SequenceBarrier::new(strategy, cursor, vec![]);

		thread::scope(|s| {
			let waiter = s.spawn(|| barrier.wait_for(0));
			thread::sleep(Duration::from_millis(10));
			barrier.alert();
			assert_eq!(waiter.join().expect("Waiter should not panic."), Err(WaitError::Alerted));
		});
	}
}
