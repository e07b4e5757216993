//! Spin first, then back off to another wait strategy.

use tracing::{debug, trace};

use crate::barrier::Barrier;
use crate::cursor::Dependency;
use crate::wait_strategies::{Blocking, WaitError, WaitStrategy, Yielding};
use crate::Sequence;

/// Number of polls used by [`SpinCountBackoff::default`].
pub const DEFAULT_SPIN_TRIES: u32 = 100;

/// Busy spins for a fixed number of polls and then delegates the rest of the wait to a fallback
/// strategy.
///
/// Spinning gives the lowest latency when the sequence arrives within a few polls. Once the spin
/// tries are used up, the wait is handed to `fallback` (e.g. [`Blocking`]) which conserves CPU
/// while the producer is stalled.
///
/// The spin phase neither yields nor checks the barrier for alerts. An alert is observed once the
/// fallback has taken over, or not at all if the sequence arrives first.
///
/// # Examples
///
/// ```
/// use disruptor_wait::{Blocking, SpinCountBackoff};
///
/// let strategy = SpinCountBackoff::new(1_000, Blocking::new());
/// assert_eq!(strategy.spin_tries(), 1_000);
/// ```
#[derive(Clone, Debug)]
pub struct SpinCountBackoff<F> {
	spin_tries: u32,
	fallback:   F,
}

impl<F: WaitStrategy> SpinCountBackoff<F> {
	/// Creates a strategy spinning `spin_tries` times before waiting with `fallback`.
	///
	/// # Panics
	///
	/// Panics if `spin_tries` is zero.
	pub fn new(spin_tries: u32, fallback: F) -> Self {
		assert!(spin_tries > 0, "Spin tries must be positive.");
		debug!(spin_tries, fallback = std::any::type_name::<F>(), "Creating spin count backoff wait strategy.");
		Self { spin_tries, fallback }
	}

	/// Number of polls before the fallback takes over.
	pub fn spin_tries(&self) -> u32 {
		self.spin_tries
	}

	/// The strategy used once the spin tries are used up.
	pub fn fallback(&self) -> &F {
		&self.fallback
	}
}

impl SpinCountBackoff<Blocking> {
	/// Spins `spin_tries` times and then blocks until the producer signals.
	pub fn with_blocking(spin_tries: u32) -> Self {
		Self::new(spin_tries, Blocking::new())
	}
}

impl SpinCountBackoff<Yielding> {
	/// Spins `spin_tries` times and then yields the thread between polls.
	///
	/// The fallback yields on every poll; it does not spin again.
	pub fn with_yielding(spin_tries: u32) -> Self {
		Self::new(spin_tries, Yielding::new(0))
	}
}

impl<F: WaitStrategy + Default> Default for SpinCountBackoff<F> {
	/// Spins [`DEFAULT_SPIN_TRIES`] times before delegating to `F::default()`.
	fn default() -> Self {
		Self::new(DEFAULT_SPIN_TRIES, F::default())
	}
}

impl<F: WaitStrategy> WaitStrategy for SpinCountBackoff<F> {
	#[inline]
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		let mut counter = self.spin_tries;
		loop {
			let available = dependent.get();
			if available >= sequence {
				return Ok(available);
			}

			counter -= 1;
			if counter == 0 {
				trace!(sequence, available, "Spin tries exhausted, delegating to fallback.");
				return self.fallback.wait_for(sequence, cursor, dependent, barrier);
			}
		}
	}

	fn signal_all_when_blocking(&self) {
		self.fallback.signal_all_when_blocking();
	}
}
