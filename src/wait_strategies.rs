//! Module with different strategies for waiting for a sequence to be published.
//!
//! The lowest latency possible is the [`BusySpin`] strategy.
//!
//! To "waste" less CPU time and power, use one of the other strategies which have higher latency.
//! [`SpinCountBackoff`] combines the two: it busy spins for a bounded number of polls and then
//! hands the rest of the wait to a fallback strategy, e.g. [`Blocking`].

use std::hint;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::barrier::Barrier;
use crate::cursor::Dependency;
use crate::Sequence;

mod blocking;
mod spin_count_backoff;

pub use blocking::{Blocking, TimeoutBlocking};
pub use spin_count_backoff::{SpinCountBackoff, DEFAULT_SPIN_TRIES};

/// Reasons a wait can end without the sequence becoming available.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum WaitError {
	/// The barrier was alerted, typically because the pipeline is shutting down.
	#[error("Barrier alerted.")]
	Alerted,
	/// The waiting thread was interrupted while parked by the wait strategy.
	#[error("Wait interrupted.")]
	Interrupted,
	/// The wait strategy's deadline elapsed before the sequence became available.
	#[error("Wait timed out.")]
	TimedOut,
}

/// Wait strategies are used by consumers when the sequence they need has not been published yet.
///
/// A single instance is shared by all consumers of a pipeline, so implementations must keep all
/// per-wait state local to [`WaitStrategy::wait_for`].
pub trait WaitStrategy: Send + Sync {
	/// Waits until `dependent` reaches (at least) `sequence` and returns the value observed.
	///
	/// `cursor` is the producer's position, for strategies that block until the producer
	/// signals. `barrier` carries the alert state.
	///
	/// # Errors
	///
	/// [`WaitError::Alerted`] if the barrier is alerted while waiting, and
	/// [`WaitError::Interrupted`] or [`WaitError::TimedOut`] for strategies that support them.
	fn wait_for(
		&self,
		sequence:  Sequence,
		cursor:    &dyn Dependency,
		dependent: &dyn Dependency,
		barrier:   &dyn Barrier,
	) -> Result<Sequence, WaitError>;

	/// Wakes up any consumer blocked in [`WaitStrategy::wait_for`].
	///
	/// Must be called by the producer side every time a sequence is published.
	fn signal_all_when_blocking(&self);
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &W {
	#[inline]
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		(**self).wait_for(sequence, cursor, dependent, barrier)
	}

	#[inline]
	fn signal_all_when_blocking(&self) {
		(**self).signal_all_when_blocking()
	}
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for Box<W> {
	#[inline]
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		(**self).wait_for(sequence, cursor, dependent, barrier)
	}

	#[inline]
	fn signal_all_when_blocking(&self) {
		(**self).signal_all_when_blocking()
	}
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for Arc<W> {
	#[inline]
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		(**self).wait_for(sequence, cursor, dependent, barrier)
	}

	#[inline]
	fn signal_all_when_blocking(&self) {
		(**self).signal_all_when_blocking()
	}
}

/// Busy spin wait strategy. Lowest possible latency.
#[derive(Copy, Clone, Debug, Default)]
pub struct BusySpin;

impl WaitStrategy for BusySpin {
	#[inline]
	fn wait_for(&self, sequence: Sequence, _cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		loop {
			let available = dependent.get();
			if available >= sequence {
				return Ok(available);
			}
			barrier.check_alert()?;
			// Do nothing, true busy spin.
		}
	}

	fn signal_all_when_blocking(&self) {}
}

/// Busy spin wait strategy with spin loop hint which enables the processor to optimize its behavior
/// by e.g. saving power os switching hyper threads. Obviously, this can induce latency.
///
/// See also [`BusySpin`].
#[derive(Copy, Clone, Debug, Default)]
pub struct BusySpinWithSpinLoopHint;

impl WaitStrategy for BusySpinWithSpinLoopHint {
	fn wait_for(&self, sequence: Sequence, _cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		loop {
			let available = dependent.get();
			if available >= sequence {
				return Ok(available);
			}
			barrier.check_alert()?;
			hint::spin_loop();
		}
	}

	fn signal_all_when_blocking(&self) {}
}

/// This strategy spins for a configurable number of times and then yields the thread on every
/// subsequent poll.
#[derive(Copy, Clone, Debug)]
pub struct Yielding {
	spin_tries: u32
}

impl Yielding {
	/// Creates a new `Yielding` strategy.
	///
	/// `spin_tries` is the number of times the strategy will spin before yielding.
	pub const fn new(spin_tries: u32) -> Self {
		Self { spin_tries }
	}
}

impl Default for Yielding {
	/// Creates a new `Yielding` strategy with 100 spin tries.
	fn default() -> Self {
		Self { spin_tries: 100 }
	}
}

impl WaitStrategy for Yielding {
	fn wait_for(&self, sequence: Sequence, _cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		let mut counter = self.spin_tries;
		loop {
			let available = dependent.get();
			if available >= sequence {
				return Ok(available);
			}
			barrier.check_alert()?;

			if counter == 0 {
				thread::yield_now();
			} else {
				counter -= 1;
			}
		}
	}

	fn signal_all_when_blocking(&self) {}
}

const DEFAULT_RETRIES: u32 = 200;
const SPIN_THRESHOLD: u32 = 100;
const DEFAULT_SLEEP: Duration = Duration::from_nanos(100);

/// Wait strategy that "backs off" from spinning to yielding and finally to sleeping.
///
/// Spins while the retry counter is above 100, yields while it is above 0, and sleeps for
/// `sleep_time` on every poll after that.
#[derive(Copy, Clone, Debug)]
pub struct Sleeping {
	retries:    u32,
	sleep_time: Duration,
}

impl Sleeping {
	/// Creates a new strategy with custom `retries` and `sleep_time`.
	pub const fn new(retries: u32, sleep_time: Duration) -> Self {
		Self { retries, sleep_time }
	}

	/// Creates a new strategy with a custom number of `retries` and the default sleep of 100 ns.
	pub const fn with_retries(retries: u32) -> Self {
		Self::new(retries, DEFAULT_SLEEP)
	}

	#[inline]
	fn apply_wait_method(&self, barrier: &dyn Barrier, counter: u32) -> Result<u32, WaitError> {
		barrier.check_alert()?;

		if counter > SPIN_THRESHOLD {
			Ok(counter - 1)
		} else if counter > 0 {
			thread::yield_now();
			Ok(counter - 1)
		} else {
			thread::sleep(self.sleep_time);
			Ok(counter)
		}
	}
}

impl Default for Sleeping {
	fn default() -> Self {
		Self::new(DEFAULT_RETRIES, DEFAULT_SLEEP)
	}
}

impl WaitStrategy for Sleeping {
	fn wait_for(&self, sequence: Sequence, _cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		let mut counter = self.retries;
		loop {
			let available = dependent.get();
			if available >= sequence {
				return Ok(available);
			}
			counter = self.apply_wait_method(barrier, counter)?;
		}
	}

	fn signal_all_when_blocking(&self) {}
}
