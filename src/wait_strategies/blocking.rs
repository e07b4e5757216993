//! Wait strategies parking the consumer thread until the producer signals.

use std::hint;
use std::time::{Duration, Instant};
use parking_lot::{Condvar, Mutex};

use crate::barrier::Barrier;
use crate::cursor::Dependency;
use crate::wait_strategies::{WaitError, WaitStrategy};
use crate::Sequence;

/// Blocks on a condition variable until the producer cursor reaches the sequence.
///
/// Uses the least CPU of all strategies but has the highest latency. The producer must call
/// [`WaitStrategy::signal_all_when_blocking`] after every publication.
#[derive(Debug, Default)]
pub struct Blocking {
	mutex:   Mutex<()>,
	condvar: Condvar,
}

impl Blocking {
	/// Creates a new `Blocking` strategy.
	pub fn new() -> Self {
		Self::default()
	}
}

impl WaitStrategy for Blocking {
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		if cursor.get() < sequence {
			let mut guard = self.mutex.lock();
			while cursor.get() < sequence {
				barrier.check_alert()?;
				self.condvar.wait(&mut guard);
			}
		}

		spin_on_dependent(sequence, dependent, barrier)
	}

	fn signal_all_when_blocking(&self) {
		let _guard = self.mutex.lock();
		self.condvar.notify_all();
	}
}

/// Like [`Blocking`] but gives up with [`WaitError::TimedOut`] once `timeout` has elapsed while
/// waiting for the producer.
#[derive(Debug)]
pub struct TimeoutBlocking {
	mutex:   Mutex<()>,
	condvar: Condvar,
	timeout: Duration,
}

impl TimeoutBlocking {
	/// Creates a new `TimeoutBlocking` strategy waiting at most `timeout` per call.
	pub fn new(timeout: Duration) -> Self {
		Self {
			mutex:   Mutex::new(()),
			condvar: Condvar::new(),
			timeout,
		}
	}

	/// The configured timeout.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

impl WaitStrategy for TimeoutBlocking {
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		if cursor.get() < sequence {
			// A timeout too large to represent as an instant never expires.
			let deadline  = Instant::now().checked_add(self.timeout);
			let mut guard = self.mutex.lock();
			while cursor.get() < sequence {
				barrier.check_alert()?;
				match deadline {
					Some(deadline) => {
						let result = self.condvar.wait_until(&mut guard, deadline);
						if result.timed_out() && cursor.get() < sequence {
							return Err(WaitError::TimedOut);
						}
					}
					None => self.condvar.wait(&mut guard),
				}
			}
		}

		spin_on_dependent(sequence, dependent, barrier)
	}

	fn signal_all_when_blocking(&self) {
		let _guard = self.mutex.lock();
		self.condvar.notify_all();
	}
}

/// The producer has published `sequence`; upstream consumers are expected to follow shortly.
#[inline]
fn spin_on_dependent(sequence: Sequence, dependent: &dyn Dependency, barrier: &dyn Barrier)
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
