//! Wait strategies for consumers of a low latency, Disruptor style pipeline.
//!
//! A consumer that needs sequence `n` waits on a [`SequenceBarrier`] until the producer's
//! [`Cursor`] (and every upstream consumer it depends on) has reached `n`. *How* it waits is
//! decided by a pluggable [`WaitStrategy`]:
//!
//! - [`BusySpin`] and [`BusySpinWithSpinLoopHint`] give the lowest latency and burn a core.
//! - [`Yielding`] and [`Sleeping`] back off to the OS scheduler.
//! - [`Blocking`] and [`TimeoutBlocking`] park the thread until the producer signals.
//! - [`SpinCountBackoff`] busy spins for a bounded number of polls and then delegates the rest of
//!   the wait to any other strategy.
//!
//! A strategy is immutable once built and is shared by all consumers (and the producer, which
//! calls [`WaitStrategy::signal_all_when_blocking`] after publishing).
//!
//! # Shutdown
//!
//! Calling [`SequenceBarrier::alert`] makes any wait on the barrier fail with
//! [`WaitError::Alerted`], which consumers treat as the signal to stop.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use disruptor_wait::*;
//!
//! // Spin 1000 times, then block until the producer signals.
//! let strategy = Arc::new(SpinCountBackoff::with_blocking(1_000));
//! let cursor   = Arc::new(Cursor::new(NONE));
//! let barrier  = SequenceBarrier::new(Arc::clone(&strategy), Arc::clone(&cursor), vec![]);
//!
//! thread::scope(|s| {
//!     // Producer.
//!     s.spawn(|| {
//!         for sequence in 0..10 {
//!             cursor.set(sequence);
//!             strategy.signal_all_when_blocking();
//!         }
//!     });
//!
//!     // Consumer.
//!     let mut next = 0;
//!     while next < 10 {
//!         let available = barrier.wait_for(next).expect("Barrier should not be alerted.");
//!         assert!(available >= next);
//!         next = available + 1;
//!     }
//! });
//!
//! barrier.alert();
//! assert_eq!(barrier.wait_for(10), Err(WaitError::Alerted));
//! ```

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

/// The type for Sequence numbers ([`i64`]).
pub type Sequence = i64;

pub mod barrier;
pub mod cursor;
pub mod wait_strategies;

#[cfg(test)]
mod test_doubles;

pub use crate::barrier::{Barrier, SequenceBarrier, NONE};
pub use crate::cursor::{Cursor, Dependency, SequenceGroup};
pub use crate::wait_strategies::{
	Blocking,
	BusySpin,
	BusySpinWithSpinLoopHint,
	Sleeping,
	SpinCountBackoff,
	TimeoutBlocking,
	WaitError,
	WaitStrategy,
	Yielding,
};
