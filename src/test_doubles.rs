//! Scripted sequences, barriers and strategies for exercising wait strategies deterministically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::Mutex;

use crate::barrier::Barrier;
use crate::cursor::Dependency;
use crate::wait_strategies::{WaitError, WaitStrategy};
use crate::Sequence;

/// Sequence that counts its polls and optionally jumps to a new value at a given poll.
pub(crate) struct ScriptedSequence {
	initial:    Sequence,
	advanced:   Sequence,
	/// 1-based poll from which `advanced` is read. Zero means never.
	advance_at: usize,
	polls:      AtomicUsize,
}

impl ScriptedSequence {
	/// Always reads `value`.
	pub(crate) fn fixed(value: Sequence) -> Self {
		Self::advancing_at(0, value, value)
	}

	/// Reads `initial` until poll number `poll` (1-based), and `advanced` from then on.
	pub(crate) fn advancing_at(poll: usize, initial: Sequence, advanced: Sequence) -> Self {
		Self {
			initial,
			advanced,
			advance_at: poll,
			polls: AtomicUsize::new(0),
		}
	}

	pub(crate) fn polls(&self) -> usize {
		self.polls.load(Ordering::Acquire)
	}
}

impl Dependency for ScriptedSequence {
	fn get(&self) -> Sequence {
		let poll = self.polls.fetch_add(1, Ordering::AcqRel) + 1;
		if self.advance_at != 0 && poll >= self.advance_at {
			self.advanced
		} else {
			self.initial
		}
	}
}

/// Barrier with nothing but a settable alert flag.
#[derive(Default)]
pub(crate) struct AlertFlag {
	alerted: AtomicBool,
}

impl AlertFlag {
	pub(crate) fn alerted() -> Self {
		Self { alerted: AtomicBool::new(true) }
	}

	pub(crate) fn alert(&self) {
		self.alerted.store(true, Ordering::Release);
	}
}

impl Barrier for AlertFlag {
	fn is_alerted(&self) -> bool {
		self.alerted.load(Ordering::Acquire)
	}
}

/// Address of a dependency, for checking which object a strategy was handed.
pub(crate) fn address_of(dependency: &dyn Dependency) -> usize {
	dependency as *const dyn Dependency as *const () as usize
}

/// Arguments a [`RecordingFallback`] received in one `wait_for` call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct Delegation {
	pub(crate) sequence:  Sequence,
	pub(crate) cursor:    usize,
	pub(crate) dependent: usize,
}

/// Fallback that records every call and answers with a fixed outcome without waiting.
///
/// Cursor and dependent are recorded by address so that recording does not poll them.
pub(crate) struct RecordingFallback {
	outcome:     Result<Sequence, WaitError>,
	delegations: Mutex<Vec<Delegation>>,
	signals:     AtomicUsize,
}

impl RecordingFallback {
	pub(crate) fn returning(outcome: Result<Sequence, WaitError>) -> Self {
		Self {
			outcome,
			delegations: Mutex::new(Vec::new()),
			signals:     AtomicUsize::new(0),
		}
	}

	/// Sequences passed to `wait_for`, in call order.
	pub(crate) fn calls(&self) -> Vec<Sequence> {
		self.delegations.lock().iter().map(|d| d.sequence).collect()
	}

	/// Full arguments of every `wait_for` call, in call order.
	pub(crate) fn delegations(&self) -> Vec<Delegation> {
		self.delegations.lock().clone()
	}

	pub(crate) fn signals(&self) -> usize {
		self.signals.load(Ordering::Acquire)
	}
}

impl WaitStrategy for RecordingFallback {
	fn wait_for(&self, sequence: Sequence, cursor: &dyn Dependency, dependent: &dyn Dependency, _barrier: &dyn Barrier)
	-> Result<Sequence, WaitError> {
		self.delegations.lock().push(Delegation {
			sequence,
			cursor:    address_of(cursor),
			dependent: address_of(dependent),
		});
		self.outcome
	}

	fn signal_all_when_blocking(&self) {
		self.signals.fetch_add(1, Ordering::AcqRel);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scripted_sequence_advances_at_given_poll() {
		let sequence = ScriptedSequence::advancing_at(3, 1, 8);

		assert_eq!(sequence.get(), 1);
		assert_eq!(sequence.get(), 1);
		assert_eq!(sequence.get(), 8);
		assert_eq!(sequence.get(), 8);
		assert_eq!(sequence.polls(), 4);
	}

	#[test]
	fn alert_flag_can_be_raised() {
		let flag = AlertFlag::default();
		assert_eq!(flag.check_alert(), Ok(()));

		flag.alert();
		assert_eq!(flag.check_alert(), Err(WaitError::Alerted));
	}
}
