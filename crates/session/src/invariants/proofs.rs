//! Proofs for session invariants.

use std::collections::VecDeque;

use proofdoc_protocol::{Command, Feedback, RichText, StateId};
use proptest::prelude::*;

use crate::session::{Advance, Retreat, SyncOutcome};
use crate::testing::{Harness, add};
use crate::{Mark, StatementContainer, StatementKey};

const PARTS: [&str; 2] = [
	r#"Check a. (* note *) Check b. Comments "dump: x"."#,
	"Check c. Check d. (* end *) Check e.",
];

/// Kernel model: a stack of states, replying to one command at a time.
#[derive(Debug, Default)]
struct Kernel {
	states: Vec<i64>,
	next: i64,
	outstanding: VecDeque<Command>,
	max_outstanding: usize,
}

impl Kernel {
	fn new(root: i64) -> Self {
		Self {
			next: root,
			..Self::default()
		}
	}

	fn receive(&mut self, commands: Vec<Command>) {
		for command in commands {
			if let Command::Add { text, .. } = &command {
				assert!(!text.starts_with("(*"), "comment submitted: {text}");
				assert!(!text.starts_with("Comments \"dump"), "directive submitted: {text}");
			}
			if command.is_mutating() {
				self.outstanding.push_back(command);
			}
		}
		self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
	}

	/// Refuse the outstanding `Add`, as the kernel does for a statement that does not parse.
	fn reject(&mut self) -> bool {
		if matches!(self.outstanding.front(), Some(Command::Add { .. })) {
			self.outstanding.pop_front();
			true
		} else {
			false
		}
	}

	fn reply(&mut self) -> Option<Feedback> {
		match self.outstanding.pop_front()? {
			Command::Add { after, .. } => {
				assert_eq!(after.0, self.states.last().copied().unwrap_or(1), "Add names the kernel tip as parent");
				self.next += 1;
				self.states.push(self.next);
				Some(Feedback::Added(StateId(self.next)))
			}
			Command::Cancel(id) => {
				let pos = self.states.iter().position(|s| *s == id.0).unwrap_or(self.states.len());
				let cancelled = self.states.split_off(pos);
				Some(Feedback::Cancelled(cancelled.into_iter().map(StateId).collect()))
			}
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy)]
enum Op {
	Advance,
	Retreat,
	Reply,
	Reject,
	FailCommitted(usize),
	Sync(usize, usize),
	Reset,
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		3 => Just(Op::Advance),
		1 => Just(Op::Retreat),
		4 => Just(Op::Reply),
		1 => Just(Op::Reject),
		1 => (0usize..8).prop_map(Op::FailCommitted),
		1 => (0usize..2, 0usize..40).prop_map(|(c, off)| Op::Sync(c, off)),
		1 => Just(Op::Reset),
	]
}

fn simulate(ops: &[Op], mut check: impl FnMut(&Harness, &Kernel)) {
	let mut h = Harness::ready(&PARTS);
	let mut kernel = Kernel::new(1);

	for op in ops {
		match *op {
			Op::Advance => {
				h.session.advance(false);
			}
			Op::Retreat => {
				h.session.retreat(true);
			}
			Op::Reply => {
				if let Some(feedback) = kernel.reply() {
					h.feed(feedback);
				}
			}
			Op::Reject => {
				if kernel.reject() {
					h.error(StateId::SENTINEL.0, "rejected");
				}
			}
			Op::FailCommitted(pick) => {
				// Errors for committed states may arrive while anything is outstanding.
				if !kernel.states.is_empty() {
					let id = kernel.states[pick % kernel.states.len()];
					h.error(id, "failure");
				}
			}
			Op::Sync(container, offset) => {
				h.point(container, offset);
				let _ = h.session.sync_to_cursor();
			}
			Op::Reset => {
				h.session.reset();
			}
		}
		kernel.receive(h.drain());
		check(&h, &kernel);
	}
}

fn error_marks(h: &Harness) -> usize {
	h.session
		.containers()
		.iter()
		.map(|buffer| buffer.marks().iter().filter(|mark| **mark == Mark::Error).count())
		.sum()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(128))]

	#[test]
	fn test_single_mutation_in_flight(ops in prop::collection::vec(op(), 1..80)) {
		simulate(&ops, |_, kernel| assert!(kernel.max_outstanding <= 1, "{:?}", kernel.outstanding));
	}

	#[test]
	fn test_committed_order_matches_kernel(ops in prop::collection::vec(op(), 1..80)) {
		simulate(&ops, |h, kernel| {
			let ids = h.committed_ids();
			assert!(ids.windows(2).all(|w| w[0] < w[1]), "committed out of order: {ids:?}");
			if kernel.outstanding.is_empty() {
				assert_eq!(ids, kernel.states);
			}
			assert!(error_marks(h) <= 1);
		});
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_advance_waits_for_cancel() {
	let mut h = Harness::ready(&["Check a. Check b. Check c."]);
	h.session.advance(true);
	h.added(2);
	h.session.advance(true);
	h.added(3);
	h.session.advance(true);
	h.drain();

	// A failure of a committed state while the Add for c is outstanding.
	h.error(2, "bad");
	assert_eq!(h.session.advance(true), Advance::Busy);
	assert!(h.drain().is_empty());

	h.added(4);
	assert_eq!(h.drain(), vec![Command::Cancel(StateId(2))]);
	assert_eq!(h.session.advance(true), Advance::Busy);

	h.cancelled(&[2, 3, 4]);
	assert!(h.session.ledger().is_quiescent());
	assert_eq!(h.session.advance(true), Advance::Submitted(StatementKey::new(0, 0)));
	assert_eq!(h.drain(), vec![add(1, "Check a.")]);
}

#[cfg_attr(test, test)]
pub(crate) fn test_registry_mirrors_committed() {
	let mut h = Harness::ready(&["Check a. Check b."]);
	h.session.advance(true);
	h.added(2);
	h.session.advance(true);
	h.added(3);
	assert!(h.session.ledger().statement(StateId(3)).is_some());

	assert_eq!(h.session.retreat(true), Retreat::Requested(StateId(3)));
	assert!(h.session.ledger().statement(StateId(3)).is_some(), "kept until the kernel confirms");
	h.cancelled(&[3]);
	assert!(h.session.ledger().statement(StateId(3)).is_none());
	assert_eq!(h.session.ledger().session_id_of(StatementKey::new(0, 1)), None);
	assert_eq!(h.session.ledger().session_id_of(StatementKey::new(0, 0)), Some(StateId(2)));
}

#[cfg_attr(test, test)]
pub(crate) fn test_failure_abandons_queue() {
	let mut h = Harness::ready(&["Check a. Check b. Check c."]);
	h.point(0, 25);
	assert_eq!(h.session.sync_to_cursor(), Ok(SyncOutcome::Seeking));
	h.added(2);
	h.error(-1, "bad");

	assert!(h.session.ledger().is_quiescent());
	assert!(!h.session.is_seeking());
	assert_eq!(error_marks(&h), 1);
	assert_eq!(h.mark(0, 1), Mark::Error);
	assert_eq!(h.mark(0, 2), Mark::Clear);
}

#[cfg_attr(test, test)]
pub(crate) fn test_comments_never_submitted() {
	let mut h = Harness::ready(&PARTS);
	let mut kernel = Kernel::new(1);
	loop {
		match h.session.advance(false) {
			Advance::EndOfInput => break,
			Advance::Submitted(_) => {
				kernel.receive(h.drain());
				let feedback = kernel.reply().unwrap();
				h.feed(feedback);
			}
			Advance::Comment(key) | Advance::Directive(key, _) => {
				assert_eq!(h.session.containers().mark_of(key), Mark::Ok);
			}
			Advance::Disabled | Advance::Busy => unreachable!("every reply is fed before advancing"),
		}
	}
	kernel.receive(h.drain());
	assert_eq!(h.committed_texts(), vec!["Check a.", "Check b.", "Check c.", "Check d.", "Check e."]);
}

#[cfg_attr(test, test)]
pub(crate) fn test_feedback_for_unknown_state_dropped() {
	let mut h = Harness::ready(&["Check a."]);
	h.session.advance(true);
	h.added(2);
	h.drain();
	h.observer.take();

	h.feed(Feedback::Processed(StateId(9)));
	h.feed(Feedback::GoalInfo {
		id: StateId(9),
		goals: RichText::text("x"),
	});
	h.cancelled(&[9]);

	assert!(h.drain().is_empty());
	assert!(h.observer.take().is_empty());
	assert_eq!(h.committed_ids(), vec![2]);
	assert_eq!(h.mark(0, 0), Mark::Processing);
}

#[cfg_attr(test, test)]
pub(crate) fn test_goals_shown_only_when_idle() {
	let mut h = Harness::ready(&["Check a. Check b."]);
	h.session.advance(true);
	h.session.advance(true);
	h.added(2);
	h.feed(Feedback::GoalInfo {
		id: StateId(2),
		goals: RichText::text("busy"),
	});
	assert!(h.observer.goals().is_empty());

	h.added(3);
	h.feed(Feedback::GoalInfo {
		id: StateId(3),
		goals: RichText::text("idle"),
	});
	assert_eq!(h.observer.goals(), vec![Some("idle".into())]);
	let buffer = h.session.containers().get(crate::ContainerId(0)).unwrap();
	assert_eq!(buffer.mark_of(1), Mark::Processing);
}
