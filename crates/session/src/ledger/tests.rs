use pretty_assertions::assert_eq;
use proofdoc_protocol::{Command, RichText, StateId};
use tokio::sync::mpsc;

use super::*;
use crate::testing::{RecordingObserver, add, drain};
use crate::{BufferContainer, ChannelGateway, ContainerAggregate, StatementKey};

struct Fixture {
	ledger: Ledger,
	containers: ContainerAggregate<BufferContainer>,
	gateway: ChannelGateway,
	commands: mpsc::UnboundedReceiver<Command>,
	observer: RecordingObserver,
}

impl Fixture {
	fn new(text: &str, interval: u32) -> Self {
		let (gateway, commands) = ChannelGateway::channel();
		Self {
			ledger: Ledger::new(StateId(1), interval),
			containers: ContainerAggregate::new(vec![BufferContainer::new("a.v", text)]),
			gateway,
			commands,
			observer: RecordingObserver::default(),
		}
	}

	fn with<R>(&mut self, f: impl FnOnce(&mut Ledger, &mut Ports<'_, BufferContainer>) -> R) -> R {
		let mut ports = Ports {
			gateway: &mut self.gateway,
			containers: &mut self.containers,
			observer: &self.observer,
		};
		f(&mut self.ledger, &mut ports)
	}

	fn enqueue(&mut self, index: usize) {
		let stmt = self.containers.get_next(index.checked_sub(1).map(|prev| StatementKey::new(0, prev))).unwrap();
		assert_eq!(stmt.key.index, index);
		self.containers.mark(stmt.key, Mark::Processing);
		self.with(|ledger, ports| ledger.enqueue(stmt, ports));
	}

	fn ack(&mut self, id: i64) -> AddAck {
		self.with(|ledger, ports| ledger.acknowledge_add(StateId(id), ports))
	}

	fn drain(&mut self) -> Vec<Command> {
		drain(&mut self.commands)
	}
}

const DOC: &str = "Check a. Check b. Check c. Check d.";

#[test]
fn test_single_add_in_flight() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.enqueue(1);
	fx.enqueue(2);
	assert_eq!(fx.drain(), vec![add(1, "Check a.")]);
	assert_eq!(fx.ledger.pending().len(), 3);
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Add));

	assert_eq!(fx.ack(2), AddAck::Continued);
	assert_eq!(fx.drain(), vec![add(2, "Check b.")]);
	assert_eq!(fx.ack(3), AddAck::Continued);
	assert_eq!(fx.drain(), vec![add(3, "Check c.")]);
	assert_eq!(
		fx.ack(4),
		AddAck::Drained {
			id: StateId(4),
			key: StatementKey::new(0, 2)
		}
	);
	assert!(fx.drain().is_empty());
	assert!(fx.ledger.is_quiescent());
	assert_eq!(fx.ledger.tail_id(), StateId(4));
	assert_eq!(fx.ledger.statement(StateId(3)).map(|s| s.text.as_str()), Some("Check b."));
}

#[test]
fn test_unexpected_ack_is_dropped() {
	let mut fx = Fixture::new(DOC, 48);
	assert_eq!(fx.ack(7), AddAck::Unexpected);
	assert!(fx.ledger.committed().is_empty());
}

#[test]
fn test_periodic_checkpoint() {
	let mut fx = Fixture::new(DOC, 2);
	fx.enqueue(0);
	fx.enqueue(1);
	fx.enqueue(2);
	fx.drain();
	fx.ack(2);
	assert_eq!(fx.drain(), vec![add(2, "Check b.")]);
	fx.ack(3);
	assert_eq!(fx.drain(), vec![Command::Observe(StateId(3)), add(3, "Check c.")]);
}

#[test]
fn test_checkpoint_deduplicated() {
	let mut fx = Fixture::new(DOC, 1);
	fx.enqueue(0);
	fx.drain();
	let AddAck::Drained { id, .. } = fx.ack(2) else {
		panic!("expected drained");
	};
	fx.with(|ledger, ports| ledger.checkpoint(id, ports));
	assert_eq!(fx.drain(), vec![Command::Observe(StateId(2))]);
}

#[test]
fn test_retract_clears_marks_and_refreshes_goals() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.ack(2);
	fx.enqueue(1);
	fx.ack(3);
	fx.drain();
	fx.with(|ledger, ports| {
		ledger.record_goals(StateId(2), RichText::text("n : nat"), ports);
		ledger.record_goals(StateId(3), RichText::text("m : nat"), ports);
	});
	fx.observer.take();

	let removed = fx.with(|ledger, ports| ledger.retract(&[StateId(3), StateId(99)], ports));
	assert_eq!(removed, vec![StatementKey::new(0, 1)]);
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 1)), Mark::Clear);
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 0)), Mark::Processing);
	assert_eq!(fx.observer.goals(), vec![Some("n : nat".to_owned())]);
	assert_eq!(fx.ledger.goals(StateId(3)), None);
}

#[test]
fn test_goals_not_shown_while_pending() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.enqueue(1);
	fx.ack(2);
	let recorded = fx.with(|ledger, ports| ledger.record_goals(StateId(2), RichText::text("g"), ports));
	assert!(recorded);
	assert!(fx.observer.goals().is_empty());
	assert!(!fx.with(|ledger, ports| ledger.record_goals(StateId(42), RichText::text("g"), ports)));
}

#[test]
fn test_sentinel_failure_blames_pending_head() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.enqueue(1);
	fx.enqueue(2);
	fx.drain();

	let failure = fx.with(|ledger, ports| ledger.fail(StateId::SENTINEL, ports)).unwrap();
	assert_eq!(failure.failed, StatementKey::new(0, 0));
	assert_eq!(failure.dropped, vec![StatementKey::new(0, 1), StatementKey::new(0, 2)]);
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 0)), Mark::Error);
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 1)), Mark::Clear);
	assert!(fx.ledger.is_quiescent());
	assert!(fx.drain().is_empty());
}

#[test]
fn test_committed_failure_retracts_suffix_and_cancels() {
	let mut fx = Fixture::new(DOC, 48);
	for (index, id) in [(0, 2), (1, 3), (2, 4)] {
		fx.enqueue(index);
		fx.ack(id);
	}
	fx.drain();

	let failure = fx.with(|ledger, ports| ledger.fail(StateId(3), ports)).unwrap();
	assert_eq!(failure.failed, StatementKey::new(0, 1));
	assert_eq!(failure.dropped, vec![StatementKey::new(0, 2)]);
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(3))]);
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Cancel(StateId(3))));
	assert_eq!(fx.ledger.committed().len(), 1);
	assert_eq!(fx.ledger.last_error(), Some(StatementKey::new(0, 1)));
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 1)), Mark::Error);

	// The kernel's confirmation names states that are already gone.
	let removed = fx.with(|ledger, ports| ledger.retract(&[StateId(3), StateId(4)], ports));
	assert!(removed.is_empty());
	assert!(fx.ledger.is_quiescent());
}

#[test]
fn test_committed_failure_during_add_holds_cancel_back() {
	let mut fx = Fixture::new(DOC, 48);
	for (index, id) in [(0, 2), (1, 3)] {
		fx.enqueue(index);
		fx.ack(id);
	}
	fx.enqueue(2);
	assert_eq!(fx.drain(), vec![add(3, "Check c.")]);

	let failure = fx.with(|ledger, ports| ledger.fail(StateId(2), ports)).unwrap();
	assert_eq!(failure.failed, StatementKey::new(0, 0));
	assert_eq!(failure.dropped, vec![StatementKey::new(0, 2), StatementKey::new(0, 1)]);
	assert!(fx.drain().is_empty(), "Add still outstanding");
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Add));
	assert!(fx.ledger.is_cancelling());
	assert!(fx.ledger.committed().is_empty());

	assert_eq!(fx.ack(4), AddAck::Abandoned);
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(2))]);
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Cancel(StateId(2))));
	assert!(fx.ledger.statement(StateId(4)).is_none());

	fx.with(|ledger, ports| ledger.retract(&[StateId(2), StateId(3), StateId(4)], ports));
	assert!(fx.ledger.is_quiescent());
	assert!(!fx.ledger.is_cancelling());
	assert!(fx.drain().is_empty());
}

#[test]
fn test_rejected_abandoned_add_releases_cancel() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.ack(2);
	fx.enqueue(1);
	fx.drain();

	fx.with(|ledger, ports| ledger.fail(StateId(2), ports));
	assert!(fx.drain().is_empty());

	assert_eq!(fx.with(|ledger, ports| ledger.fail(StateId::SENTINEL, ports)), None);
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(2))]);
	assert_eq!(fx.ledger.last_error(), Some(StatementKey::new(0, 0)));
}

#[test]
fn test_failure_during_cancel_waits_for_confirmation() {
	let mut fx = Fixture::new(DOC, 48);
	for (index, id) in [(0, 2), (1, 3), (2, 4)] {
		fx.enqueue(index);
		fx.ack(id);
	}
	fx.drain();
	fx.with(|ledger, ports| ledger.request_cancel(StateId(4), ports));
	fx.drain();

	fx.with(|ledger, ports| ledger.fail(StateId(2), ports));
	assert!(fx.drain().is_empty());
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Cancel(StateId(4))));

	fx.with(|ledger, ports| ledger.retract(&[StateId(4)], ports));
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(2))]);
	assert_eq!(fx.ledger.in_flight(), Some(InFlight::Cancel(StateId(2))));
}

#[test]
fn test_new_failure_replaces_error_mark() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.with(|ledger, ports| ledger.fail(StateId::SENTINEL, ports));
	assert_eq!(fx.ledger.last_error(), Some(StatementKey::new(0, 0)));

	fx.enqueue(1);
	fx.with(|ledger, ports| ledger.fail(StateId::SENTINEL, ports));
	assert_eq!(fx.ledger.last_error(), Some(StatementKey::new(0, 1)));
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 0)), Mark::Clear);
	assert_eq!(fx.containers.mark_of(StatementKey::new(0, 1)), Mark::Error);

	assert_eq!(fx.with(|ledger, ports| ledger.fail(StateId::SENTINEL, ports)), None, "nothing pending, nothing blamed");
}

#[test]
fn test_enqueue_during_cancel_waits_for_ack() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.ack(2);
	fx.drain();
	fx.with(|ledger, ports| ledger.request_cancel(StateId(2), ports));
	fx.enqueue(1);
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(2))]);

	fx.with(|ledger, ports| ledger.retract(&[StateId(2)], ports));
	assert_eq!(fx.drain(), vec![add(1, "Check b.")]);
}

#[test]
fn test_reset_cancels_first_committed() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.ack(5);
	fx.enqueue(1);
	fx.ack(6);
	fx.enqueue(2);
	fx.drain();

	let cleared = fx.with(|ledger, ports| ledger.reset(ports));
	assert_eq!(cleared.len(), 3);
	assert_eq!(fx.drain(), vec![Command::Cancel(StateId(5))]);
	assert!(fx.ledger.committed().is_empty());
	assert_eq!(fx.ledger.pending().len(), 0);
	assert_eq!(fx.observer.goals(), vec![None]);
	assert_eq!(fx.ledger.tail_id(), StateId(1));
}

#[test]
fn test_first_committed_after_anchor() {
	let mut fx = Fixture::new(DOC, 48);
	fx.enqueue(0);
	fx.ack(2);
	fx.enqueue(1);
	fx.ack(3);
	assert_eq!(fx.ledger.first_committed_after(None), Some(StateId(2)));
	assert_eq!(fx.ledger.first_committed_after(Some(StatementKey::new(0, 0))), Some(StateId(3)));
	assert_eq!(fx.ledger.first_committed_after(Some(StatementKey::new(0, 1))), None);
}
