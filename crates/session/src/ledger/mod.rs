//! Submission ledger.
//!
//! Tracks statements from submission to retraction:
//!
//! ```text
//! enqueue ──► pending ──Added(id)──► committed ──Cancelled(id)──► (gone)
//!                │                        │
//!                └──error(-1)──► marked   └──error(id)──► retracted + marked
//! ```
//!
//! At most one mutating command (`Add` or `Cancel`) is outstanding at any time; statements enqueued
//! meanwhile wait in `pending` and are issued one by one as acknowledgements arrive. A `Cancel`
//! needed while another mutation is outstanding is held back and issued once that one is
//! acknowledged.

use std::collections::{HashMap, VecDeque};

use proofdoc_protocol::{Command, RichText, StateId};

use crate::aggregate::ContainerAggregate;
use crate::container::StatementContainer;
use crate::gateway::CommandGateway;
use crate::observer::SessionObserver;
use crate::{Mark, Statement, StatementKey};

/// Borrowed collaborators for one ledger transition.
pub(crate) struct Ports<'a, C> {
	pub(crate) gateway: &'a mut dyn CommandGateway,
	pub(crate) containers: &'a mut ContainerAggregate<C>,
	pub(crate) observer: &'a dyn SessionObserver,
}

/// The mutating command awaiting acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
	/// `Add` for the head of `pending`.
	Add,
	/// `Cancel` of this id.
	Cancel(StateId),
}

/// Result of an `Added` acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddAck {
	/// No `Add` was outstanding; the acknowledgement was dropped.
	Unexpected,
	/// The statement was committed and the next pending one issued.
	Continued,
	/// The `Add` belonged to a statement dropped by a failure; the held-back `Cancel` was issued.
	Abandoned,
	/// The statement was committed and nothing is pending anymore.
	Drained {
		/// Kernel id of the committed statement.
		id: StateId,
		/// Its key.
		key: StatementKey,
	},
}

/// A kernel-reported failure applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Failure {
	/// Statement now marked as error.
	pub(crate) failed: StatementKey,
	/// Other statements that lost their place: retracted successors and discarded pending ones.
	pub(crate) dropped: Vec<StatementKey>,
}

/// Pending and committed statements, keyed by kernel id.
#[derive(Debug)]
pub struct Ledger {
	root: StateId,
	committed: Vec<Statement>,
	pending: VecDeque<Statement>,
	by_id: HashMap<StateId, StatementKey>,
	goals_by_id: HashMap<StateId, RichText>,
	submission_count: u64,
	checkpoint_interval: u32,
	last_checkpoint: Option<StateId>,
	last_error: Option<StatementKey>,
	in_flight: Option<InFlight>,
	deferred_cancel: Option<StateId>,
}

impl Ledger {
	/// Create an empty ledger anchored at `root`.
	pub fn new(root: StateId, checkpoint_interval: u32) -> Self {
		Self {
			root,
			committed: Vec::new(),
			pending: VecDeque::new(),
			by_id: HashMap::new(),
			goals_by_id: HashMap::new(),
			submission_count: 0,
			checkpoint_interval,
			last_checkpoint: None,
			last_error: None,
			in_flight: None,
			deferred_cancel: None,
		}
	}

	/// Baseline state every first `Add` is appended to.
	pub fn root(&self) -> StateId {
		self.root
	}

	pub(crate) fn set_root(&mut self, root: StateId) {
		self.root = root;
	}

	/// Statements the kernel accepted, in document order.
	pub fn committed(&self) -> &[Statement] {
		&self.committed
	}

	/// Statements submitted or queued but not yet acknowledged.
	pub fn pending(&self) -> impl ExactSizeIterator<Item = &Statement> {
		self.pending.iter()
	}

	/// The outstanding mutation, if any.
	pub fn in_flight(&self) -> Option<InFlight> {
		self.in_flight
	}

	/// Returns true when nothing is pending and no mutation is outstanding.
	pub fn is_quiescent(&self) -> bool {
		self.pending.is_empty() && self.in_flight.is_none()
	}

	/// Returns true while a `Cancel` is outstanding or held back.
	///
	/// The ledger tail is stale until the kernel confirms, so nothing may be chosen after it.
	pub fn is_cancelling(&self) -> bool {
		matches!(self.in_flight, Some(InFlight::Cancel(_))) || self.deferred_cancel.is_some()
	}

	/// Successful adds since the session started.
	pub fn submission_count(&self) -> u64 {
		self.submission_count
	}

	/// The statement currently marked as failed.
	pub fn last_error(&self) -> Option<StatementKey> {
		self.last_error
	}

	/// Cached goals for a state.
	pub fn goals(&self, id: StateId) -> Option<&RichText> {
		self.goals_by_id.get(&id)
	}

	/// Committed statement by kernel id.
	pub fn statement(&self, id: StateId) -> Option<&Statement> {
		let key = self.by_id.get(&id)?;
		self.committed.iter().find(|stmt| stmt.key == *key)
	}

	/// Kernel id of a committed statement.
	pub fn session_id_of(&self, key: StatementKey) -> Option<StateId> {
		self.committed.iter().find(|stmt| stmt.key == key).and_then(|stmt| stmt.session_id)
	}

	/// Key of the last statement handed to the ledger, pending or committed.
	pub fn tail_key(&self) -> Option<StatementKey> {
		self.pending.back().or(self.committed.last()).map(|stmt| stmt.key)
	}

	/// Kernel id new statements are appended to.
	pub fn tail_id(&self) -> StateId {
		self.committed.last().and_then(|stmt| stmt.session_id).unwrap_or(self.root)
	}

	/// Id of the first committed statement following `anchor`, or the first one overall.
	pub(crate) fn first_committed_after(&self, anchor: Option<StatementKey>) -> Option<StateId> {
		let next = match anchor {
			None => self.committed.first(),
			Some(key) => {
				let pos = self.committed.iter().position(|stmt| stmt.key == key)?;
				self.committed.get(pos + 1)
			}
		};
		next.and_then(|stmt| stmt.session_id)
	}

	/// Queue a statement; issue it at once if the ledger is idle.
	pub(crate) fn enqueue<C: StatementContainer>(&mut self, stmt: Statement, ports: &mut Ports<'_, C>) {
		let idle = self.is_quiescent();
		tracing::trace!(statement = %stmt.key, idle, "ledger.enqueue");
		self.pending.push_back(stmt);
		if idle {
			self.issue_add(ports);
		}
	}

	fn issue_add<C>(&mut self, ports: &mut Ports<'_, C>) {
		let Some(head) = self.pending.front() else {
			return;
		};
		let after = self.tail_id();
		tracing::debug!(statement = %head.key, after = %after, "Submitting");
		ports.gateway.send(Command::Add {
			after,
			text: head.text.clone(),
		});
		self.in_flight = Some(InFlight::Add);
	}

	/// Commit the head of `pending` under `id`.
	pub(crate) fn acknowledge_add<C>(&mut self, id: StateId, ports: &mut Ports<'_, C>) -> AddAck {
		if self.in_flight != Some(InFlight::Add) {
			tracing::warn!(id = %id, in_flight = ?self.in_flight, "Added without an outstanding Add");
			return AddAck::Unexpected;
		}
		if self.deferred_cancel.is_some() {
			tracing::debug!(id = %id, "Add acknowledged for a dropped statement");
			self.in_flight = None;
			self.issue_deferred_cancel(ports);
			return AddAck::Abandoned;
		}
		let Some(mut stmt) = self.pending.pop_front() else {
			tracing::warn!(id = %id, "Added without a pending statement");
			self.in_flight = None;
			return AddAck::Unexpected;
		};

		let key = stmt.key;
		stmt.session_id = Some(id);
		self.by_id.insert(id, key);
		self.committed.push(stmt);
		self.in_flight = None;
		self.submission_count += 1;
		tracing::debug!(id = %id, statement = %key, count = self.submission_count, "Committed");

		if self.checkpoint_interval != 0 && self.submission_count % u64::from(self.checkpoint_interval) == 0 {
			self.checkpoint(id, ports);
		}

		if self.pending.is_empty() {
			AddAck::Drained { id, key }
		} else {
			self.issue_add(ports);
			AddAck::Continued
		}
	}

	/// Ask the kernel to fully evaluate up to `id`, once per id.
	pub(crate) fn checkpoint<C>(&mut self, id: StateId, ports: &mut Ports<'_, C>) {
		if self.last_checkpoint == Some(id) {
			return;
		}
		tracing::debug!(id = %id, "Checkpoint");
		ports.gateway.send(Command::Observe(id));
		self.last_checkpoint = Some(id);
	}

	/// Send `Cancel(id)`; the cancelled statements leave the ledger when the kernel confirms.
	pub(crate) fn request_cancel<C>(&mut self, id: StateId, ports: &mut Ports<'_, C>) {
		tracing::debug!(id = %id, "Requesting cancel");
		self.goals_by_id.remove(&id);
		ports.gateway.send(Command::Cancel(id));
		self.in_flight = Some(InFlight::Cancel(id));
	}

	fn issue_deferred_cancel<C>(&mut self, ports: &mut Ports<'_, C>) {
		if let Some(id) = self.deferred_cancel.take() {
			tracing::debug!(id = %id, "Issuing held-back cancel");
			ports.gateway.send(Command::Cancel(id));
			self.in_flight = Some(InFlight::Cancel(id));
		}
	}

	/// Remove cancelled states and clear their marks. Unknown ids are ignored.
	///
	/// Returns the keys that left the ledger.
	pub(crate) fn retract<C: StatementContainer>(&mut self, ids: &[StateId], ports: &mut Ports<'_, C>) -> Vec<StatementKey> {
		if matches!(self.in_flight, Some(InFlight::Cancel(_))) {
			self.in_flight = None;
		}
		if self.deferred_cancel.is_some_and(|held| ids.contains(&held)) {
			self.deferred_cancel = None;
		}

		let removed = self.remove_states(ids, ports);

		if self.in_flight.is_none() {
			self.issue_deferred_cancel(ports);
		}
		if self.in_flight.is_none() && !self.pending.is_empty() {
			self.issue_add(ports);
		}

		removed
	}

	/// Drop registered states locally, clearing their marks and refreshing the tail's goals.
	fn remove_states<C: StatementContainer>(&mut self, ids: &[StateId], ports: &mut Ports<'_, C>) -> Vec<StatementKey> {
		let mut removed = Vec::new();
		for id in ids {
			let Some(key) = self.by_id.remove(id) else {
				tracing::debug!(id = %id, "Cancelled state not registered");
				continue;
			};
			self.goals_by_id.remove(id);
			if let Some(pos) = self.committed.iter().position(|stmt| stmt.key == key) {
				self.committed.remove(pos);
			}
			if self.last_checkpoint == Some(*id) {
				self.last_checkpoint = None;
			}
			ports.containers.mark(key, Mark::Clear);
			removed.push(key);
		}

		if !removed.is_empty() {
			tracing::debug!(count = removed.len(), "Retracted");
			let tail_goals = self.committed.last().and_then(|stmt| stmt.session_id).and_then(|id| self.goals_by_id.get(&id));
			ports.observer.on_goals(tail_goals);
		}
		removed
	}

	/// Cache goals for a state, showing them when nothing is pending.
	pub(crate) fn record_goals<C>(&mut self, id: StateId, goals: RichText, ports: &mut Ports<'_, C>) -> bool {
		if !self.by_id.contains_key(&id) {
			tracing::debug!(id = %id, "Goals for unregistered state dropped");
			return false;
		}
		if self.pending.is_empty() {
			ports.observer.on_goals(Some(&goals));
		}
		self.goals_by_id.insert(id, goals);
		true
	}

	/// Apply a kernel-reported failure.
	///
	/// A sentinel id blames the head of `pending`. A registered id retracts that statement and its
	/// successors locally and sends `Cancel` so the kernel follows, holding it back while another
	/// mutation is outstanding. Either way the remaining queue is abandoned.
	pub(crate) fn fail<C: StatementContainer>(&mut self, id: StateId, ports: &mut Ports<'_, C>) -> Option<Failure> {
		let failed = if id.is_sentinel() {
			let Some(head) = self.pending.pop_front() else {
				if self.in_flight == Some(InFlight::Add) && self.deferred_cancel.is_some() {
					tracing::debug!("Add rejected for a dropped statement");
					self.in_flight = None;
					self.issue_deferred_cancel(ports);
				} else {
					tracing::warn!(id = %id, "Failure with nothing pending");
				}
				return None;
			};
			if self.in_flight == Some(InFlight::Add) {
				self.in_flight = None;
			}
			head.key
		} else {
			let Some(&key) = self.by_id.get(&id) else {
				tracing::warn!(id = %id, "Failure for unregistered state");
				return None;
			};
			key
		};

		let mut dropped: Vec<StatementKey> = self
			.pending
			.drain(..)
			.map(|stmt| {
				ports.containers.mark(stmt.key, Mark::Clear);
				stmt.key
			})
			.collect();

		if !id.is_sentinel() {
			let pos = self.committed.iter().position(|stmt| stmt.key == failed).unwrap_or(self.committed.len());
			let suffix: Vec<StateId> = self.committed[pos..].iter().filter_map(|stmt| stmt.session_id).collect();
			let retracted = self.remove_states(&suffix, ports);
			dropped.extend(retracted.into_iter().filter(|key| *key != failed));
			if self.in_flight.is_some() {
				tracing::debug!(id = %id, in_flight = ?self.in_flight, "Holding back cancel");
				self.deferred_cancel = Some(id);
			} else {
				ports.gateway.send(Command::Cancel(id));
				self.in_flight = Some(InFlight::Cancel(id));
			}
		}

		self.clear_error(ports);
		ports.containers.mark(failed, Mark::Error);
		self.last_error = Some(failed);
		tracing::debug!(statement = %failed, dropped = dropped.len(), "Statement failed");
		Some(Failure { failed, dropped })
	}

	/// Clear the error mark, if any.
	pub(crate) fn clear_error<C: StatementContainer>(&mut self, ports: &mut Ports<'_, C>) {
		if let Some(key) = self.last_error.take() {
			ports.containers.mark(key, Mark::Clear);
		}
	}

	/// Drop everything, asking the kernel to cancel back to the root.
	///
	/// Only valid while [`Ledger::is_quiescent`].
	///
	/// Returns the keys whose marks were cleared.
	pub(crate) fn reset<C: StatementContainer>(&mut self, ports: &mut Ports<'_, C>) -> Vec<StatementKey> {
		let first = self.committed.first().and_then(|stmt| stmt.session_id);
		let mut cleared: Vec<StatementKey> = self.committed.drain(..).chain(self.pending.drain(..)).map(|stmt| stmt.key).collect();
		cleared.extend(self.last_error.take());
		for key in &cleared {
			ports.containers.mark(*key, Mark::Clear);
		}

		self.by_id.clear();
		self.goals_by_id.clear();
		self.last_checkpoint = None;
		self.in_flight = None;
		if let Some(first) = first {
			ports.gateway.send(Command::Cancel(first));
			self.in_flight = Some(InFlight::Cancel(first));
		}
		ports.observer.on_goals(None);
		cleared
	}
}

#[cfg(test)]
mod tests;
