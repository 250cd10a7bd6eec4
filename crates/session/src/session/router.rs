//! Kernel feedback dispatch.

use proofdoc_protocol::{BundleInfo, Command, Feedback, Inbound, Level, Location, RichText, StateId};

use super::{Session, SyncOutcome};
use crate::container::StatementContainer;
use crate::ledger::AddAck;
use crate::{Mark, StatementKey};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
	/// Bundles are loading; the first `Processed` marks readiness.
	#[default]
	AwaitingReady,
	/// The kernel accepts statements.
	Ready,
}

impl<C: StatementContainer> Session<C> {
	/// Apply one decoded kernel message.
	pub fn handle_inbound(&mut self, inbound: Inbound) {
		match inbound {
			Inbound::Feedback(feedback) => self.handle_feedback(feedback),
			Inbound::Unknown(tag) => tracing::warn!(tag = %tag, "Feedback type not handled"),
		}
	}

	/// Apply one kernel message.
	pub fn handle_feedback(&mut self, feedback: Feedback) {
		match feedback {
			Feedback::Banner(text) => self.on_banner(&text),
			Feedback::LibraryInfo { bundle, info } => self.on_library_info(&bundle, info),
			Feedback::LibraryProgress(progress) => self.observer.on_package_progress(&progress),
			Feedback::LibraryLoaded(bundle) => self.on_library_loaded(&bundle),
			Feedback::Added(id) => self.on_added(id),
			Feedback::Processed(id) => match self.phase {
				Phase::AwaitingReady => self.on_ready(id),
				Phase::Ready => self.on_processed(id),
			},
			Feedback::Cancelled(ids) => self.on_cancelled(&ids),
			Feedback::GoalInfo { id, goals } => self.on_goal_info(id, goals),
			Feedback::Message {
				id,
				level,
				location,
				text,
			} => self.on_message(id, level, location, &text),
			Feedback::FileLoaded { id, file, module } => {
				tracing::debug!(id = %id, file = %file, module = %module, "File loaded");
				self.observer.on_log(Level::Info, &format!("`{file}` loading."));
			}
			Feedback::Processing(id) => tracing::trace!(id = %id, "Processing"),
			Feedback::Log { level, text } => self.observer.on_log(level, &text),
			Feedback::Fatal(message) => {
				tracing::error!(message = %message, "Kernel exception");
				self.observer.on_fatal(&message);
			}
		}
	}

	fn on_banner(&mut self, text: &str) {
		tracing::info!(banner = text, "Kernel info");
		self.observer.on_banner(text);
	}

	fn on_library_info(&mut self, bundle: &str, info: BundleInfo) {
		self.observer.on_package_info(bundle, &info);
		self.packages.on_info(bundle, info, &mut *self.gateway);
	}

	fn on_library_loaded(&mut self, bundle: &str) {
		tracing::info!(bundle, "Bundle loaded");
		self.observer.on_package_loaded(bundle);
		let outcome = self.packages.on_loaded(bundle, &mut *self.gateway);
		if outcome.requests_settled && self.phase == Phase::Ready {
			self.set_enabled(true);
		}
	}

	fn on_ready(&mut self, root: StateId) {
		tracing::info!(root = %root, "Kernel ready");
		self.phase = Phase::Ready;
		self.ledger.set_root(root);
		self.observer.on_ready(root);
		if !self.packages.is_waiting() {
			self.set_enabled(true);
		}
	}

	fn on_processed(&mut self, id: StateId) {
		let Some(key) = self.ledger.statement(id).map(|stmt| stmt.key) else {
			tracing::debug!(id = %id, "Processed state not registered");
			return;
		};
		self.containers.mark(key, Mark::Ok);
		self.gateway.send(Command::Goals);
	}

	fn on_added(&mut self, id: StateId) {
		if let AddAck::Drained { id, key } = self.ledger.acknowledge_add(id, ports!(self)) {
			self.resolve_drained(id, key);
		}
	}

	/// The queue emptied after committing `key`: checkpoint, or keep seeking towards the point.
	fn resolve_drained(&mut self, id: StateId, key: StatementKey) {
		if !self.seeking {
			self.ledger.checkpoint(id, ports!(self));
			return;
		}

		let reached = match self.point_reached(key) {
			Ok(true) => true,
			Ok(false) => match self.seek() {
				Ok(SyncOutcome::Seeking) => false,
				Ok(_) => true,
				Err(err) => {
					tracing::error!(error = %err, "Seek aborted");
					true
				}
			},
			Err(err) => {
				tracing::error!(error = %err, "Seek aborted");
				true
			}
		};

		if reached {
			self.seeking = false;
			self.ledger.checkpoint(id, ports!(self));
		}
	}

	fn on_cancelled(&mut self, ids: &[StateId]) {
		let dropped = self.ledger.retract(ids, ports!(self));
		self.forget_accepted(&dropped);
	}

	fn on_goal_info(&mut self, id: StateId, goals: RichText) {
		self.ledger.record_goals(id, goals, ports!(self));
	}

	fn on_message(&mut self, id: StateId, level: Level, location: Option<Location>, text: &RichText) {
		let markup = text.to_markup();
		tracing::debug!(id = %id, %level, "Kernel message");
		self.observer.on_message(id, level, location, &markup);
		if level == Level::Error {
			self.on_failure(id);
		}
	}

	fn on_failure(&mut self, id: StateId) {
		self.seeking = false;
		let Some(failure) = self.ledger.fail(id, ports!(self)) else {
			return;
		};
		let mut dropped = failure.dropped;
		dropped.push(failure.failed);
		self.forget_accepted(&dropped);
	}
}
