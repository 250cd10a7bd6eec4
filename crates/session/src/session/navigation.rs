//! Cursor-driven navigation.

use proofdoc_protocol::StateId;

use super::Session;
use crate::container::StatementContainer;
use crate::directive::Directive;
use crate::{Mark, Result, StatementKey};

/// Outcome of [`Session::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
	/// The statement was queued for the kernel.
	Submitted(StatementKey),
	/// A comment was accepted locally.
	Comment(StatementKey),
	/// A directive was handled locally.
	Directive(StatementKey, Directive),
	/// Nothing follows the current tail.
	EndOfInput,
	/// Interaction is disabled: the kernel is not ready or bundles are loading.
	Disabled,
	/// A cancellation is outstanding; the tail is not settled yet.
	Busy,
}

/// Outcome of [`Session::retreat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
	/// `Cancel` was sent for this state.
	Requested(StateId),
	/// A submission or cancellation is outstanding, or interaction is disabled.
	Busy,
	/// Only the baseline remains.
	AtBaseline,
}

/// Outcome of [`Session::sync_to_cursor`] and [`Session::invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
	/// The point lies in processed territory; `Cancel` was sent for this state.
	Retracting(StateId),
	/// Statements are being submitted until the point is reached.
	Seeking,
	/// The point was already reached.
	Reached,
	/// The document ended before the point.
	EndOfInput,
	/// The error mark was cleared; nothing else changed.
	ErrorCleared,
	/// A submission or cancellation is outstanding, or interaction is disabled.
	Busy,
}

impl<C: StatementContainer> Session<C> {
	/// Take the next statement after the tail.
	///
	/// Comments and recognized directives are accepted on the spot. Anything else is marked as
	/// processing and queued. With `move_focus` the owning container receives focus.
	pub fn advance(&mut self, move_focus: bool) -> Advance {
		if !self.enabled {
			return Advance::Disabled;
		}
		if self.ledger.is_cancelling() {
			tracing::debug!(in_flight = ?self.ledger.in_flight(), "Advance refused while cancelling");
			return Advance::Busy;
		}
		let Some(next) = self.containers.get_next(self.navigation_tail()) else {
			tracing::debug!("End of document");
			return Advance::EndOfInput;
		};
		let key = next.key;

		if next.is_comment() {
			self.remember_accepted(key);
			return Advance::Comment(key);
		}

		if move_focus {
			self.containers.focus_container(next.owner());
		}

		match Directive::scan(&next.text) {
			Some(directive) if directive.is_intercepted() => {
				self.apply_directive(&directive);
				self.remember_accepted(key);
				return Advance::Directive(key, directive);
			}
			Some(Directive::Unknown { command, .. }) => {
				tracing::warn!(statement = %key, command = %command, "Unrecognized directive submitted as is");
			}
			_ => {}
		}

		if self.ledger.last_error() == Some(key) {
			self.ledger.clear_error(ports!(self));
		}
		self.containers.mark(key, Mark::Processing);
		self.ledger.enqueue(next, ports!(self));
		Advance::Submitted(key)
	}

	/// Retract the last committed statement.
	///
	/// Unless `in_place`, the cursor moves to the start of the retracted statement.
	pub fn retreat(&mut self, in_place: bool) -> Retreat {
		if !self.enabled || !self.ledger.is_quiescent() {
			tracing::debug!(in_flight = ?self.ledger.in_flight(), "Retreat refused while busy");
			return Retreat::Busy;
		}
		let Some((key, id)) = self.ledger.committed().last().and_then(|stmt| stmt.session_id.map(|id| (stmt.key, id))) else {
			return Retreat::AtBaseline;
		};

		self.ledger.clear_error(ports!(self));
		if !in_place {
			self.containers.cursor_to_start(key);
		}
		self.ledger.request_cancel(id, ports!(self));
		Retreat::Requested(id)
	}

	/// Bring the kernel to the cursor.
	///
	/// A point inside processed territory retracts from the statement under it; otherwise
	/// statements are submitted until the point is reached or the document ends.
	///
	/// # Errors
	///
	/// - `SessionError::UnregisteredPoint` if the statement under the point is marked but unknown.
	/// - `SessionError::UnknownContainer` if a statement's owner is not in the document.
	pub fn sync_to_cursor(&mut self) -> Result<SyncOutcome> {
		if !self.enabled || !self.ledger.is_quiescent() {
			tracing::debug!(in_flight = ?self.ledger.in_flight(), "Sync refused while busy");
			return Ok(SyncOutcome::Busy);
		}

		let Some(at_point) = self.containers.get_at_point() else {
			self.seeking = true;
			return self.seek();
		};

		if self.ledger.last_error() == Some(at_point.key) {
			return Ok(SyncOutcome::Reached);
		}
		if let Some(id) = self.ledger.session_id_of(at_point.key) {
			return Ok(self.retract_from(id));
		}
		if let Some(anchor) = self.accepted.iter().find(|a| a.key == at_point.key).map(|a| a.anchor) {
			return Ok(match self.ledger.first_committed_after(anchor) {
				Some(id) => self.retract_from(id),
				None => SyncOutcome::Reached,
			});
		}

		tracing::error!(statement = %at_point.key, "Statement at point is marked but not registered");
		Err(crate::SessionError::UnregisteredPoint(at_point.key))
	}

	fn retract_from(&mut self, id: StateId) -> SyncOutcome {
		self.ledger.clear_error(ports!(self));
		self.ledger.request_cancel(id, ports!(self));
		SyncOutcome::Retracting(id)
	}

	/// Submit until one statement is in flight, the point is reached, or the document ends.
	pub(super) fn seek(&mut self) -> Result<SyncOutcome> {
		loop {
			let key = match self.advance(false) {
				Advance::Submitted(_) => return Ok(SyncOutcome::Seeking),
				Advance::EndOfInput => {
					self.seeking = false;
					return Ok(SyncOutcome::EndOfInput);
				}
				Advance::Disabled | Advance::Busy => {
					self.seeking = false;
					return Ok(SyncOutcome::Busy);
				}
				Advance::Comment(key) | Advance::Directive(key, _) => key,
			};
			if self.point_reached(key)? {
				self.seeking = false;
				return Ok(SyncOutcome::Reached);
			}
		}
	}

	/// Whether seeking can stop after `key` was processed.
	pub(super) fn point_reached(&mut self, key: StatementKey) -> Result<bool> {
		if self.containers.get_at_point().is_some() {
			return Ok(true);
		}
		self.containers.after_point(&key).inspect_err(|_| self.seeking = false)
	}

	/// Key navigation continues after: the ledger tail, or the last statement accepted after it.
	fn navigation_tail(&self) -> Option<StatementKey> {
		let tail = self.ledger.tail_key();
		self.accepted.iter().rev().find(|a| a.anchor == tail).map(|a| a.key).or(tail)
	}

	fn apply_directive(&mut self, directive: &Directive) {
		match directive {
			Directive::Packages(bundles) => {
				tracing::info!(?bundles, "Loading requested bundles");
				self.observer.on_packages_requested(bundles);
				self.packages.request(bundles, &mut *self.gateway);
				if self.packages.is_waiting() {
					self.set_enabled(false);
				}
			}
			Directive::Dump => {
				tracing::info!("Dump requested");
				self.observer.on_dump_requested();
			}
			Directive::Unknown { .. } => {}
		}
	}
}
