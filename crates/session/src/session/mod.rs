//! The session controller.
//!
//! Owns the ledger, the document and the collaborators, and exposes the editor-facing operations.
//! Navigation lives in [`navigation`], kernel feedback handling in [`router`].

/// Borrow the ledger's collaborators from disjoint fields of a session.
macro_rules! ports {
	($session:expr) => {
		&mut $crate::ledger::Ports {
			gateway: &mut *$session.gateway,
			containers: &mut $session.containers,
			observer: &*$session.observer,
		}
	};
}

mod navigation;
mod router;

pub use navigation::{Advance, Retreat, SyncOutcome};
pub use router::Phase;

use proofdoc_protocol::RichText;

use crate::aggregate::ContainerAggregate;
use crate::config::SessionConfig;
use crate::container::StatementContainer;
use crate::gateway::CommandGateway;
use crate::ledger::Ledger;
use crate::observer::SharedObserver;
use crate::packages::PackageLoader;
use crate::{Mark, Result, StatementKey};

/// A comment or intercepted directive accepted without a kernel round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accepted {
	/// Ledger tail when it was accepted; `None` at the document start.
	anchor: Option<StatementKey>,
	key: StatementKey,
}

/// One document synchronized with one kernel.
pub struct Session<C> {
	config: SessionConfig,
	phase: Phase,
	enabled: bool,
	ledger: Ledger,
	containers: ContainerAggregate<C>,
	gateway: Box<dyn CommandGateway>,
	observer: SharedObserver,
	packages: PackageLoader,
	seeking: bool,
	accepted: Vec<Accepted>,
}

impl<C> std::fmt::Debug for Session<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("phase", &self.phase)
			.field("enabled", &self.enabled)
			.field("ledger", &self.ledger)
			.field("seeking", &self.seeking)
			.finish_non_exhaustive()
	}
}

impl<C: StatementContainer> Session<C> {
	/// Create a session over `containers`. Nothing is sent until [`Session::start`].
	pub fn new(config: SessionConfig, containers: Vec<C>, gateway: Box<dyn CommandGateway>, observer: SharedObserver) -> Self {
		let ledger = Ledger::new(config.root_state, config.checkpoint_interval);
		let packages = PackageLoader::new(&config);
		Self {
			config,
			phase: Phase::AwaitingReady,
			enabled: false,
			ledger,
			containers: ContainerAggregate::new(containers),
			gateway,
			observer,
			packages,
			seeking: false,
			accepted: Vec::new(),
		}
	}

	/// Ask the kernel for its banner and bundle metadata; loading proceeds from the replies.
	pub fn start(&mut self) {
		tracing::info!(containers = self.containers.len(), "Starting session");
		self.packages.start(&mut *self.gateway);
	}

	/// Configuration in effect.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Lifecycle phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Returns true once the kernel reported readiness.
	pub fn is_ready(&self) -> bool {
		self.phase == Phase::Ready
	}

	/// Returns true when the front-end should accept edits and navigation.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Returns true while navigating towards the cursor.
	pub fn is_seeking(&self) -> bool {
		self.seeking
	}

	/// The submission ledger.
	pub fn ledger(&self) -> &Ledger {
		&self.ledger
	}

	/// The document.
	pub fn containers(&self) -> &ContainerAggregate<C> {
		&self.containers
	}

	/// The document, for cursor and focus updates from the editor.
	pub fn containers_mut(&mut self) -> &mut ContainerAggregate<C> {
		&mut self.containers
	}

	/// Bundle loading state.
	pub fn packages(&self) -> &PackageLoader {
		&self.packages
	}

	/// The user edited `key`.
	///
	/// Editing the failed statement only clears its error. Editing anything else retracts back to
	/// the cursor.
	pub fn invalidate(&mut self, key: StatementKey) -> Result<SyncOutcome> {
		if self.ledger.last_error() == Some(key) {
			self.ledger.clear_error(ports!(self));
			return Ok(SyncOutcome::ErrorCleared);
		}
		self.ledger.clear_error(ports!(self));
		self.sync_to_cursor()
	}

	/// Cached goals for a committed statement.
	pub fn goals_at(&self, key: StatementKey) -> Option<&RichText> {
		let Some(id) = self.ledger.session_id_of(key) else {
			tracing::error!(statement = %key, "Goals requested for a statement the kernel never added");
			return None;
		};
		self.ledger.goals(id)
	}

	/// Drop all progress and cancel the kernel back to its root state.
	///
	/// Returns false before the kernel is ready or while a submission or cancellation is
	/// outstanding.
	pub fn reset(&mut self) -> bool {
		if self.phase != Phase::Ready {
			return false;
		}
		if !self.ledger.is_quiescent() {
			tracing::debug!(in_flight = ?self.ledger.in_flight(), "Reset refused while busy");
			return false;
		}
		tracing::info!(committed = self.ledger.committed().len(), "Resetting session");
		self.ledger.reset(ports!(self));
		for accepted in self.accepted.drain(..) {
			self.containers.mark(accepted.key, Mark::Clear);
		}
		self.seeking = false;
		true
	}

	fn set_enabled(&mut self, enabled: bool) {
		if self.enabled != enabled {
			self.enabled = enabled;
			self.observer.on_enabled(enabled);
		}
	}

	/// Record a locally accepted statement, anchored to the current ledger tail.
	fn remember_accepted(&mut self, key: StatementKey) {
		self.containers.mark(key, Mark::Ok);
		self.accepted.push(Accepted {
			anchor: self.ledger.tail_key(),
			key,
		});
	}

	/// Forget accepted statements whose anchor left the ledger.
	fn forget_accepted(&mut self, dropped: &[StatementKey]) {
		if dropped.is_empty() {
			return;
		}
		let containers = &mut self.containers;
		self.accepted.retain(|accepted| {
			let keep = accepted.anchor.is_none_or(|anchor| !dropped.contains(&anchor));
			if !keep {
				containers.mark(accepted.key, Mark::Clear);
			}
			keep
		});
	}
}
