//! Test fixtures shared by unit tests and invariant proofs.

use std::sync::{Arc, Mutex};

use proofdoc_protocol::{BundleInfo, Command, Feedback, Inbound, Level, Location, RichText, StateId};
use tokio::sync::mpsc;

use crate::observer::SessionObserver;
use crate::{BufferContainer, ChannelGateway, Mark, Session, SessionConfig, StatementKey};

/// Everything the observer saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Seen {
	Ready(StateId),
	Goals(Option<String>),
	Message(StateId, Level, String),
	Log(Level, String),
	Banner(String),
	PackageInfo(String),
	PackageLoaded(String),
	PackagesRequested(Vec<String>),
	Dump,
	Fatal(String),
	Enabled(bool),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
	seen: Mutex<Vec<Seen>>,
}

impl RecordingObserver {
	fn push(&self, seen: Seen) {
		self.seen.lock().unwrap().push(seen);
	}

	pub(crate) fn take(&self) -> Vec<Seen> {
		std::mem::take(&mut *self.seen.lock().unwrap())
	}

	/// Goal panel updates, as plain text.
	pub(crate) fn goals(&self) -> Vec<Option<String>> {
		self.seen
			.lock()
			.unwrap()
			.iter()
			.filter_map(|seen| match seen {
				Seen::Goals(goals) => Some(goals.clone()),
				_ => None,
			})
			.collect()
	}
}

impl SessionObserver for RecordingObserver {
	fn on_ready(&self, root: StateId) {
		self.push(Seen::Ready(root));
	}

	fn on_goals(&self, goals: Option<&RichText>) {
		self.push(Seen::Goals(goals.map(RichText::to_plain)));
	}

	fn on_message(&self, id: StateId, level: Level, _location: Option<Location>, markup: &str) {
		self.push(Seen::Message(id, level, markup.to_owned()));
	}

	fn on_log(&self, level: Level, text: &str) {
		self.push(Seen::Log(level, text.to_owned()));
	}

	fn on_banner(&self, text: &str) {
		self.push(Seen::Banner(text.to_owned()));
	}

	fn on_package_info(&self, bundle: &str, _info: &BundleInfo) {
		self.push(Seen::PackageInfo(bundle.to_owned()));
	}

	fn on_package_loaded(&self, bundle: &str) {
		self.push(Seen::PackageLoaded(bundle.to_owned()));
	}

	fn on_packages_requested(&self, bundles: &[String]) {
		self.push(Seen::PackagesRequested(bundles.to_vec()));
	}

	fn on_dump_requested(&self) {
		self.push(Seen::Dump);
	}

	fn on_fatal(&self, message: &str) {
		self.push(Seen::Fatal(message.to_owned()));
	}

	fn on_enabled(&self, enabled: bool) {
		self.push(Seen::Enabled(enabled));
	}
}

/// Drain every command posted so far.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<Command>) -> Vec<Command> {
	std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

pub(crate) fn add(after: i64, text: &str) -> Command {
	Command::Add {
		after: StateId(after),
		text: text.to_owned(),
	}
}

/// A session over in-memory buffers with a recording observer.
pub(crate) struct Harness {
	pub(crate) session: Session<BufferContainer>,
	pub(crate) commands: mpsc::UnboundedReceiver<Command>,
	pub(crate) observer: Arc<RecordingObserver>,
}

impl Harness {
	/// A session that already reached readiness at state 1, with the outbox drained.
	pub(crate) fn ready(parts: &[&str]) -> Self {
		let mut harness = Self::with_config(SessionConfig::default(), parts);
		harness.session.start();
		harness.feed(Feedback::Processed(StateId(1)));
		harness.drain();
		harness.observer.take();
		harness
	}

	/// A session that has not been started.
	pub(crate) fn with_config(config: SessionConfig, parts: &[&str]) -> Self {
		let (gateway, commands) = ChannelGateway::channel();
		let observer = Arc::new(RecordingObserver::default());
		let containers = parts
			.iter()
			.enumerate()
			.map(|(i, text)| BufferContainer::new(format!("part{i}.v"), *text))
			.collect();
		let session = Session::new(config, containers, Box::new(gateway), observer.clone());
		Self {
			session,
			commands,
			observer,
		}
	}

	pub(crate) fn feed(&mut self, feedback: Feedback) {
		self.session.handle_inbound(Inbound::Feedback(feedback));
	}

	pub(crate) fn drain(&mut self) -> Vec<Command> {
		drain(&mut self.commands)
	}

	pub(crate) fn added(&mut self, id: i64) {
		self.feed(Feedback::Added(StateId(id)));
	}

	pub(crate) fn cancelled(&mut self, ids: &[i64]) {
		self.feed(Feedback::Cancelled(ids.iter().copied().map(StateId).collect()));
	}

	pub(crate) fn error(&mut self, id: i64, text: &str) {
		self.feed(Feedback::Message {
			id: StateId(id),
			level: Level::Error,
			location: None,
			text: RichText::text(text),
		});
	}

	pub(crate) fn mark(&self, container: usize, index: usize) -> Mark {
		self.session.containers().mark_of(StatementKey::new(container, index))
	}

	pub(crate) fn committed_ids(&self) -> Vec<i64> {
		self.session
			.ledger()
			.committed()
			.iter()
			.filter_map(|stmt| stmt.session_id.map(|id| id.0))
			.collect()
	}

	pub(crate) fn committed_texts(&self) -> Vec<String> {
		self.session.ledger().committed().iter().map(|stmt| stmt.text.clone()).collect()
	}

	/// Put the point at a byte offset of a container.
	pub(crate) fn point(&mut self, container: usize, offset: usize) {
		let id = crate::ContainerId(container);
		self.session.containers_mut().focus_container(id);
		if let Some(buffer) = self.session.containers_mut().get_mut(id) {
			buffer.set_cursor(offset);
		}
	}
}
