//! Session notifications for presentation layers.

use std::sync::Arc;

use proofdoc_protocol::{BundleInfo, Level, LoadProgress, Location, RichText, StateId};

/// Receives everything the session wants shown to the user.
///
/// All methods default to no-ops; implement only what the front-end displays.
pub trait SessionObserver: Send + Sync {
	/// The kernel finished initialization; interaction is possible from `root`.
	fn on_ready(&self, _root: StateId) {}

	/// Goal display changed. `None` clears the panel.
	fn on_goals(&self, _goals: Option<&RichText>) {}

	/// A kernel message attached to a state, already rendered to markup.
	fn on_message(&self, _id: StateId, _level: Level, _location: Option<Location>, _markup: &str) {}

	/// A log line for the message panel.
	fn on_log(&self, _level: Level, _text: &str) {}

	/// Kernel version banner.
	fn on_banner(&self, _text: &str) {}

	/// Metadata for a bundle arrived.
	fn on_package_info(&self, _bundle: &str, _info: &BundleInfo) {}

	/// Progress while loading a bundle.
	fn on_package_progress(&self, _progress: &LoadProgress) {}

	/// A bundle finished loading.
	fn on_package_loaded(&self, _bundle: &str) {}

	/// The document asked for additional bundles.
	fn on_packages_requested(&self, _bundles: &[String]) {}

	/// The document asked for a state dump.
	fn on_dump_requested(&self) {}

	/// The kernel hit an unrecoverable error.
	fn on_fatal(&self, _message: &str) {}

	/// Editing was enabled or disabled.
	fn on_enabled(&self, _enabled: bool) {}
}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn SessionObserver>;

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl SessionObserver for NoOpObserver {}
