//! Line-oriented rendering of session notifications.

use std::io::{self, Write};
use std::sync::Mutex;

use proofdoc_protocol::{BundleInfo, Level, LoadProgress, Location, RichText, StateId};
use proofdoc_session::SessionObserver;

/// Prints everything the session reports, one line per notification.
#[derive(Debug)]
pub struct ConsoleObserver<W = io::Stdout> {
	out: Mutex<W>,
	min_level: Level,
}

impl ConsoleObserver {
	/// Print to stdout, hiding log lines below `min_level`.
	pub fn stdout(min_level: Level) -> Self {
		Self::new(io::stdout(), min_level)
	}
}

impl<W: Write + Send> ConsoleObserver<W> {
	/// Print to `out`, hiding log lines below `min_level`.
	pub fn new(out: W, min_level: Level) -> Self {
		Self {
			out: Mutex::new(out),
			min_level,
		}
	}

	#[cfg(test)]
	pub fn into_inner(self) -> W {
		self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn line(&self, args: std::fmt::Arguments<'_>) {
		let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		if let Err(e) = writeln!(out, "{args}").and_then(|()| out.flush()) {
			tracing::debug!(error = %e, "Console write failed");
		}
	}
}

impl<W: Write + Send> SessionObserver for ConsoleObserver<W> {
	fn on_ready(&self, root: StateId) {
		self.line(format_args!("ready (root state {root})"));
	}

	fn on_goals(&self, goals: Option<&RichText>) {
		match goals {
			Some(goals) => {
				let text = goals.to_plain();
				self.line(format_args!("goals:"));
				for row in text.lines() {
					self.line(format_args!("  {row}"));
				}
			}
			None => self.line(format_args!("goals: none")),
		}
	}

	fn on_message(&self, id: StateId, level: Level, location: Option<Location>, markup: &str) {
		match location {
			Some(loc) => self.line(format_args!("[{level}] state {id} @{}..{}: {markup}", loc.start, loc.end)),
			None => self.line(format_args!("[{level}] state {id}: {markup}")),
		}
	}

	fn on_log(&self, level: Level, text: &str) {
		if level >= self.min_level {
			self.line(format_args!("[{level}] {text}"));
		}
	}

	fn on_banner(&self, text: &str) {
		self.line(format_args!("{text}"));
	}

	fn on_package_info(&self, bundle: &str, info: &BundleInfo) {
		self.line(format_args!("bundle {bundle}: {} ({} packages)", info.desc, info.pkgs.len()));
	}

	fn on_package_progress(&self, progress: &LoadProgress) {
		self.line(format_args!(
			"loading {} {}: {}/{}",
			progress.bundle, progress.pkg, progress.loaded, progress.total
		));
	}

	fn on_package_loaded(&self, bundle: &str) {
		self.line(format_args!("bundle {bundle} loaded"));
	}

	fn on_packages_requested(&self, bundles: &[String]) {
		self.line(format_args!("requesting bundles: {}", bundles.join(", ")));
	}

	fn on_dump_requested(&self) {
		self.line(format_args!("dump requested (not supported in the console)"));
	}

	fn on_fatal(&self, message: &str) {
		self.line(format_args!("kernel fatal error: {message}"));
	}

	fn on_enabled(&self, enabled: bool) {
		self.line(format_args!("{}", if enabled { "editing enabled" } else { "editing disabled" }));
	}
}
