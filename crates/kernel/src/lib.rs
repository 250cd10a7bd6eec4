//! Child-process transport for the proof kernel.
//!
//! [`spawn`] starts the kernel with piped stdio and hands back a [`Kernel`] handle plus a stream of
//! [`KernelEvent`]s. Commands posted on [`Kernel::commands`] are written as JSON lines in order;
//! every stdout line is decoded into an [`Inbound`] message. The session layer never sees the
//! process: it talks to a command channel and consumes events on its own task.

use std::process::Stdio;

use proofdoc_protocol::{Command, Inbound};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr};
use tokio::sync::mpsc;

mod config;
mod pump;

pub use config::KernelConfig;
pub use pump::run_pump;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Transport errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The kernel process could not be started.
	#[error("failed to spawn kernel `{command}`: {reason}")]
	Spawn {
		/// Program that was launched.
		command: String,
		/// Why it failed.
		reason: String,
	},
	/// Framing or decoding failure on the kernel channel.
	#[error(transparent)]
	Protocol(#[from] proofdoc_protocol::Error),
	/// Process management failure.
	#[error("{0}")]
	Io(#[from] std::io::Error),
	/// The pump task is gone; commands can no longer be delivered.
	#[error("kernel transport stopped")]
	Stopped,
}

/// Something the kernel said, or its departure.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelEvent {
	/// One decoded stdout line.
	Feedback(Inbound),
	/// Stdout closed or could no longer be read or written.
	Exited,
}

/// Handle to a running kernel process.
#[derive(Debug)]
pub struct Kernel {
	child: Child,
	commands: mpsc::UnboundedSender<Command>,
}

impl Kernel {
	/// Sender feeding the pump; clone it into a command gateway.
	pub fn commands(&self) -> mpsc::UnboundedSender<Command> {
		self.commands.clone()
	}

	/// Queue a command for the kernel.
	///
	/// # Errors
	///
	/// - `Error::Stopped` if the pump has exited.
	pub fn send(&self, command: Command) -> Result<()> {
		self.commands.send(command).map_err(|_| Error::Stopped)
	}

	/// OS process id, if the process has not been reaped.
	pub fn pid(&self) -> Option<u32> {
		self.child.id()
	}

	/// Kill the process and wait for it.
	///
	/// # Errors
	///
	/// - `Error::Io` if the signal could not be delivered.
	pub async fn shutdown(mut self) -> Result<()> {
		tracing::info!(pid = ?self.child.id(), "Stopping kernel");
		self.child.kill().await?;
		Ok(())
	}
}

/// Start the kernel process described by `cfg`.
///
/// Must be called within a tokio runtime: the pump and the stderr forwarder run as spawned tasks.
///
/// # Errors
///
/// - `Error::Spawn` if the program cannot be launched or its stdio cannot be captured.
pub fn spawn(cfg: &KernelConfig) -> Result<(Kernel, mpsc::UnboundedReceiver<KernelEvent>)> {
	tracing::info!(command = %cfg.command, args = ?cfg.args, "Starting kernel");

	let mut cmd = tokio::process::Command::new(&cfg.command);
	cmd.args(&cfg.args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);

	for (key, value) in &cfg.env {
		cmd.env(key, value);
	}

	if let Some(cwd) = &cfg.cwd {
		cmd.current_dir(cwd);
	}

	let spawn_error = |reason: String| Error::Spawn {
		command: cfg.command.clone(),
		reason,
	};

	let mut child = cmd.spawn().map_err(|e| spawn_error(e.to_string()))?;
	let stdin = child.stdin.take().ok_or_else(|| spawn_error("failed to capture stdin".into()))?;
	let stdout = child.stdout.take().ok_or_else(|| spawn_error("failed to capture stdout".into()))?;

	if let Some(stderr) = child.stderr.take() {
		tokio::spawn(forward_stderr(stderr));
	}

	let (command_tx, command_rx) = mpsc::unbounded_channel();
	let (event_tx, event_rx) = mpsc::unbounded_channel();
	tokio::spawn(run_pump(BufReader::new(stdout), stdin, command_rx, event_tx));

	Ok((
		Kernel {
			child,
			commands: command_tx,
		},
		event_rx,
	))
}

async fn forward_stderr(stderr: ChildStderr) {
	let mut lines = BufReader::new(stderr).lines();
	loop {
		match lines.next_line().await {
			Ok(Some(line)) if line.trim().is_empty() => {}
			Ok(Some(line)) => tracing::warn!(line = %line, "kernel.stderr"),
			Ok(None) => break,
			Err(e) => {
				tracing::debug!(error = %e, "Kernel stderr unreadable");
				break;
			}
		}
	}
}
