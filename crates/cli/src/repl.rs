//! Interactive command loop.
//!
//! Kernel events and stdin lines are multiplexed on one task, so the session is only ever touched
//! from here.

use std::fmt::Write as _;

use proofdoc_kernel::KernelEvent;
use proofdoc_session::{Advance, BufferContainer, ContainerId, Mark, Retreat, Session, SyncOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// A parsed REPL line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
	/// Submit the next statement.
	Next,
	/// Retract the last committed statement.
	Prev,
	/// Move the point and bring the kernel to it.
	Goto { container: usize, offset: usize },
	/// Move the point only.
	Point { container: usize, offset: usize },
	/// Drop all state back to the baseline.
	Reset,
	/// Print the ledger and marks.
	Status,
	/// Leave.
	Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("unknown command `{0}` (try: next, prev, goto, point, reset, status, quit)")]
	Unknown(String),
	#[error("`{0}` expects <container> <offset>")]
	Position(&'static str),
}

impl ReplCommand {
	/// Parse one input line; blank lines yield `None`.
	pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
		let mut words = line.split_whitespace();
		let Some(word) = words.next() else {
			return Ok(None);
		};
		let command = match word {
			"next" | "n" => Self::Next,
			"prev" | "p" => Self::Prev,
			"goto" | "g" => {
				let (container, offset) = position(words, "goto")?;
				Self::Goto { container, offset }
			}
			"point" => {
				let (container, offset) = position(words, "point")?;
				Self::Point { container, offset }
			}
			"reset" => Self::Reset,
			"status" | "s" => Self::Status,
			"quit" | "q" | "exit" => Self::Quit,
			other => return Err(ParseError::Unknown(other.to_string())),
		};
		Ok(Some(command))
	}
}

fn position<'a>(mut words: impl Iterator<Item = &'a str>, name: &'static str) -> Result<(usize, usize), ParseError> {
	let mut number = || words.next().and_then(|w| w.parse().ok()).ok_or(ParseError::Position(name));
	let container = number()?;
	let offset = number()?;
	Ok((container, offset))
}

/// Whether the loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Quit,
}

/// Apply one command and describe the result.
pub fn execute(session: &mut Session<BufferContainer>, command: ReplCommand) -> (Flow, String) {
	let reply = match command {
		ReplCommand::Next => match session.advance(true) {
			Advance::Submitted(key) => format!("submitted {key}"),
			Advance::Comment(key) => format!("skipped comment {key}"),
			Advance::Directive(key, directive) => format!("handled directive {key}: {directive:?}"),
			Advance::EndOfInput => "end of document".to_string(),
			Advance::Disabled => "editing disabled".to_string(),
			Advance::Busy => "busy: waiting for the kernel".to_string(),
		},
		ReplCommand::Prev => match session.retreat(false) {
			Retreat::Requested(id) => format!("retracting state {id}"),
			Retreat::Busy => "busy: waiting for the kernel".to_string(),
			Retreat::AtBaseline => "nothing to retract".to_string(),
		},
		ReplCommand::Goto { container, offset } => match move_point(session, container, offset) {
			Err(reply) => reply,
			Ok(()) => match session.sync_to_cursor() {
				Ok(outcome) => describe_sync(outcome),
				Err(e) => format!("error: {e}"),
			},
		},
		ReplCommand::Point { container, offset } => match move_point(session, container, offset) {
			Err(reply) => reply,
			Ok(()) => format!("point at {container}:{offset}"),
		},
		ReplCommand::Reset => {
			if session.reset() {
				"reset to baseline".to_string()
			} else {
				"reset refused: kernel not ready or busy".to_string()
			}
		}
		ReplCommand::Status => status_report(session),
		ReplCommand::Quit => return (Flow::Quit, "bye".to_string()),
	};
	(Flow::Continue, reply)
}

fn move_point(session: &mut Session<BufferContainer>, container: usize, offset: usize) -> Result<(), String> {
	let id = ContainerId(container);
	let containers = session.containers_mut();
	let Some(buffer) = containers.get_mut(id) else {
		return Err(format!("no container {container}"));
	};
	buffer.set_cursor(offset);
	containers.focus_container(id);
	Ok(())
}

fn describe_sync(outcome: SyncOutcome) -> String {
	match outcome {
		SyncOutcome::Retracting(id) => format!("retracting from state {id}"),
		SyncOutcome::Seeking => "seeking".to_string(),
		SyncOutcome::Reached => "at point".to_string(),
		SyncOutcome::EndOfInput => "end of document".to_string(),
		SyncOutcome::ErrorCleared => "error cleared".to_string(),
		SyncOutcome::Busy => "busy: waiting for the kernel".to_string(),
	}
}

fn mark_char(mark: Mark) -> char {
	match mark {
		Mark::Clear => '.',
		Mark::Processing => '~',
		Mark::Ok => '#',
		Mark::Error => '!',
	}
}

/// Multi-line summary of the session state.
pub fn status_report(session: &Session<BufferContainer>) -> String {
	let ledger = session.ledger();
	let mut out = String::new();
	let _ = writeln!(
		out,
		"phase: {:?}, {}",
		session.phase(),
		if session.is_enabled() { "enabled" } else { "disabled" }
	);
	let _ = writeln!(
		out,
		"committed: {} (tip {}), pending: {}, in flight: {:?}",
		ledger.committed().len(),
		ledger.tail_id(),
		ledger.pending().len(),
		ledger.in_flight()
	);
	if let Some(key) = ledger.last_error() {
		let _ = writeln!(out, "error at {key}");
	}
	for (i, buffer) in session.containers().iter().enumerate() {
		let marks: String = buffer.marks().iter().copied().map(mark_char).collect();
		let focus = if buffer.is_focused() { "*" } else { " " };
		let _ = writeln!(out, "{focus}{i} {} [{marks}] cursor {}", buffer.name(), buffer.cursor());
	}
	out.pop();
	out
}

/// Run until `quit`, end of stdin, or kernel exit.
///
/// # Errors
///
/// Fails only if stdin cannot be read.
pub async fn run(session: &mut Session<BufferContainer>, mut events: mpsc::UnboundedReceiver<KernelEvent>) -> anyhow::Result<()> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	loop {
		tokio::select! {
			line = lines.next_line() => {
				let Some(line) = line? else {
					tracing::debug!("stdin closed");
					break;
				};
				match ReplCommand::parse(&line) {
					Ok(None) => {}
					Ok(Some(command)) => {
						let (flow, reply) = execute(session, command);
						println!("{reply}");
						if flow == Flow::Quit {
							break;
						}
					}
					Err(e) => eprintln!("{e}"),
				}
			}

			event = events.recv() => match event {
				Some(KernelEvent::Feedback(inbound)) => session.handle_inbound(inbound),
				Some(KernelEvent::Exited) | None => {
					tracing::warn!("Kernel exited");
					println!("kernel exited");
					break;
				}
			},
		}
	}

	Ok(())
}
