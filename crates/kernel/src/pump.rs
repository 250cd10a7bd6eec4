//! Stdio pump between the command channel and the kernel.

use proofdoc_protocol::codec::{FeedbackReader, write_command};
use proofdoc_protocol::{Command, Inbound};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::KernelEvent;

/// Runs the I/O loop for one kernel connection.
///
/// Commands are written strictly in channel order. Malformed inbound lines are logged and
/// skipped. Returns after emitting [`KernelEvent::Exited`] when the kernel's output ends or either
/// direction fails, or when nobody listens for events anymore.
pub async fn run_pump<R, W>(
	input: R,
	mut output: W,
	mut commands: mpsc::UnboundedReceiver<Command>,
	events: mpsc::UnboundedSender<KernelEvent>,
) where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut reader = FeedbackReader::new(input);

	loop {
		tokio::select! {
			Some(command) = commands.recv() => {
				if let Err(e) = write_command(&mut output, &command).await {
					tracing::error!(command = command.tag(), error = %e, "Kernel write failed; stopping pump");
					break;
				}
			}

			result = reader.next() => {
				match result {
					Ok(inbound) => {
						if let Inbound::Unknown(tag) = &inbound {
							tracing::trace!(tag = %tag, "kernel.recv.unknown");
						}
						if events.send(KernelEvent::Feedback(inbound)).is_err() {
							tracing::debug!("Event receiver dropped; stopping pump");
							return;
						}
					}
					Err(e) if !e.is_fatal() => {
						tracing::warn!(error = %e, "Skipping malformed kernel message");
					}
					Err(e) => {
						tracing::info!(error = %e, "Kernel channel closed");
						break;
					}
				}
			}
		}
	}

	let _ = events.send(KernelEvent::Exited);
}
