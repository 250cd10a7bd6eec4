//! Outbound command path.

use proofdoc_protocol::Command;
use tokio::sync::mpsc;

/// Sink for kernel commands.
///
/// Sending never fails from the session's point of view: a gateway that loses its kernel reports
/// it through its own channel (the transport emits an exit event) and drops the command.
pub trait CommandGateway {
	/// Post a command to the kernel.
	fn send(&mut self, command: Command);
}

/// Gateway over an unbounded channel drained by the kernel transport.
#[derive(Debug, Clone)]
pub struct ChannelGateway {
	tx: mpsc::UnboundedSender<Command>,
}

impl ChannelGateway {
	/// Wrap an existing sender.
	pub fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
		Self { tx }
	}

	/// Create a gateway and the receiving end of its channel.
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self::new(tx), rx)
	}
}

impl CommandGateway for ChannelGateway {
	fn send(&mut self, command: Command) {
		tracing::debug!(command = command.tag(), "Posting");
		if self.tx.send(command).is_err() {
			tracing::error!("Kernel command channel closed; command dropped");
		}
	}
}
