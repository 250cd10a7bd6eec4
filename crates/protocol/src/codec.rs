//! JSON-lines framing.
//!
//! Every message occupies exactly one line. Blank lines are ignored.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::{Command, Error, Inbound, Result};

/// Reads inbound messages from a line-oriented stream.
///
/// [`FeedbackReader::next`] is cancellation safe, so it can be polled from `tokio::select!`.
#[derive(Debug)]
pub struct FeedbackReader<R> {
	lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> FeedbackReader<R> {
	/// Wrap a buffered reader.
	pub fn new(input: R) -> Self {
		Self { lines: input.lines() }
	}

	/// Read and decode the next message.
	///
	/// # Errors
	///
	/// - `Error::Eof` when the stream ends.
	/// - `Error::Io` when reading fails.
	/// - `Error::Json` / `Error::Decode` for a malformed line; the reader stays usable.
	pub async fn next(&mut self) -> Result<Inbound> {
		loop {
			let Some(line) = self.lines.next_line().await? else {
				return Err(Error::Eof);
			};
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			tracing::trace!(line, "kernel.recv");
			return Inbound::from_line(line);
		}
	}
}

/// Write one command as a JSON line and flush.
pub async fn write_command(output: &mut (impl AsyncWrite + Unpin), command: &Command) -> Result<()> {
	let mut line = serde_json::to_string(command)?;
	tracing::trace!(line = %line, "kernel.send");
	line.push('\n');
	output.write_all(line.as_bytes()).await?;
	output.flush().await?;
	Ok(())
}
