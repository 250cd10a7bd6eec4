//! Wire protocol spoken with the proof kernel.
//!
//! The kernel accepts [`Command`]s and answers out of band with feedback messages. Both directions
//! travel as JSON arrays whose first element is a tag string, one message per line (see [`codec`]).
//!
//! * [`StateId`]: kernel-assigned identifiers of accepted states.
//! * [`Command`]: requests sent to the kernel, mutating (`Add`, `Cancel`) or not.
//! * [`Inbound`]: a decoded kernel message, either a known [`Feedback`] or an unknown tag.
//! * [`RichText`]: the recursive rich-text payload carried by goals and diagnostics.
#![warn(missing_docs)]
use std::io;

pub mod codec;
mod command;
mod feedback;
mod id;
mod rich;

pub use command::Command;
pub use feedback::{BundleInfo, Feedback, FeedbackTag, Inbound, Level, LoadProgress, Location, PackageInfo};
pub use id::StateId;
pub use rich::RichText;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// Input/output errors from the underlying channel.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// A line was not valid JSON.
	#[error("invalid json: {0}")]
	Json(#[from] serde_json::Error),
	/// A message carried a known tag but an unexpected shape.
	#[error("malformed {tag} message: {reason}")]
	Decode {
		/// Tag of the offending message.
		tag: String,
		/// What was wrong with it.
		reason: String,
	},
	/// The underlying channel reached EOF (end of file).
	#[error("the kernel channel reached EOF")]
	Eof,
}

impl Error {
	/// Returns true when the channel itself is unusable.
	///
	/// Decoding failures only affect a single message; readers may skip it and continue.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Io(_) | Self::Eof)
	}

	pub(crate) fn decode(tag: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::Decode {
			tag: tag.into(),
			reason: reason.into(),
		}
	}
}
