//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::{ContainerId, StatementKey};

/// Invariant violations surfaced by navigation.
///
/// Kernel-reported failures are not errors at this level; they live in the ledger as marks and
/// `last_error`. These variants mean the embedding editor handed over a state the session cannot
/// order or address.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
	/// A statement references a container the aggregate does not hold.
	#[error("statement owner {0} is not part of the document")]
	UnknownContainer(ContainerId),
	/// The statement at the point is marked but has no kernel id.
	#[error("statement {0} at point is not registered with the kernel")]
	UnregisteredPoint(StatementKey),
	/// The document has no containers, so there is no point to compare against.
	#[error("document has no containers")]
	NoContainers,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A value is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}
