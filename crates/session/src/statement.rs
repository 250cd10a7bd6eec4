//! Statements and their identities.

use proofdoc_protocol::StateId;

/// Position of a container in the document's navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(pub usize);

impl std::fmt::Display for ContainerId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "container#{}", self.0)
	}
}

/// Stable identity of a statement: its owning container and its index there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementKey {
	/// Owning container.
	pub container: ContainerId,
	/// Index within the container.
	pub index: usize,
}

impl StatementKey {
	/// Create a key.
	pub const fn new(container: usize, index: usize) -> Self {
		Self {
			container: ContainerId(container),
			index,
		}
	}
}

impl std::fmt::Display for StatementKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.container.0, self.index)
	}
}

/// Whether a statement is sent to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
	/// Submitted to the kernel.
	#[default]
	Normal,
	/// Accepted locally, never submitted.
	Comment,
}

/// Presentation state of a statement, mirrored by its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
	/// No mark.
	#[default]
	Clear,
	/// Submitted, waiting for the kernel.
	Processing,
	/// Accepted.
	Ok,
	/// Rejected.
	Error,
}

/// A unit of input as yielded by a single container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
	/// Index within the yielding container.
	pub index: usize,
	/// Source text.
	pub text: String,
	/// Comment or normal.
	pub kind: StatementKind,
}

impl Sentence {
	/// Create a normal sentence.
	pub fn new(index: usize, text: impl Into<String>) -> Self {
		Self {
			index,
			text: text.into(),
			kind: StatementKind::Normal,
		}
	}

	/// Create a comment sentence.
	pub fn comment(index: usize, text: impl Into<String>) -> Self {
		Self {
			index,
			text: text.into(),
			kind: StatementKind::Comment,
		}
	}
}

/// A statement tracked by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
	/// Identity, including the owning container.
	pub key: StatementKey,
	/// Source text.
	pub text: String,
	/// Comment or normal.
	pub kind: StatementKind,
	/// Kernel state id, present once the kernel acknowledged the add.
	pub session_id: Option<StateId>,
}

impl Statement {
	/// Stamp a container's sentence with its owner.
	pub fn from_sentence(container: ContainerId, sentence: Sentence) -> Self {
		Self {
			key: StatementKey {
				container,
				index: sentence.index,
			},
			text: sentence.text,
			kind: sentence.kind,
			session_id: None,
		}
	}

	/// The container that produced this statement.
	pub fn owner(&self) -> ContainerId {
		self.key.container
	}

	/// Returns true for statements that never reach the kernel.
	pub fn is_comment(&self) -> bool {
		self.kind == StatementKind::Comment
	}
}
