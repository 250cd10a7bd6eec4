use serde::{Deserialize, Serialize};

/// Identifier of a kernel state.
///
/// Ids are opaque and only ever produced by the kernel. Negative values never name a state: the
/// kernel reports them when an `Add` fails before an id was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub i64);

impl StateId {
	/// The sentinel reported for failures that happened before assignment.
	pub const SENTINEL: StateId = StateId(-1);

	/// Returns true for the pre-assignment failure sentinel (any negative id).
	pub const fn is_sentinel(self) -> bool {
		self.0 < 0
	}
}

impl std::fmt::Display for StateId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for StateId {
	fn from(value: i64) -> Self {
		Self(value)
	}
}
