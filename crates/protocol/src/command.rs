//! Requests sent to the kernel.

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::StateId;

/// Edit id passed with every `Add`; the kernel only supports appending at the tip.
const EDIT_ID: i64 = -1;

/// A request for the kernel.
///
/// Serializes to the wire form `[tag, args...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Parse and add `text` as a new state following `after`.
	Add {
		/// State the new one is appended to.
		after: StateId,
		/// Source text of the statement.
		text: String,
	},
	/// Unwind the kernel to the state before `id`, cancelling `id` and everything after it.
	Cancel(StateId),
	/// Fully evaluate up to `id` (checkpoint).
	Observe(StateId),
	/// Initialize the kernel once the initial packages are loaded.
	Init {
		/// Logical library paths required at startup.
		load_libs: Vec<Vec<String>>,
		/// Logical load paths of every loaded package.
		load_paths: Vec<Vec<String>>,
	},
	/// Load a package bundle.
	LoadPkg {
		/// Directory holding the bundles.
		base_path: String,
		/// Bundle name.
		bundle: String,
	},
	/// Request metadata for a set of bundles.
	InfoPkg {
		/// Directory holding the bundles.
		base_path: String,
		/// Bundle names.
		bundles: Vec<String>,
	},
	/// Request the kernel's version banner.
	GetInfo,
	/// Read-only query for the goals at the current tip.
	Goals,
}

impl Command {
	/// Wire tag of this command.
	pub fn tag(&self) -> &'static str {
		match self {
			Self::Add { .. } => "Add",
			Self::Cancel(_) => "Cancel",
			Self::Observe(_) => "Observe",
			Self::Init { .. } => "Init",
			Self::LoadPkg { .. } => "LoadPkg",
			Self::InfoPkg { .. } => "InfoPkg",
			Self::GetInfo => "GetInfo",
			Self::Goals => "Goals",
		}
	}

	/// Returns true for commands that change the kernel's document state.
	///
	/// At most one of these may be outstanding at a time.
	pub fn is_mutating(&self) -> bool {
		matches!(self, Self::Add { .. } | Self::Cancel(_))
	}
}

impl Serialize for Command {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let len = match self {
			Self::Add { .. } => 4,
			Self::Init { .. } | Self::LoadPkg { .. } | Self::InfoPkg { .. } => 3,
			Self::Cancel(_) | Self::Observe(_) => 2,
			Self::GetInfo | Self::Goals => 1,
		};
		let mut seq = serializer.serialize_seq(Some(len))?;
		seq.serialize_element(self.tag())?;
		match self {
			Self::Add { after, text } => {
				seq.serialize_element(after)?;
				seq.serialize_element(&EDIT_ID)?;
				seq.serialize_element(text)?;
			}
			Self::Cancel(id) | Self::Observe(id) => seq.serialize_element(id)?,
			Self::Init { load_libs, load_paths } => {
				seq.serialize_element(load_libs)?;
				seq.serialize_element(load_paths)?;
			}
			Self::LoadPkg { base_path, bundle } => {
				seq.serialize_element(base_path)?;
				seq.serialize_element(bundle)?;
			}
			Self::InfoPkg { base_path, bundles } => {
				seq.serialize_element(base_path)?;
				seq.serialize_element(bundles)?;
			}
			Self::GetInfo | Self::Goals => {}
		}
		seq.end()
	}
}
