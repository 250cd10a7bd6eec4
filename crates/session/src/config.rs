//! Session configuration.
//!
//! Written in TOML, every key optional:
//!
//! ```toml
//! prelude = true
//! base-path = "./"
//! package-dir = "../coq-pkgs/"
//! init-pkgs = ["init"]
//! all-pkgs = ["init", "math-comp"]
//! checkpoint-interval = 48
//! root-state = 1
//! ```

use std::path::Path;

use proofdoc_protocol::StateId;
use serde::Deserialize;

use crate::error::ConfigError;

/// Checkpoint interval used when none is configured.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 48;

/// Options for a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfig {
	/// Load `Coq.Init.Prelude` on init. The kernel's root state is never retracted.
	pub prelude: bool,
	/// Base path of the installation, as seen by the kernel.
	pub base_path: String,
	/// Bundle directory, relative to `base_path`.
	pub package_dir: String,
	/// Bundles loaded before the kernel is initialized.
	pub init_pkgs: Vec<String>,
	/// Bundles whose metadata is requested at startup.
	pub all_pkgs: Vec<String>,
	/// Number of successful adds between periodic checkpoints.
	///
	/// Each add without a checkpoint deepens the kernel's undo stack; the right value depends on
	/// the kernel build.
	pub checkpoint_interval: u32,
	/// Baseline state assumed until the kernel reports readiness.
	pub root_state: StateId,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			prelude: true,
			base_path: "./".into(),
			package_dir: "../coq-pkgs/".into(),
			init_pkgs: vec!["init".into()],
			all_pkgs: [
				"init",
				"math-comp",
				"coq-base",
				"coq-arith",
				"coq-reals",
				"coquelicot",
				"flocq",
				"sf",
				"cpdt",
				"color",
			]
			.into_iter()
			.map(String::from)
			.collect(),
			checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
			root_state: StateId(1),
		}
	}
}

impl SessionConfig {
	/// Parse and validate a TOML document.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Check value ranges.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.checkpoint_interval == 0 {
			return Err(ConfigError::Invalid("checkpoint-interval must be at least 1".into()));
		}
		if self.root_state.is_sentinel() {
			return Err(ConfigError::Invalid(format!("root-state {} is not a valid state id", self.root_state)));
		}
		Ok(())
	}

	/// Bundle directory sent with `InfoPkg` and `LoadPkg`.
	pub fn package_path(&self) -> String {
		format!("{}{}", self.base_path, self.package_dir)
	}

	/// Libraries required by `Init`.
	pub fn load_libs(&self) -> Vec<Vec<String>> {
		if self.prelude {
			vec![vec!["Coq".into(), "Init".into(), "Prelude".into()]]
		} else {
			Vec::new()
		}
	}
}
