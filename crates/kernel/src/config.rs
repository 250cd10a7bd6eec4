//! Kernel launch configuration.

use std::collections::HashMap;
use std::path::PathBuf;

/// How to start the kernel process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
	/// Program to run.
	pub command: String,
	/// Arguments passed to the program.
	pub args: Vec<String>,
	/// Extra environment variables.
	pub env: HashMap<String, String>,
	/// Working directory; inherited when unset.
	pub cwd: Option<PathBuf>,
}

impl KernelConfig {
	/// Run `command` without arguments in the current directory.
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			args: Vec::new(),
			env: HashMap::new(),
			cwd: None,
		}
	}

	/// Replace the argument list.
	pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	/// Set one environment variable.
	pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.env.insert(key.into(), value.into());
		self
	}

	/// Run in `dir`.
	pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
		self.cwd = Some(dir.into());
		self
	}
}
