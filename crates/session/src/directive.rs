//! In-document directives.
//!
//! A directive is a `Comments "command: args".` statement. Recognized directives are handled
//! locally and never reach the kernel.

use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"Comments "(.*): (.+)"\."#).expect("directive pattern is valid"));

/// A directive found in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
	/// `pkgs: a b c`, load bundles.
	Packages(Vec<String>),
	/// `dump: ...`, export the document state.
	Dump,
	/// Any other command; the statement is submitted as usual.
	Unknown {
		/// The command name.
		command: String,
		/// Its raw arguments.
		args: String,
	},
}

impl Directive {
	/// Recognize a directive in statement text.
	pub fn scan(text: &str) -> Option<Self> {
		let caps = DIRECTIVE.captures(text)?;
		let command = &caps[1];
		let args = &caps[2];
		Some(match command {
			"pkgs" => Self::Packages(args.split_whitespace().map(String::from).collect()),
			"dump" => Self::Dump,
			_ => Self::Unknown {
				command: command.to_owned(),
				args: args.to_owned(),
			},
		})
	}

	/// Returns true if the session handles the directive itself.
	pub fn is_intercepted(&self) -> bool {
		!matches!(self, Self::Unknown { .. })
	}
}
