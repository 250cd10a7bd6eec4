//! Kernel-to-client messages.
//!
//! Messages are JSON arrays led by a tag. Per-state notifications are nested one level deeper:
//! `["Feedback", {"id": ["State", id], "contents": [tag, args...]}]`. Decoding maps both levels onto
//! the closed [`Feedback`] enumeration; tags outside it become [`Inbound::Unknown`] so that newer
//! kernels stay compatible.

use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result, RichText, StateId};

/// Outer message tags understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum FeedbackTag {
	/// Version banner.
	CoqInfo,
	/// Bundle metadata.
	LibInfo,
	/// Bundle load progress.
	LibProgress,
	/// Bundle load completion.
	LibLoaded,
	/// A submitted statement was accepted.
	Added,
	/// A suffix of states was cancelled.
	Cancelled,
	/// Goals for a state.
	GoalInfo,
	/// Free-form kernel log line.
	Log,
	/// Uncaught kernel exception.
	CoqExn,
	/// Kernel failed to decode a command.
	JsonExn,
	/// Per-state feedback wrapper.
	Feedback,
}

/// Tags nested inside a `Feedback` wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
enum StateTag {
	Processed,
	Message,
	ErrorMsg,
	FileLoaded,
	ProcessingIn,
	FileDependency,
}

/// Severity of kernel messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Level {
	/// Debug output.
	Debug,
	/// Informational output.
	Info,
	/// Notices (e.g. results of `Check`).
	Notice,
	/// Warnings.
	Warning,
	/// Errors; the referenced state failed.
	Error,
}

/// Source span of a diagnostic, in byte offsets of the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Location {
	/// Start offset.
	#[serde(rename = "bp")]
	pub start: u32,
	/// End offset.
	#[serde(rename = "ep")]
	pub end: u32,
}

/// A package inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PackageInfo {
	/// Logical path of the package, e.g. `["Coq", "Arith"]`.
	pub pkg_id: Vec<String>,
}

/// Bundle metadata reported by `LibInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct BundleInfo {
	/// Human readable description.
	pub desc: String,
	/// Bundles this one depends on.
	pub deps: Vec<String>,
	/// Packages provided by the bundle.
	pub pkgs: Vec<PackageInfo>,
}

/// Bundle load progress reported by `LibProgress`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LoadProgress {
	/// Bundle being loaded.
	pub bundle: String,
	/// Package currently loading.
	pub pkg: String,
	/// Files loaded so far.
	pub loaded: u32,
	/// Total files in the package.
	pub total: u32,
}

/// A decoded kernel message.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
	/// Version banner (`CoqInfo`).
	Banner(String),
	/// Bundle metadata (`LibInfo`).
	LibraryInfo {
		/// Bundle name.
		bundle: String,
		/// Its metadata.
		info: BundleInfo,
	},
	/// Bundle load progress (`LibProgress`).
	LibraryProgress(LoadProgress),
	/// Bundle finished loading (`LibLoaded`).
	LibraryLoaded(String),
	/// The pending `Add` was accepted as `id` (`Added`).
	Added(StateId),
	/// The state finished processing (`Feedback/Processed`). The first one signals readiness.
	Processed(StateId),
	/// These states were cancelled (`Cancelled`).
	Cancelled(Vec<StateId>),
	/// Goals at a state (`GoalInfo`).
	GoalInfo {
		/// State the goals belong to.
		id: StateId,
		/// Pretty-printed goals.
		goals: RichText,
	},
	/// Diagnostic attached to a state (`Feedback/Message`, `Feedback/ErrorMsg`).
	Message {
		/// State the message refers to; negative when the failing `Add` got no id.
		id: StateId,
		/// Severity.
		level: Level,
		/// Span within the statement, when known.
		location: Option<Location>,
		/// Message body.
		text: RichText,
	},
	/// A library file was loaded on behalf of a state (`Feedback/FileLoaded`).
	FileLoaded {
		/// Requesting state.
		id: StateId,
		/// File path.
		file: String,
		/// Logical module name.
		module: String,
	},
	/// Informational progress on a state (`Feedback/ProcessingIn`, `Feedback/FileDependency`).
	Processing(StateId),
	/// Kernel log line (`Log`).
	Log {
		/// Severity.
		level: Level,
		/// Log text.
		text: String,
	},
	/// Uncaught kernel exception (`CoqExn`, `JsonExn`).
	Fatal(String),
}

/// Result of decoding one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
	/// A message of the closed enumeration.
	Feedback(Feedback),
	/// A well-formed message with a tag this client does not know.
	Unknown(String),
}

impl Inbound {
	/// Decode one JSON line.
	pub fn from_line(line: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(line)?;
		Self::decode(&value)
	}

	/// Decode a parsed wire message.
	pub fn decode(value: &Value) -> Result<Self> {
		let items = value
			.as_array()
			.ok_or_else(|| Error::decode("message", "expected a tagged array"))?;
		let (tag, args) = split_tag("message", items)?;
		let Ok(tag) = FeedbackTag::from_str(tag) else {
			return Ok(Self::Unknown(tag.to_string()));
		};
		let name: &'static str = tag.into();
		let feedback = match tag {
			FeedbackTag::CoqInfo => Feedback::Banner(arg(name, args, 0)?),
			FeedbackTag::LibInfo => Feedback::LibraryInfo {
				bundle: arg(name, args, 0)?,
				info: arg(name, args, 1)?,
			},
			FeedbackTag::LibProgress => Feedback::LibraryProgress(arg(name, args, 0)?),
			FeedbackTag::LibLoaded => Feedback::LibraryLoaded(arg(name, args, 0)?),
			FeedbackTag::Added => Feedback::Added(arg(name, args, 0)?),
			FeedbackTag::Cancelled => Feedback::Cancelled(arg(name, args, 0)?),
			FeedbackTag::GoalInfo => Feedback::GoalInfo {
				id: arg(name, args, 0)?,
				goals: arg(name, args, 1)?,
			},
			FeedbackTag::Log => Feedback::Log {
				level: level(name, args.first())?,
				text: args.get(1).map(plain_text).unwrap_or_default(),
			},
			FeedbackTag::CoqExn | FeedbackTag::JsonExn => Feedback::Fatal(
				args.iter().filter(|arg| !arg.is_null()).map(plain_text).collect::<Vec<_>>().join(" "),
			),
			FeedbackTag::Feedback => return decode_state_feedback(args.first()),
		};
		Ok(Self::Feedback(feedback))
	}
}

fn decode_state_feedback(payload: Option<&Value>) -> Result<Inbound> {
	let payload = payload
		.and_then(Value::as_object)
		.ok_or_else(|| Error::decode("Feedback", "expected an object payload"))?;
	let id = match payload.get("id") {
		Some(Value::Array(route)) => route.get(1).cloned(),
		Some(other) => Some(other.clone()),
		None => None,
	}
	.ok_or_else(|| Error::decode("Feedback", "missing state id"))?;
	let id: StateId = serde_json::from_value(id).map_err(|e| Error::decode("Feedback", e.to_string()))?;

	// Nullary contents may be sent bare: `"contents": "Processed"`.
	let contents: &[Value] = match payload.get("contents") {
		Some(Value::Array(contents)) => contents,
		Some(tag @ Value::String(_)) => std::slice::from_ref(tag),
		_ => return Err(Error::decode("Feedback", "missing contents")),
	};
	let (tag, args) = split_tag("Feedback", contents)?;
	let Ok(tag) = StateTag::from_str(tag) else {
		return Ok(Inbound::Unknown(format!("Feedback.{tag}")));
	};
	let name: &'static str = tag.into();
	let feedback = match tag {
		StateTag::Processed => Feedback::Processed(id),
		StateTag::Message => Feedback::Message {
			id,
			level: level(name, args.first())?,
			location: optional_arg(name, args, 1)?,
			text: arg(name, args, 2)?,
		},
		StateTag::ErrorMsg => Feedback::Message {
			id,
			level: Level::Error,
			location: optional_arg(name, args, 0)?,
			text: arg(name, args, 1)?,
		},
		StateTag::FileLoaded => Feedback::FileLoaded {
			id,
			file: arg(name, args, 0)?,
			module: optional_arg(name, args, 1)?.unwrap_or_default(),
		},
		StateTag::ProcessingIn | StateTag::FileDependency => Feedback::Processing(id),
	};
	Ok(Inbound::Feedback(feedback))
}

fn split_tag<'a>(context: &str, items: &'a [Value]) -> Result<(&'a str, &'a [Value])> {
	match items.split_first() {
		Some((Value::String(tag), args)) => Ok((tag.as_str(), args)),
		_ => Err(Error::decode(context, "missing tag")),
	}
}

fn arg<T: DeserializeOwned>(tag: &str, args: &[Value], index: usize) -> Result<T> {
	let value = args
		.get(index)
		.ok_or_else(|| Error::decode(tag, format!("missing argument {index}")))?;
	T::deserialize(value).map_err(|e| Error::decode(tag, format!("argument {index}: {e}")))
}

fn optional_arg<T: DeserializeOwned>(tag: &str, args: &[Value], index: usize) -> Result<Option<T>> {
	match args.get(index) {
		None | Some(Value::Null) => Ok(None),
		Some(_) => arg(tag, args, index).map(Some),
	}
}

/// Levels arrive either bare (`"Error"`) or wrapped (`["Error"]`).
fn level(tag: &str, value: Option<&Value>) -> Result<Level> {
	let name = match value {
		Some(Value::String(name)) => Some(name.as_str()),
		Some(Value::Array(items)) => items.first().and_then(Value::as_str),
		_ => None,
	}
	.ok_or_else(|| Error::decode(tag, "missing level"))?;
	Level::from_str(name).map_err(|_| Error::decode(tag, format!("unknown level {name}")))
}

fn plain_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => RichText::from_value(other).map(|rich| rich.to_plain()).unwrap_or_else(|_| other.to_string()),
	}
}
