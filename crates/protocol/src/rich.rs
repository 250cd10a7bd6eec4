//! Rich-text payloads.

use serde::de::{Deserialize, Deserializer, Error as _};
use serde_json::Value;

use crate::{Error, Result};

/// Recursive rich text as emitted by the kernel's pretty printer.
///
/// Wire forms: `["Element", [tag, attrs, [children...]]]`, `["PCData", text]`, or a bare string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichText {
	/// A tagged node wrapping child nodes.
	Element {
		/// Element name, used as the style class when rendered.
		tag: String,
		/// Attribute pairs.
		attrs: Vec<(String, String)>,
		/// Child nodes in order.
		children: Vec<RichText>,
	},
	/// A text leaf.
	Text(String),
}

impl Default for RichText {
	fn default() -> Self {
		Self::Text(String::new())
	}
}

impl RichText {
	/// Create a text leaf.
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	/// Decode from the wire representation.
	pub fn from_value(value: &Value) -> Result<Self> {
		match value {
			Value::String(text) => Ok(Self::Text(text.clone())),
			Value::Array(items) => {
				let tag = items
					.first()
					.and_then(Value::as_str)
					.ok_or_else(|| Error::decode("RichText", "missing node tag"))?;
				let content = items.get(1).ok_or_else(|| Error::decode(tag, "missing node content"))?;
				match tag {
					"PCData" => content
						.as_str()
						.map(Self::text)
						.ok_or_else(|| Error::decode(tag, "text leaf is not a string")),
					"Element" => Self::element_from_value(content),
					other => Err(Error::decode(other, "unknown rich text node")),
				}
			}
			_ => Err(Error::decode("RichText", "expected a string or a tagged node")),
		}
	}

	fn element_from_value(content: &Value) -> Result<Self> {
		let parts = content
			.as_array()
			.ok_or_else(|| Error::decode("Element", "content is not an array"))?;
		let tag = parts
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| Error::decode("Element", "missing element name"))?;
		let attrs = parts.get(1).map(attrs_from_value).unwrap_or_default();
		let children = match parts.get(2) {
			Some(Value::Array(children)) => children.iter().map(Self::from_value).collect::<Result<Vec<_>>>()?,
			Some(_) => return Err(Error::decode("Element", "children are not an array")),
			None => Vec::new(),
		};
		Ok(Self::Element {
			tag: tag.to_string(),
			attrs,
			children,
		})
	}

	/// Concatenation of all text leaves.
	pub fn to_plain(&self) -> String {
		let mut out = String::new();
		self.write_plain(&mut out);
		out
	}

	/// Display form wrapping every element in `<span class="tag">`.
	pub fn to_markup(&self) -> String {
		let mut out = String::new();
		self.write_markup(&mut out);
		out
	}

	fn write_plain(&self, out: &mut String) {
		match self {
			Self::Text(text) => out.push_str(text),
			Self::Element { children, .. } => children.iter().for_each(|child| child.write_plain(out)),
		}
	}

	fn write_markup(&self, out: &mut String) {
		match self {
			Self::Text(text) => escape_into(text, out),
			Self::Element { tag, children, .. } => {
				out.push_str("<span class=\"");
				escape_into(tag, out);
				out.push_str("\">");
				children.iter().for_each(|child| child.write_markup(out));
				out.push_str("</span>");
			}
		}
	}
}

impl<'de> Deserialize<'de> for RichText {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		Self::from_value(&value).map_err(D::Error::custom)
	}
}

/// Attributes arrive as `[[name, value], ...]`; anything else carries no usable attributes.
fn attrs_from_value(value: &Value) -> Vec<(String, String)> {
	let Some(pairs) = value.as_array() else {
		return Vec::new();
	};
	pairs
		.iter()
		.filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
			Some([Value::String(name), Value::String(value)]) => Some((name.clone(), value.clone())),
			_ => None,
		})
		.collect()
}

fn escape_into(text: &str, out: &mut String) {
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(ch),
		}
	}
}
