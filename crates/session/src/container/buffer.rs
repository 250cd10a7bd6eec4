//! In-memory container over a text buffer.

use std::ops::Range;

use super::StatementContainer;
use crate::{Mark, Sentence, StatementKind};

/// A container backed by a plain string.
///
/// Sentences end at a `.` followed by whitespace or end of input, outside string literals and
/// (nested) `(* *)` comments. A comment standing on its own becomes a comment sentence. Trailing
/// text without a terminator is not a sentence yet.
#[derive(Debug, Clone)]
pub struct BufferContainer {
	name: String,
	text: String,
	spans: Vec<(Range<usize>, StatementKind)>,
	marks: Vec<Mark>,
	cursor: usize,
	focused: bool,
}

impl BufferContainer {
	/// Create a container from its display name and content.
	pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
		let text = text.into();
		let spans = split_sentences(&text);
		let marks = vec![Mark::Clear; spans.len()];
		Self {
			name: name.into(),
			text,
			spans,
			marks,
			cursor: 0,
			focused: false,
		}
	}

	/// Display name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Full content.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Number of sentences.
	pub fn len(&self) -> usize {
		self.spans.len()
	}

	/// Returns true if the buffer holds no sentence.
	pub fn is_empty(&self) -> bool {
		self.spans.is_empty()
	}

	/// Byte range of a sentence.
	pub fn span(&self, index: usize) -> Option<Range<usize>> {
		self.spans.get(index).map(|(range, _)| range.clone())
	}

	/// Text of a sentence.
	pub fn sentence_text(&self, index: usize) -> Option<&str> {
		self.spans.get(index).map(|(range, _)| &self.text[range.clone()])
	}

	/// All marks, by sentence index.
	pub fn marks(&self) -> &[Mark] {
		&self.marks
	}

	/// Cursor byte offset.
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// Move the cursor, clamped to the buffer.
	pub fn set_cursor(&mut self, offset: usize) {
		self.cursor = offset.min(self.text.len());
	}

	/// Returns true once [`StatementContainer::focus`] was called.
	pub fn is_focused(&self) -> bool {
		self.focused
	}

	/// Index of the sentence whose span contains `offset` (end inclusive).
	pub fn sentence_at(&self, offset: usize) -> Option<usize> {
		self.spans.iter().position(|(range, _)| range.start <= offset && offset <= range.end)
	}

	fn sentence(&self, index: usize) -> Option<Sentence> {
		let (range, kind) = self.spans.get(index)?;
		Some(Sentence {
			index,
			text: self.text[range.clone()].to_owned(),
			kind: *kind,
		})
	}
}

impl StatementContainer for BufferContainer {
	fn get_next(&self, prev: Option<usize>) -> Option<Sentence> {
		self.sentence(prev.map_or(0, |p| p + 1))
	}

	fn mark(&mut self, index: usize, mark: Mark) {
		match self.marks.get_mut(index) {
			Some(slot) => *slot = mark,
			None => tracing::debug!(container = %self.name, index, "Mark on missing sentence ignored"),
		}
	}

	fn mark_of(&self, index: usize) -> Mark {
		self.marks.get(index).copied().unwrap_or_default()
	}

	fn get_at_point(&self) -> Option<Sentence> {
		let index = self.sentence_at(self.cursor)?;
		if self.marks[index] == Mark::Clear {
			return None;
		}
		self.sentence(index)
	}

	fn cursor_to_start(&mut self, index: usize) {
		if let Some((range, _)) = self.spans.get(index) {
			self.cursor = range.start;
		}
	}

	fn cursor_to_end(&mut self, index: usize) {
		if let Some((range, _)) = self.spans.get(index) {
			self.cursor = range.end;
		}
	}

	fn focus(&mut self) {
		self.focused = true;
	}
}

/// Split source text into sentence spans.
pub fn split_sentences(text: &str) -> Vec<(Range<usize>, StatementKind)> {
	let bytes = text.as_bytes();
	let mut spans = Vec::new();
	let mut pos = 0;

	loop {
		while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
			pos += 1;
		}
		if pos >= bytes.len() {
			break;
		}

		let start = pos;
		if bytes[start..].starts_with(b"(*") {
			pos = skip_comment(bytes, start);
			spans.push((start..pos, StatementKind::Comment));
			continue;
		}

		let mut i = start;
		let mut end = None;
		while i < bytes.len() {
			match bytes[i] {
				b'(' if bytes.get(i + 1) == Some(&b'*') => i = skip_comment(bytes, i),
				b'"' => i = skip_string(bytes, i),
				b'.' if bytes.get(i + 1).is_none_or(u8::is_ascii_whitespace) => {
					end = Some(i + 1);
					break;
				}
				_ => i += 1,
			}
		}

		let Some(end) = end else { break };
		spans.push((start..end, StatementKind::Normal));
		pos = end;
	}

	spans
}

/// Index just past the comment opening at `start`, or the end of input if unterminated.
fn skip_comment(bytes: &[u8], start: usize) -> usize {
	let mut depth = 0usize;
	let mut i = start;
	while i < bytes.len() {
		if bytes[i..].starts_with(b"(*") {
			depth += 1;
			i += 2;
		} else if bytes[i..].starts_with(b"*)") {
			depth -= 1;
			i += 2;
			if depth == 0 {
				return i;
			}
		} else if bytes[i] == b'"' {
			i = skip_string(bytes, i);
		} else {
			i += 1;
		}
	}
	bytes.len()
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
	bytes[start + 1..]
		.iter()
		.position(|&b| b == b'"')
		.map_or(bytes.len(), |offset| start + offset + 2)
}
