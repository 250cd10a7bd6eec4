//! Statement containers.
//!
//! A container is one editable region of the document. It owns the text, splits it into sentences
//! and renders marks; the session only ever addresses its sentences by index.

mod buffer;

pub use buffer::{BufferContainer, split_sentences};

use crate::{Mark, Sentence};

/// An editable region that yields sentences in order and renders their marks.
pub trait StatementContainer {
	/// The sentence following `prev`, or the first sentence when `prev` is `None`.
	fn get_next(&self, prev: Option<usize>) -> Option<Sentence>;

	/// Set the visual mark of a sentence.
	fn mark(&mut self, index: usize, mark: Mark);

	/// Current mark of a sentence.
	fn mark_of(&self, index: usize) -> Mark;

	/// The marked sentence under the cursor, if any.
	fn get_at_point(&self) -> Option<Sentence>;

	/// Move the cursor to the start of a sentence.
	fn cursor_to_start(&mut self, index: usize);

	/// Move the cursor to the end of a sentence.
	fn cursor_to_end(&mut self, index: usize);

	/// Give this container editor focus.
	fn focus(&mut self);
}

impl<C: StatementContainer + ?Sized> StatementContainer for Box<C> {
	fn get_next(&self, prev: Option<usize>) -> Option<Sentence> {
		(**self).get_next(prev)
	}

	fn mark(&mut self, index: usize, mark: Mark) {
		(**self).mark(index, mark)
	}

	fn mark_of(&self, index: usize) -> Mark {
		(**self).mark_of(index)
	}

	fn get_at_point(&self) -> Option<Sentence> {
		(**self).get_at_point()
	}

	fn cursor_to_start(&mut self, index: usize) {
		(**self).cursor_to_start(index)
	}

	fn cursor_to_end(&mut self, index: usize) {
		(**self).cursor_to_end(index)
	}

	fn focus(&mut self) {
		(**self).focus()
	}
}
