//! Multi-container document.
//!
//! Containers are navigated in the order they were given; the first is focused until told
//! otherwise. Cross-container successor lookup is a pure function over the container list so it can
//! be checked without a session.

use crate::container::StatementContainer;
use crate::{ContainerId, Mark, Result, SessionError, Statement, StatementKey};

/// The ordered set of containers making up one document.
#[derive(Debug)]
pub struct ContainerAggregate<C> {
	containers: Vec<C>,
	focus: Option<ContainerId>,
}

impl<C: StatementContainer> ContainerAggregate<C> {
	/// Compose containers in navigation order.
	pub fn new(containers: Vec<C>) -> Self {
		let focus = (!containers.is_empty()).then_some(ContainerId(0));
		Self { containers, focus }
	}

	/// Number of containers.
	pub fn len(&self) -> usize {
		self.containers.len()
	}

	/// Returns true if the document has no container.
	pub fn is_empty(&self) -> bool {
		self.containers.is_empty()
	}

	/// Container by id.
	pub fn get(&self, id: ContainerId) -> Option<&C> {
		self.containers.get(id.0)
	}

	/// Mutable container by id.
	pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut C> {
		self.containers.get_mut(id.0)
	}

	/// Containers in navigation order.
	pub fn iter(&self) -> impl Iterator<Item = &C> {
		self.containers.iter()
	}

	/// The container holding the point.
	pub fn focused(&self) -> Option<ContainerId> {
		self.focus
	}

	/// Move the point to another container without touching editor focus.
	pub fn set_focus(&mut self, id: ContainerId) -> Result<()> {
		self.check(id)?;
		self.focus = Some(id);
		Ok(())
	}

	/// Move the point to a container and give it editor focus.
	pub fn focus_container(&mut self, id: ContainerId) {
		if let Some(container) = self.containers.get_mut(id.0) {
			container.focus();
			self.focus = Some(id);
		}
	}

	/// Give editor focus back to the container holding the point.
	pub fn focus(&mut self) {
		if let Some(id) = self.focus {
			self.focus_container(id);
		}
	}

	/// The statement following `prev` across container boundaries.
	pub fn get_next(&self, prev: Option<StatementKey>) -> Option<Statement> {
		next_statement(&self.containers, prev)
	}

	/// The marked statement under the cursor of the focused container.
	pub fn get_at_point(&self) -> Option<Statement> {
		let id = self.focus?;
		let sentence = self.containers.get(id.0)?.get_at_point()?;
		Some(Statement::from_sentence(id, sentence))
	}

	/// Whether `stmt` lies after the point.
	///
	/// Only container order is compared: a statement in the focused container is never considered
	/// past the point, whatever its offset. Ordering within a container is left to
	/// [`ContainerAggregate::get_at_point`].
	pub fn after_point(&self, stmt: &StatementKey) -> Result<bool> {
		let point = self.focus.ok_or(SessionError::NoContainers)?;
		self.check(stmt.container)?;
		Ok(point < stmt.container)
	}

	/// Forward a mark to the statement's owner.
	pub fn mark(&mut self, key: StatementKey, mark: Mark) {
		match self.containers.get_mut(key.container.0) {
			Some(container) => container.mark(key.index, mark),
			None => tracing::warn!(statement = %key, "Mark for unknown container dropped"),
		}
	}

	/// Current mark of a statement.
	pub fn mark_of(&self, key: StatementKey) -> Mark {
		self.containers
			.get(key.container.0)
			.map_or(Mark::Clear, |container| container.mark_of(key.index))
	}

	/// Move the owner's cursor to the start of a statement.
	pub fn cursor_to_start(&mut self, key: StatementKey) {
		if let Some(container) = self.containers.get_mut(key.container.0) {
			container.cursor_to_start(key.index);
		}
	}

	/// Move the owner's cursor to the end of a statement.
	pub fn cursor_to_end(&mut self, key: StatementKey) {
		if let Some(container) = self.containers.get_mut(key.container.0) {
			container.cursor_to_end(key.index);
		}
	}

	fn check(&self, id: ContainerId) -> Result<()> {
		if id.0 < self.containers.len() {
			Ok(())
		} else {
			Err(SessionError::UnknownContainer(id))
		}
	}
}

/// Cross-container successor of `prev`.
///
/// The first statement of the document when `prev` is `None`; otherwise the next statement in
/// `prev`'s container, falling through to the first statement of each later non-empty container.
pub fn next_statement<C: StatementContainer>(containers: &[C], prev: Option<StatementKey>) -> Option<Statement> {
	let (start, after) = match prev {
		None => (0, None),
		Some(key) => (key.container.0, Some(key.index)),
	};

	containers.iter().enumerate().skip(start).find_map(|(idx, container)| {
		let prev_index = if idx == start { after } else { None };
		container
			.get_next(prev_index)
			.map(|sentence| Statement::from_sentence(ContainerId(idx), sentence))
	})
}
