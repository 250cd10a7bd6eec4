//! Synchronization between an interactive document and a stateful proof kernel.
//!
//! A document is an ordered set of [`StatementContainer`]s (one per editable region) composed by a
//! [`ContainerAggregate`]. The [`Session`] walks statements through the kernel one at a time:
//!
//! - **Ledger** ([`Ledger`]): what was submitted (`pending`) and what the kernel accepted
//!   (`committed`), keyed by kernel state id.
//! - **Navigation** ([`Session::advance`], [`Session::retreat`], [`Session::sync_to_cursor`]):
//!   cursor-driven submission and retraction.
//! - **Feedback routing** ([`Session::handle_inbound`]): applies asynchronous kernel messages to the
//!   ledger and the containers' marks.
//!
//! All state transitions happen on the caller's thread in response to a user action or a kernel
//! message; nothing here spawns tasks. Commands leave through a [`CommandGateway`], and everything
//! meant for a panel or log is reported to a [`SessionObserver`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use proofdoc_session::{BufferContainer, ChannelGateway, NoOpObserver, Session, SessionConfig};
//!
//! let (gateway, _commands) = ChannelGateway::channel();
//! let containers = vec![BufferContainer::new("main.v", "Lemma l : True. Proof. exact I. Qed.")];
//! let mut session = Session::new(SessionConfig::default(), containers, Box::new(gateway), Arc::new(NoOpObserver));
//! session.start();
//! // feed kernel messages with `session.handle_inbound(..)`, navigate with `session.advance(true)`.
//! ```

pub mod aggregate;
pub mod config;
pub mod container;
pub mod directive;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod observer;
pub mod packages;
mod session;
pub mod statement;

mod invariants;
#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{ContainerAggregate, next_statement};
pub use config::SessionConfig;
pub use container::{BufferContainer, StatementContainer};
pub use directive::Directive;
pub use error::{ConfigError, SessionError};
pub use gateway::{ChannelGateway, CommandGateway};
pub use ledger::{InFlight, Ledger};
pub use observer::{NoOpObserver, SessionObserver, SharedObserver};
pub use proofdoc_protocol as protocol;
pub use session::{Advance, Phase, Retreat, Session, SyncOutcome};
pub use statement::{ContainerId, Mark, Sentence, Statement, StatementKey, StatementKind};

/// A convenient type alias for `Result` with `E` = [`SessionError`].
pub type Result<T, E = SessionError> = std::result::Result<T, E>;
