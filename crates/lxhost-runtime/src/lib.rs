//! Command transports for lxhost.
//!
//! This crate implements the execution layer: the `Transport` trait that turns
//! a tokenized `Command` into captured output text, with a local backend that
//! runs commands under a pseudo-terminal, a remote backend that delegates to a
//! caller-supplied `RemoteSession`, and a scripted `MockTransport` for tests.
//! File writes are expressed as one here-document pipeline over the same
//! transport.

pub mod command;
pub mod local;
pub mod mock;
pub mod remote;
pub mod transport;

pub use command::{shell_quote, Command};
pub use local::LocalTransport;
pub use mock::MockTransport;
pub use remote::{RemoteSession, RemoteTransport, SessionOutput};
pub use transport::{heredoc_delimiter, select_transport, FileWrite, Transport};

use thiserror::Error;

/// Error produced by a remote session implementation.
pub type SessionError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote transport requires a session")]
    NoSession,
    #[error("session {0} supports neither captured nor plain exec")]
    UnsupportedSession(String),
    #[error("unknown transport kind '{0}'")]
    UnknownKind(String),
    #[error("remote session failed: {0}")]
    Session(SessionError),
}
