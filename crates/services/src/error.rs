//! Shared error types for the services crate.

use thiserror::Error;

use storage::StateError;

use crate::session::SessionState;

/// Failures reported by the cmi5 protocol client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Other(String),
    /// The dispatch future was dropped before the call settled.
    #[error("dispatch dropped before it settled")]
    Cancelled,
}

/// Errors emitted by `SessionController::initialize`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitializationError {
    #[error("session already started (state: {0})")]
    AlreadyStarted(SessionState),
    #[error("Unable to retrieve launch data, reason: {0}")]
    LaunchData(#[source] ProtocolError),
    #[error("Unable to initialize, reason: {0}")]
    InitializeStatement(#[source] ProtocolError),
}

/// Errors emitted by session operations outside the dispatch path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("protocol client has no endpoint")]
    MissingEndpoint,
    #[error("statement could not be built: {0}")]
    Statement(#[from] serde_json::Error),
    #[error(transparent)]
    State(#[from] StateError),
}
