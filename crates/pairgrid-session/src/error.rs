//! Error types for the session layer.

use pairgrid_protocol::SessionId;

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session does not exist (or has already been reclaimed).
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// No session is currently accepting players.
    #[error("no session available to join")]
    NoneAvailable,

    /// The session has finished and cannot be joined.
    #[error("session {0} is finished")]
    Finished(SessionId),

    /// The session's command channel is closed (actor stopped).
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
