//! Unified error type for the Pairgrid server.

use pairgrid_game::GameError;
use pairgrid_protocol::ProtocolError;
use pairgrid_session::SessionError;
use pairgrid_transport::TransportError;

use crate::store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairgridError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-core error (bad deck input, turn ownership).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A session-level error (not found, none available, finished).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A storage error (uploads, card sets).
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let top: PairgridError = err.into();
        assert!(matches!(top, PairgridError::Transport(_)));
        assert!(top.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let top: PairgridError = err.into();
        assert!(matches!(top, PairgridError::Protocol(_)));
    }

    #[test]
    fn test_from_game_error() {
        let err = GameError::NotYourTurn;
        let top: PairgridError = err.into();
        assert!(matches!(top, PairgridError::Game(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NoneAvailable;
        let top: PairgridError = err.into();
        assert!(matches!(top, PairgridError::Session(_)));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::TooFewImages(1);
        let top: PairgridError = err.into();
        assert!(matches!(top, PairgridError::Store(_)));
    }
}
