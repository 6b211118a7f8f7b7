//! Error types for the game core.

/// Errors produced by game-rule violations.
///
/// Everything else a client can get wrong (flipping an unknown, already
/// flipped, or matched card; acting on a finished game) is absorbed as a
/// no-op rather than an error — duplicate and late messages must never
/// hurt a session.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// A deck needs at least 2 distinct images.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The acting player does not own the current turn.
    #[error("not your turn")]
    NotYourTurn,
}
