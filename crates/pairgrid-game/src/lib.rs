//! Pure game core for Pairgrid.
//!
//! Everything in this crate is synchronous and free of I/O: the deck
//! builder, the [`MatchGame`] session entity, the matching rules, and the
//! turn rotation. The session layer drives it from an actor task; tests
//! drive it directly with a seeded RNG.
//!
//! # Key types
//!
//! - [`build_deck`] — paired, uniformly shuffled cards from image refs
//! - [`MatchGame`] — one session's full state and its mutations
//! - [`FlipOutcome`] / [`Resolution`] — what a flip or a pending-pair
//!   resolution produced, so the caller knows what to broadcast
//! - [`GameError`] — invalid input and turn-ownership violations

mod deck;
mod error;
mod game;

pub use deck::build_deck;
pub use error::GameError;
pub use game::{FlipOutcome, MatchGame, RemovedPlayer, Resolution};
