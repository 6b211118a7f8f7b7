//! Wire protocol for Pairgrid.
//!
//! Everything a client and server exchange lives in this crate:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`GameSnapshot`],
//!   identifiers) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! layer (game state). It knows nothing about connections, timers, or
//! matching rules — only message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Card, CardId, ClientAction, GameSnapshot, Phase, Player, ServerEvent,
    SessionId,
};

// The connection identifier is minted by the transport at accept time but
// travels on the wire (it doubles as the turn-ownership token), so it is
// re-exported here for downstream crates.
pub use pairgrid_transport::ConnectionId;
