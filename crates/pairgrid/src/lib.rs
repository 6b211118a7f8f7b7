//! # Pairgrid
//!
//! Server for a real-time, turn-based, multiplayer card-matching
//! ("memory") game. Clients connect over WebSocket, form sessions, take
//! turns revealing paired cards, and receive live state updates.
//!
//! Each session runs as its own actor task owning its game state and
//! timers; the server crate wires transport, protocol, and the session
//! registry together and adds the collaborator stores (uploaded card
//! images, named card sets).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairgrid::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PairgridError> {
//!     let server = PairgridServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod handler;
mod server;
pub mod store;

pub use error::PairgridError;
pub use server::{DEFAULT_TURN_SECONDS, PairgridServer, PairgridServerBuilder};

/// Commonly used types, re-exported for server binaries.
pub mod prelude {
    pub use crate::store::{CardSetStore, FsImageStore, ImageStore, UploadedImage};
    pub use crate::{PairgridError, PairgridServer, PairgridServerBuilder};
    pub use pairgrid_protocol::{
        Card, CardId, ClientAction, Codec, ConnectionId, GameSnapshot,
        JsonCodec, Phase, Player, ServerEvent, SessionId,
    };
}
