//! `PairgridServer` builder and accept loop.
//!
//! The entry point for running a Pairgrid game server. Ties the layers
//! together: transport → protocol → session registry → game core.

use std::path::PathBuf;
use std::sync::Arc;

use pairgrid_protocol::JsonCodec;
use pairgrid_session::SessionRegistry;
use pairgrid_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::PairgridError;
use crate::handler::handle_connection;
use crate::store::CardSetStore;

/// Turn length used when a client asks for 0 seconds per turn.
pub const DEFAULT_TURN_SECONDS: u64 = 20;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry mutex covers only index reads/writes; per-session work is
/// serialized by the session actors themselves.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) card_sets: CardSetStore,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Pairgrid server.
///
/// # Example
///
/// ```rust,ignore
/// use pairgrid::prelude::*;
///
/// let server = PairgridServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct PairgridServerBuilder {
    bind_addr: String,
    card_set_path: PathBuf,
}

impl PairgridServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            card_set_path: PathBuf::from("card_sets.json"),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets where the named card sets are persisted.
    pub fn card_set_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.card_set_path = path.into();
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<PairgridServer, PairgridError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new()),
            card_sets: CardSetStore::new(self.card_set_path),
            codec: JsonCodec,
        });

        Ok(PairgridServer { transport, state })
    }
}

impl Default for PairgridServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Pairgrid game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PairgridServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl PairgridServer {
    /// Creates a new builder.
    pub fn builder() -> PairgridServerBuilder {
        PairgridServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PairgridError> {
        tracing::info!("Pairgrid server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
