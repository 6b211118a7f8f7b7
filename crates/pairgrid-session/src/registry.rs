//! Session registry: creates, tracks, and routes connections to sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pairgrid_protocol::{Card, ConnectionId, SessionId};

use crate::actor::spawn_session;
use crate::{MemberSender, SessionError, SessionHandle};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all live sessions and which connection belongs to which.
///
/// This is the entry point for session operations from the server layer.
/// Per-session serialization is the actor's job; the registry only
/// guards its own indexes, so callers clone the cheap [`SessionHandle`]
/// and release any outer lock before awaiting the actor.
pub struct SessionRegistry {
    /// Live sessions, keyed by session ID.
    sessions: HashMap<SessionId, SessionHandle>,

    /// Maps each connection to the session it is in.
    /// A connection is in at most ONE session at a time (key invariant).
    conn_sessions: HashMap<ConnectionId, SessionId>,
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            conn_sessions: HashMap::new(),
        }
    }

    /// Spawns a new session actor around `cards` and returns its handle.
    pub fn create(
        &mut self,
        cards: Vec<Card>,
        time_per_turn: Duration,
    ) -> SessionHandle {
        let session_id =
            SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_session(
            session_id,
            cards,
            time_per_turn,
            DEFAULT_CHANNEL_SIZE,
        );
        self.sessions.insert(session_id, handle.clone());
        tracing::info!(%session_id, "session created");
        handle
    }

    /// Returns a cheap clone of a session's handle.
    pub fn get(&self, session_id: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&session_id).cloned()
    }

    /// Cheap clones of every live session handle, for scans that must
    /// not hold a registry lock across actor calls.
    pub fn session_handles(&self) -> Vec<SessionHandle> {
        self.sessions.values().cloned().collect()
    }

    /// The session a connection currently belongs to, if any.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionId> {
        self.conn_sessions.get(&conn).copied()
    }

    /// Records that `conn` joined `session_id`.
    ///
    /// Called after a successful [`SessionHandle::join`] so that the
    /// handler's exit path can route the disconnect.
    pub fn bind(&mut self, conn: ConnectionId, session_id: SessionId) {
        self.conn_sessions.insert(conn, session_id);
    }

    /// Removes the binding for `conn`, returning the session it was in.
    ///
    /// The caller owns the follow-up: await
    /// [`SessionHandle::disconnect`] on the session's handle (outside
    /// any registry lock) and call [`remove`](Self::remove) when the
    /// session emptied.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<SessionId> {
        self.conn_sessions.remove(&conn)
    }

    /// Drops a session and any connection bindings pointing at it.
    ///
    /// Dropping the handle closes the actor's channel, which stops the
    /// task and cancels its timers. Returns `false` for unknown ids.
    pub fn remove(&mut self, session_id: SessionId) -> bool {
        if self.sessions.remove(&session_id).is_none() {
            return false;
        }
        self.conn_sessions.retain(|_, s| *s != session_id);
        tracing::debug!(%session_id, "session removed");
        true
    }

    /// Finds the first session still accepting players (any phase but
    /// Over). Mid-game joins are allowed.
    pub async fn find_joinable(&self) -> Option<SessionHandle> {
        for handle in self.sessions.values() {
            if let Ok(info) = handle.info().await {
                if info.phase.is_joinable() {
                    return Some(handle.clone());
                }
            }
        }
        None
    }

    /// Adds a connection to a specific session, enforcing the
    /// one-session-per-connection invariant.
    pub async fn join(
        &mut self,
        session_id: SessionId,
        conn: ConnectionId,
        name: impl Into<String>,
        sender: MemberSender,
    ) -> Result<(), SessionError> {
        if let Some(current) = self.conn_sessions.get(&conn) {
            return Err(SessionError::Unavailable(*current));
        }
        let handle = self
            .sessions
            .get(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;

        handle.join(conn, name, sender).await?;
        self.conn_sessions.insert(conn, session_id);
        Ok(())
    }

    /// Removes a connection from its session. When the session empties,
    /// the handle is dropped, which closes the actor's channel, stops
    /// the task, and cancels any live timer with it.
    ///
    /// Returns the session the connection was in, or `None` when it was
    /// in none (already handled, or it never joined).
    pub async fn disconnect(&mut self, conn: ConnectionId) -> Option<SessionId> {
        let session_id = self.unbind(conn)?;
        let handle = self.sessions.get(&session_id)?.clone();

        match handle.disconnect(conn).await {
            Ok(0) => {
                self.remove(session_id);
                tracing::info!(%session_id, "session emptied, reclaimed");
            }
            Ok(remaining) => {
                tracing::debug!(%session_id, remaining, "connection left session");
            }
            Err(err) => {
                // Actor already stopped; drop the index entry anyway.
                tracing::debug!(%session_id, %err, "disconnect raced session teardown");
                self.remove(session_id);
            }
        }
        Some(session_id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// All live session IDs.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
