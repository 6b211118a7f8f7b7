//! Session actor: an isolated Tokio task that owns one match.
//!
//! Each session runs in its own task, communicating with the outside
//! world through an mpsc channel. Both timers (turn expiry and the
//! pending-pair reveal delay) live inside the actor's `select!` loop, so
//! a timer can never fire against a session that no longer exists and
//! never races another mutation of the same session.

use std::collections::HashMap;
use std::time::Duration;

use pairgrid_game::{FlipOutcome, GameError, MatchGame};
use pairgrid_protocol::{Card, CardId, ConnectionId, Phase, ServerEvent, SessionId};
use pairgrid_timer::Countdown;
use tokio::sync::{mpsc, oneshot};

use crate::SessionError;

/// How long a completed pending pair stays face up before resolution.
pub(crate) const REVEAL_DELAY: Duration = Duration::from_secs(1);

/// Channel sender for delivering outbound events to one session member.
pub type MemberSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a session actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum SessionCommand {
    /// Add a player to the session.
    Join {
        conn: ConnectionId,
        name: String,
        sender: MemberSender,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Start the match (Forming → Active).
    Start { caller: ConnectionId },

    /// Reveal a card.
    Flip {
        caller: ConnectionId,
        card: CardId,
    },

    /// Voluntarily pass the turn.
    Skip { caller: ConnectionId },

    /// Remove a player. Replies with the remaining player count so the
    /// registry can reclaim an emptied session.
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<usize>,
    },

    /// Request session metadata.
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
}

/// A snapshot of session metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub phase: Phase,
    pub player_count: usize,
    pub moves: u64,
}

/// Handle to a running session actor. Used to send commands to it.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. The
/// `SessionRegistry` holds one of these per session.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Sends a join request to the session.
    pub async fn join(
        &self,
        conn: ConnectionId,
        name: impl Into<String>,
        sender: MemberSender,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Join {
                conn,
                name: name.into(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }

    /// Asks the session to start (fire-and-forget).
    pub async fn start(&self, caller: ConnectionId) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Start { caller })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Delivers a flip from a player (fire-and-forget).
    pub async fn flip(
        &self,
        caller: ConnectionId,
        card: CardId,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Flip { caller, card })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Delivers a voluntary skip from a player (fire-and-forget).
    pub async fn skip(&self, caller: ConnectionId) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Skip { caller })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Removes a player, returning how many remain.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<usize, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Disconnect {
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Requests the current session info.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }
}

/// The internal session actor state. Runs inside a Tokio task.
struct SessionActor {
    game: MatchGame,
    /// Per-member outbound channels.
    senders: HashMap<ConnectionId, MemberSender>,
    receiver: mpsc::Receiver<SessionCommand>,
    turn_timer: Countdown,
    reveal_timer: Countdown,
}

impl SessionActor {
    /// Runs the actor loop, processing commands and timer expiries until
    /// the session empties or every handle is dropped.
    async fn run(mut self) {
        tracing::info!(session_id = %self.game.id(), "session actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                _ = self.turn_timer.fire() => self.handle_turn_timeout(),
                _ = self.reveal_timer.fire() => self.handle_resolution(),
            }
        }

        tracing::info!(session_id = %self.game.id(), "session actor stopped");
    }

    /// Returns `true` when the actor should stop (session emptied).
    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Join {
                conn,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(conn, name, sender);
                let _ = reply.send(result);
            }
            SessionCommand::Start { caller } => self.handle_start(caller),
            SessionCommand::Flip { caller, card } => {
                self.handle_flip(caller, card);
            }
            SessionCommand::Skip { caller } => self.handle_skip(caller),
            SessionCommand::Disconnect { conn, reply } => {
                let remaining = self.handle_disconnect(conn);
                let _ = reply.send(remaining);
                return remaining == 0;
            }
            SessionCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
        false
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        name: String,
        sender: MemberSender,
    ) -> Result<(), SessionError> {
        if self.game.phase().is_over() {
            return Err(SessionError::Finished(self.game.id()));
        }

        let mid_game = self.game.phase().is_active();
        self.senders.insert(conn, sender);
        self.game.add_player(conn, name);

        tracing::info!(
            session_id = %self.game.id(),
            conn_id = %conn,
            players = self.game.players().len(),
            "player joined"
        );

        let snapshot = self.game.snapshot();
        if mid_game {
            self.broadcast(ServerEvent::PlayerJoined { session: snapshot });
        } else {
            self.broadcast(ServerEvent::WaitingForOpponent { session: snapshot });
        }
        Ok(())
    }

    fn handle_start(&mut self, caller: ConnectionId) {
        if !self.game.has_player(caller) {
            tracing::warn!(
                session_id = %self.game.id(),
                conn_id = %caller,
                "start from non-member, ignoring"
            );
            return;
        }
        if !self.game.start(&mut rand::rng()) {
            tracing::debug!(
                session_id = %self.game.id(),
                phase = %self.game.phase(),
                "start ignored"
            );
            return;
        }

        tracing::info!(
            session_id = %self.game.id(),
            players = self.game.players().len(),
            "game started"
        );

        self.broadcast(ServerEvent::GameStarted {
            session: self.game.snapshot(),
        });
        self.start_turn_timer();
    }

    fn handle_flip(&mut self, caller: ConnectionId, card: CardId) {
        if !self.game.has_player(caller) {
            tracing::warn!(
                session_id = %self.game.id(),
                conn_id = %caller,
                "flip from non-member, ignoring"
            );
            return;
        }

        match self.game.flip(caller, card) {
            Err(GameError::NotYourTurn) => {
                self.send_to(caller, ServerEvent::NotYourTurn);
            }
            Err(err) => {
                tracing::debug!(session_id = %self.game.id(), %err, "flip rejected");
            }
            Ok(FlipOutcome::Ignored) => {
                tracing::debug!(
                    session_id = %self.game.id(),
                    card_id = %card,
                    "flip ignored"
                );
            }
            Ok(FlipOutcome::Revealed) => {
                self.broadcast(ServerEvent::CardFlipped {
                    session: self.game.snapshot(),
                });
            }
            Ok(FlipOutcome::PairPending) => {
                // Broadcast the reveal first so clients see both cards
                // face up for the full reveal delay.
                self.broadcast(ServerEvent::CardFlipped {
                    session: self.game.snapshot(),
                });
                self.reveal_timer.arm(REVEAL_DELAY);
            }
        }
    }

    /// Reveal timer expired: resolve the pending pair.
    fn handle_resolution(&mut self) {
        let Some(resolution) = self.game.resolve_pending() else {
            return;
        };

        tracing::debug!(
            session_id = %self.game.id(),
            matched = resolution.matched,
            "pending pair resolved"
        );

        if resolution.matched {
            self.broadcast(ServerEvent::CardFlipped {
                session: self.game.snapshot(),
            });
        } else {
            self.broadcast(ServerEvent::TurnChanged {
                session: self.game.snapshot(),
            });
        }

        if self.game.finish_if_complete() {
            tracing::info!(session_id = %self.game.id(), "game over");
            self.turn_timer.cancel();
            self.broadcast(ServerEvent::GameOver {
                session: self.game.snapshot(),
            });
        } else {
            // A match keeps the turn; either way the owner gets a fresh
            // full turn window.
            self.start_turn_timer();
        }
    }

    /// Turn timer expired: force-skip the owner.
    fn handle_turn_timeout(&mut self) {
        // A full pending pair is already being resolved; the resolution
        // advances the turn itself on mismatch.
        if self.game.pending_pair().len() == 2 {
            return;
        }
        if !self.game.phase().is_active() {
            return;
        }

        tracing::debug!(
            session_id = %self.game.id(),
            conn_id = ?self.game.current(),
            "turn expired, forcing skip"
        );

        if self.game.skip_turn(None).is_ok() {
            self.broadcast(ServerEvent::TurnChanged {
                session: self.game.snapshot(),
            });
            self.start_turn_timer();
        }
    }

    fn handle_skip(&mut self, caller: ConnectionId) {
        if !self.game.has_player(caller) {
            tracing::warn!(
                session_id = %self.game.id(),
                conn_id = %caller,
                "skip from non-member, ignoring"
            );
            return;
        }
        // Skipping mid-reveal would advance the turn twice.
        if self.game.pending_pair().len() == 2 {
            return;
        }
        if !self.game.phase().is_active() {
            return;
        }

        match self.game.skip_turn(Some(caller)) {
            Err(GameError::NotYourTurn) => {
                self.send_to(caller, ServerEvent::NotYourTurn);
            }
            Err(err) => {
                tracing::debug!(session_id = %self.game.id(), %err, "skip rejected");
            }
            Ok(()) => {
                self.broadcast(ServerEvent::TurnChanged {
                    session: self.game.snapshot(),
                });
                self.start_turn_timer();
            }
        }
    }

    /// Returns the number of players remaining after removal.
    fn handle_disconnect(&mut self, conn: ConnectionId) -> usize {
        self.senders.remove(&conn);

        // A departing turn holder may leave mid-reveal. Resolve the
        // pending pair now: the score lands on the player who flipped it,
        // and the turn advances at most once.
        if self.game.current() == Some(conn)
            && self.game.pending_pair().len() == 2
        {
            self.reveal_timer.cancel();
            self.handle_resolution();
        }

        if let Some(removed) = self.game.remove_player(conn) {
            tracing::info!(
                session_id = %self.game.id(),
                conn_id = %conn,
                player = %removed.name,
                players = self.game.players().len(),
                "player disconnected"
            );

            if !self.game.is_empty() {
                self.broadcast(ServerEvent::PlayerDisconnected {
                    player_name: removed.name,
                    session: self.game.snapshot(),
                });
                if removed.turn_passed {
                    self.broadcast(ServerEvent::TurnChanged {
                        session: self.game.snapshot(),
                    });
                    self.start_turn_timer();
                }
            }
        }

        let remaining = self.game.players().len();
        if remaining == 0 {
            self.turn_timer.cancel();
            self.reveal_timer.cancel();
        }
        remaining
    }

    /// Arms the turn timer for the current owner and announces it.
    fn start_turn_timer(&mut self) {
        if !self.game.phase().is_active() || self.game.current().is_none() {
            self.turn_timer.cancel();
            return;
        }
        let duration = self.game.time_per_turn();
        self.turn_timer.arm(duration);
        self.broadcast(ServerEvent::TurnTimerStarted {
            duration_seconds: duration.as_secs(),
        });
    }

    /// Fans an event out to every member, in command order. Silently
    /// drops members whose receiver is gone.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends an event to a single member.
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.game.id(),
            phase: self.game.phase(),
            player_count: self.game.players().len(),
            moves: self.game.moves(),
        }
    }
}

/// Spawns a new session actor task and returns a handle to it.
///
/// `channel_size` controls backpressure on the command channel.
pub(crate) fn spawn_session(
    session_id: SessionId,
    cards: Vec<Card>,
    time_per_turn: Duration,
    channel_size: usize,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = SessionActor {
        game: MatchGame::new(session_id, cards, time_per_turn),
        senders: HashMap::new(),
        receiver: rx,
        turn_timer: Countdown::idle(),
        reveal_timer: Countdown::idle(),
    };

    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
