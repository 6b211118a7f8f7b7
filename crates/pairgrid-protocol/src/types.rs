//! Core wire types: identifiers, snapshots, client actions, server events.
//!
//! Wire enums use `#[serde(tag = "type")]` (internally tagged JSON) so a
//! browser client can switch on a single `type` field. Identifier newtypes
//! use `#[serde(transparent)]` and serialize as plain numbers.

use std::fmt;

use pairgrid_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a game session, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Identifier of a card within its session, dense `0..2N-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Session lifecycle phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a session. Strictly ordered, `Over` is terminal:
///
/// ```text
/// Forming → Active → Over
/// ```
///
/// - **Forming**: session exists, players can join, the host has not
///   started the game yet.
/// - **Active**: turn order is fixed, the turn timer is running. Joins are
///   still accepted (deliberate mid-game join policy).
/// - **Over**: every card is matched. No further flips are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Forming,
    Active,
    Over,
}

impl Phase {
    /// Whether new players may still join. Any non-terminal session
    /// accepts joiners, including ones already running.
    pub fn is_joinable(&self) -> bool {
        !matches!(self, Self::Over)
    }

    /// Whether the game is running (turn rotation and flips apply).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether the session has reached its terminal phase.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Over)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forming => write!(f, "Forming"),
            Self::Active => write!(f, "Active"),
            Self::Over => write!(f, "Over"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities (also used verbatim in snapshots)
// ---------------------------------------------------------------------------

/// One card on the board. Created once by the deck builder; `flipped` and
/// `matched` are mutated only by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Stable reference (URL or path) to the card's face image.
    pub image_ref: String,
    pub flipped: bool,
    pub matched: bool,
}

/// One player in a session. The connection id doubles as the
/// turn-ownership token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub conn: ConnectionId,
    pub name: String,
    /// Increments only on a matched pair won by this player.
    pub score: u32,
}

/// A full serializable view of one session, broadcast with every
/// state-changing event so clients can rerender from any single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: SessionId,
    pub cards: Vec<Card>,
    /// Join order.
    pub players: Vec<Player>,
    /// Turn owner; `None` until the game starts.
    pub current: Option<ConnectionId>,
    pub moves: u64,
    pub phase: Phase,
    pub time_per_turn_seconds: u64,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Actions a connected client can request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Build a deck and open a new Forming session; the caller joins as
    /// the first player. When `image_refs` is empty, `card_set` names a
    /// stored card set to resolve the image list from.
    CreateSession {
        player_name: String,
        #[serde(default)]
        image_refs: Vec<String>,
        #[serde(default)]
        card_set: Option<String>,
        time_per_turn_seconds: u64,
    },

    /// Join the first session that is not yet Over.
    JoinSession { player_name: String },

    /// Host transition Forming → Active.
    StartSession { session_id: SessionId },

    /// Reveal a card. Subject to turn ownership and pending-pair rules.
    FlipCard {
        session_id: SessionId,
        card_id: CardId,
    },

    /// Voluntarily pass the turn.
    SkipTurn { session_id: SessionId },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Events the server pushes to clients. Broadcast to every member of the
/// session unless noted as caller-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Roster changed while the session is still Forming.
    WaitingForOpponent { session: GameSnapshot },

    /// A player joined a session that is already Active (mid-game join).
    PlayerJoined { session: GameSnapshot },

    /// The game started: turn order fixed, first turn assigned.
    GameStarted { session: GameSnapshot },

    /// A card was revealed, or a pending pair resolved as a match.
    CardFlipped { session: GameSnapshot },

    /// The turn moved to a new owner (mismatch, skip, timeout, or
    /// disconnect of the previous owner).
    TurnChanged { session: GameSnapshot },

    /// A fresh turn timer was armed.
    TurnTimerStarted { duration_seconds: u64 },

    /// Every card is matched; the session is terminal.
    GameOver { session: GameSnapshot },

    /// A player left; the snapshot reflects the roster after removal.
    PlayerDisconnected {
        player_name: String,
        session: GameSnapshot,
    },

    /// Caller-only: the action required turn ownership the caller lacks.
    NotYourTurn,

    /// Caller-only: no session is currently accepting joiners.
    NoGameAvailable { message: String },

    /// Caller-only: the referenced session does not exist (or expired).
    GameNotFound { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by a JavaScript client, so these tests
    //! pin the exact JSON shapes the serde attributes produce.

    use super::*;

    fn snapshot() -> GameSnapshot {
        GameSnapshot {
            id: SessionId(7),
            cards: vec![Card {
                id: CardId(0),
                image_ref: "/uploads/a.png".into(),
                flipped: false,
                matched: false,
            }],
            players: vec![Player {
                conn: ConnectionId::new(3),
                name: "ada".into(),
                score: 1,
            }],
            current: Some(ConnectionId::new(3)),
            moves: 4,
            phase: Phase::Active,
            time_per_turn_seconds: 30,
        }
    }

    #[test]
    fn test_session_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&SessionId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_card_id_deserializes_from_plain_number() {
        let id: CardId = serde_json::from_str("9").unwrap();
        assert_eq!(id, CardId(9));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SessionId(3).to_string(), "S-3");
        assert_eq!(CardId(12).to_string(), "C-12");
    }

    #[test]
    fn test_phase_is_joinable_includes_active() {
        // Mid-game joins are allowed: Active is still joinable.
        assert!(Phase::Forming.is_joinable());
        assert!(Phase::Active.is_joinable());
        assert!(!Phase::Over.is_joinable());
    }

    #[test]
    fn test_phase_is_active() {
        assert!(!Phase::Forming.is_active());
        assert!(Phase::Active.is_active());
        assert!(!Phase::Over.is_active());
    }

    #[test]
    fn test_client_action_flip_card_json_format() {
        let action = ClientAction::FlipCard {
            session_id: SessionId(7),
            card_id: CardId(3),
        };
        let json: serde_json::Value = serde_json::to_value(&action).unwrap();

        assert_eq!(json["type"], "FlipCard");
        assert_eq!(json["session_id"], 7);
        assert_eq!(json["card_id"], 3);
    }

    #[test]
    fn test_client_action_create_session_defaults() {
        // `image_refs` and `card_set` both default when absent, so a
        // client can send only the fields it uses.
        let json = r#"{
            "type": "CreateSession",
            "player_name": "ada",
            "time_per_turn_seconds": 30
        }"#;
        let action: ClientAction = serde_json::from_str(json).unwrap();
        match action {
            ClientAction::CreateSession {
                player_name,
                image_refs,
                card_set,
                time_per_turn_seconds,
            } => {
                assert_eq!(player_name, "ada");
                assert!(image_refs.is_empty());
                assert_eq!(card_set, None);
                assert_eq!(time_per_turn_seconds, 30);
            }
            other => panic!("expected CreateSession, got {other:?}"),
        }
    }

    #[test]
    fn test_client_action_join_session_round_trip() {
        let action = ClientAction::JoinSession {
            player_name: "bob".into(),
        };
        let bytes = serde_json::to_vec(&action).unwrap();
        let decoded: ClientAction = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(action, decoded);
    }

    #[test]
    fn test_server_event_timer_started_json_format() {
        let ev = ServerEvent::TurnTimerStarted {
            duration_seconds: 20,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "TurnTimerStarted");
        assert_eq!(json["duration_seconds"], 20);
    }

    #[test]
    fn test_server_event_game_over_carries_snapshot() {
        let ev = ServerEvent::GameOver {
            session: snapshot(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "GameOver");
        assert_eq!(json["session"]["id"], 7);
        assert_eq!(json["session"]["phase"], "Active");
        assert_eq!(json["session"]["players"][0]["name"], "ada");
    }

    #[test]
    fn test_server_event_not_your_turn_round_trip() {
        let ev = ServerEvent::NotYourTurn;
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snap = snapshot();
        let bytes = serde_json::to_vec(&snap).unwrap();
        let decoded: GameSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snap, decoded);
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientAction, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_action_type_returns_error() {
        let unknown = r#"{"type": "TeleportCard", "card_id": 1}"#;
        let result: Result<ClientAction, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
