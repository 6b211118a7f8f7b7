//! The session entity and the matching engine.
//!
//! [`MatchGame`] owns one session's full state. All mutations are plain
//! synchronous methods; the session actor above this crate serializes the
//! calls, so none of this code needs to think about concurrency.

use std::time::Duration;

use pairgrid_protocol::{
    Card, CardId, ConnectionId, GameSnapshot, Phase, Player, SessionId,
};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::GameError;

/// What a flip produced, telling the caller what to broadcast and
/// whether to schedule a pending-pair resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Duplicate/late/impossible flip, absorbed silently: unknown card,
    /// already flipped or matched, game not Active, or a full pending
    /// pair still awaiting resolution.
    Ignored,
    /// The card was revealed; one card is now pending.
    Revealed,
    /// The card was revealed and completed a pending pair; resolution
    /// should run after the reveal delay.
    PairPending,
}

/// Outcome of resolving a pending pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// `true`: the two cards shared an image — they stay revealed,
    /// the turn owner scored, the turn did not change.
    /// `false`: the cards were hidden again and the turn advanced.
    pub matched: bool,
}

/// Result of removing a player from a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedPlayer {
    pub name: String,
    /// `true` when the departing player held the turn and it was
    /// force-advanced to a surviving player before removal.
    pub turn_passed: bool,
}

/// One session's complete game state.
pub struct MatchGame {
    id: SessionId,
    cards: Vec<Card>,
    /// Join order.
    players: Vec<Player>,
    /// Rotation sequence, fixed (as a fresh random permutation of the
    /// players) when the game starts; mid-game joiners are appended.
    turn_order: Vec<ConnectionId>,
    current: Option<ConnectionId>,
    moves: u64,
    phase: Phase,
    time_per_turn: Duration,
}

impl MatchGame {
    /// Creates a Forming session around an already-built deck.
    pub fn new(id: SessionId, cards: Vec<Card>, time_per_turn: Duration) -> Self {
        Self {
            id,
            cards,
            players: Vec::new(),
            turn_order: Vec::new(),
            current: None,
            moves: 0,
            phase: Phase::Forming,
            time_per_turn,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn current(&self) -> Option<ConnectionId> {
        self.current
    }

    pub fn time_per_turn(&self) -> Duration {
        self.time_per_turn
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn turn_order(&self) -> &[ConnectionId] {
        &self.turn_order
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether `conn` is a member of this session.
    pub fn has_player(&self, conn: ConnectionId) -> bool {
        self.players.iter().any(|p| p.conn == conn)
    }

    /// Ids of the cards currently revealed but unresolved (0, 1, or 2).
    pub fn pending_pair(&self) -> Vec<CardId> {
        self.cards
            .iter()
            .filter(|c| c.flipped && !c.matched)
            .map(|c| c.id)
            .collect()
    }

    /// Adds a player. Mid-game joiners enter the rotation at the end.
    pub fn add_player(&mut self, conn: ConnectionId, name: impl Into<String>) {
        self.players.push(Player {
            conn,
            name: name.into(),
            score: 0,
        });
        if self.phase.is_active() {
            self.turn_order.push(conn);
        }
    }

    /// Forming → Active: fixes `turn_order` as a fresh random permutation
    /// of the current players (independent of join order) and hands the
    /// first turn to its head.
    ///
    /// Returns `false` (silent no-op) when the session is not Forming or
    /// has no players.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.phase != Phase::Forming || self.players.is_empty() {
            return false;
        }
        let mut order: Vec<ConnectionId> =
            self.players.iter().map(|p| p.conn).collect();
        order.shuffle(rng);
        self.current = order.first().copied();
        self.turn_order = order;
        self.phase = Phase::Active;
        true
    }

    /// Reveals a card for the turn owner.
    ///
    /// # Errors
    /// [`GameError::NotYourTurn`] when `caller` does not own the turn.
    /// Everything else that cannot proceed is an [`FlipOutcome::Ignored`]
    /// no-op, including a third flip while a pending pair awaits
    /// resolution.
    pub fn flip(
        &mut self,
        caller: ConnectionId,
        card_id: CardId,
    ) -> Result<FlipOutcome, GameError> {
        if !self.phase.is_active() {
            return Ok(FlipOutcome::Ignored);
        }
        if self.current != Some(caller) {
            return Err(GameError::NotYourTurn);
        }
        // A full pending pair excludes further flips until it resolves.
        if self.pending_pair().len() >= 2 {
            return Ok(FlipOutcome::Ignored);
        }
        let Some(card) = self.cards.iter_mut().find(|c| c.id == card_id)
        else {
            return Ok(FlipOutcome::Ignored);
        };
        if card.flipped || card.matched {
            return Ok(FlipOutcome::Ignored);
        }

        card.flipped = true;
        self.moves += 1;

        if self.pending_pair().len() == 2 {
            Ok(FlipOutcome::PairPending)
        } else {
            Ok(FlipOutcome::Revealed)
        }
    }

    /// Resolves the pending pair. Returns `None` unless exactly two cards
    /// are pending (the caller may race a late timer against an already
    /// resolved pair; that must be harmless).
    pub fn resolve_pending(&mut self) -> Option<Resolution> {
        let pending: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.flipped && !c.matched)
            .map(|(i, _)| i)
            .collect();
        let [a, b] = pending[..] else {
            return None;
        };

        let matched = self.cards[a].image_ref == self.cards[b].image_ref;
        if matched {
            self.cards[a].matched = true;
            self.cards[b].matched = true;
            if let Some(owner) = self.current {
                if let Some(player) =
                    self.players.iter_mut().find(|p| p.conn == owner)
                {
                    player.score += 1;
                }
            }
        } else {
            self.cards[a].flipped = false;
            self.cards[b].flipped = false;
            self.advance_turn();
        }
        Some(Resolution { matched })
    }

    /// Active → Over the instant every card is matched. Returns `true`
    /// only on the transition, so the terminal broadcast fires exactly
    /// once.
    pub fn finish_if_complete(&mut self) -> bool {
        if self.phase.is_over() || self.cards.is_empty() {
            return false;
        }
        if self.cards.iter().all(|c| c.matched) {
            self.phase = Phase::Over;
            return true;
        }
        false
    }

    /// Passes the turn to the next player in rotation.
    ///
    /// `caller` is `Some` for a voluntary skip (must own the turn) and
    /// `None` for a timer-forced skip (ownership check bypassed).
    ///
    /// # Errors
    /// [`GameError::NotYourTurn`] when a voluntary caller does not own
    /// the turn.
    pub fn skip_turn(
        &mut self,
        caller: Option<ConnectionId>,
    ) -> Result<(), GameError> {
        if let Some(caller) = caller {
            if self.current != Some(caller) {
                return Err(GameError::NotYourTurn);
            }
        }
        if !self.phase.is_active() {
            return Ok(());
        }
        self.moves += 1;
        self.advance_turn();
        Ok(())
    }

    /// Removes a player from both `players` and `turn_order`.
    ///
    /// When the departing player holds the turn and others remain, the
    /// turn force-advances to the next rotation entry before removal.
    /// Returns `None` if the player was not a member.
    pub fn remove_player(&mut self, conn: ConnectionId) -> Option<RemovedPlayer> {
        let idx = self.players.iter().position(|p| p.conn == conn)?;

        let mut turn_passed = false;
        if self.current == Some(conn)
            && self.players.len() > 1
            && self.phase.is_active()
        {
            self.advance_turn();
            turn_passed = true;
        }

        let removed = self.players.remove(idx);
        self.turn_order.retain(|c| *c != conn);
        if self.current == Some(conn) {
            // Departing player was the sole member (or the game never
            // started); nobody holds the turn now.
            self.current = self.turn_order.first().copied();
        }

        Some(RemovedPlayer {
            name: removed.name,
            turn_passed,
        })
    }

    /// A serializable view of the full session state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            cards: self.cards.clone(),
            players: self.players.clone(),
            current: self.current,
            moves: self.moves,
            phase: self.phase,
            time_per_turn_seconds: self.time_per_turn.as_secs(),
        }
    }

    /// Advances `current` along `turn_order` with wrap-around. If the
    /// current owner is no longer in the rotation (defensive), ownership
    /// resets to the first remaining entry without advancing further.
    fn advance_turn(&mut self) {
        if self.turn_order.is_empty() {
            self.current = None;
            return;
        }
        let next = match self
            .current
            .and_then(|c| self.turn_order.iter().position(|&o| o == c))
        {
            Some(i) => self.turn_order[(i + 1) % self.turn_order.len()],
            None => self.turn_order[0],
        };
        self.current = Some(next);
    }
}
