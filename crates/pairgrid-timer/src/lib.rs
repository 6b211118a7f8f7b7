//! One-shot countdown timers for Pairgrid session actors.
//!
//! A [`Countdown`] is a resettable deadline. While disarmed, its
//! [`Countdown::fire`] future pends forever, so it can live permanently
//! as a `tokio::select!` branch without a guard condition.
//!
//! # Integration
//!
//! The session actor holds one countdown per deadline it cares about
//! (turn expiry, pending-pair reveal) and polls them alongside its
//! command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle commands */ }
//!         _ = turn_timer.fire() => { /* force-skip the turn */ }
//!         _ = reveal_timer.fire() => { /* resolve the pending pair */ }
//!     }
//! }
//! ```
//!
//! Because the countdowns are owned by the actor, a pending deadline
//! dies with the actor task. There is no detached timer that can fire
//! against a session that no longer exists.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A one-shot, resettable countdown.
///
/// Arming replaces any previous deadline, so only the most recent call
/// to [`Countdown::arm`] counts.
#[derive(Debug)]
pub struct Countdown {
    deadline: Option<Instant>,
}

impl Countdown {
    /// Creates a disarmed countdown.
    pub fn idle() -> Self {
        Self { deadline: None }
    }

    /// Arms (or re-arms) the countdown to fire after `after`.
    pub fn arm(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
        trace!(after_ms = after.as_millis() as u64, "countdown armed");
    }

    /// Disarms the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            trace!("countdown cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits for the deadline, then disarms.
    ///
    /// While disarmed this future pends forever — it never resolves on
    /// its own, but `tokio::select!` still processes other branches.
    pub async fn fire(&mut self) {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        time::sleep_until(deadline).await;
        self.deadline = None;
        trace!("countdown fired");
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::idle()
    }
}
