//! Session actors and registry for Pairgrid.
//!
//! Each session runs as an isolated Tokio task (actor model) that owns a
//! [`pairgrid_game::MatchGame`] plus its two timers. All mutations for a
//! session flow through one `mpsc` command channel, so per-session state
//! needs no locks and sessions never block each other.
//!
//! # Key types
//!
//! - [`SessionHandle`] — send commands to a running session actor
//! - [`SessionRegistry`] — creates sessions, routes connections to them
//! - [`MemberSender`] — per-member outbound event channel

mod actor;
mod error;
mod registry;

pub use actor::{MemberSender, SessionHandle, SessionInfo};
pub use error::SessionError;
pub use registry::SessionRegistry;
