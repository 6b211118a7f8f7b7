//! Per-connection handler: decode loop and action routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a writer task that pumps the connection's event channel
//! out through the codec. The same unbounded channel carries both
//! session broadcasts and caller-only errors, so a client always sees
//! events in the order the mutations were applied.

use std::sync::Arc;
use std::time::Duration;

use pairgrid_game::build_deck;
use pairgrid_protocol::{ClientAction, Codec, ConnectionId, ServerEvent};
use pairgrid_session::MemberSender;
use pairgrid_transport::{Connection, WebSocketConnection};

use crate::PairgridError;
use crate::server::{DEFAULT_TURN_SECONDS, ServerState};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), PairgridError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Outbound path: events → codec → socket, independent of the reader
    // so a slow broadcast can never block inbound actions.
    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let writer_conn = conn.clone();
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                let action: ClientAction = match state.codec.decode(&data) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::debug!(
                            %conn_id,
                            error = %e,
                            "undecodable frame, skipping"
                        );
                        continue;
                    }
                };
                handle_action(conn_id, action, &state, &events_tx).await;
            }
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    // Exit path: always detach from whatever session we were in. The
    // actor is awaited after the registry lock is released.
    let departure = {
        let mut registry = state.registry.lock().await;
        registry
            .unbind(conn_id)
            .and_then(|id| registry.get(id).map(|handle| (id, handle)))
    };
    if let Some((session_id, handle)) = departure {
        let remaining = handle.disconnect(conn_id).await.unwrap_or(0);
        if remaining == 0 {
            state.registry.lock().await.remove(session_id);
            tracing::info!(%session_id, "session emptied, reclaimed");
        }
    }
    writer.abort();
    Ok(())
}

/// Routes one decoded action.
///
/// Failures that only concern the caller (nothing to join, unknown
/// session, bad deck input) are reported through the caller's own event
/// channel; nothing here is fatal to the connection.
async fn handle_action(
    conn_id: ConnectionId,
    action: ClientAction,
    state: &Arc<ServerState>,
    events_tx: &MemberSender,
) {
    match action {
        ClientAction::CreateSession {
            player_name,
            image_refs,
            card_set,
            time_per_turn_seconds,
        } => {
            let refs = if !image_refs.is_empty() {
                image_refs
            } else if let Some(name) = card_set {
                match state.card_sets.load(&name).await {
                    Ok(refs) => refs,
                    Err(e) => {
                        send_caller(events_tx, ServerEvent::NoGameAvailable {
                            message: e.to_string(),
                        });
                        return;
                    }
                }
            } else {
                send_caller(events_tx, ServerEvent::NoGameAvailable {
                    message: "no images or card set provided".to_string(),
                });
                return;
            };

            let deck = match build_deck(&refs, &mut rand::rng()) {
                Ok(deck) => deck,
                Err(e) => {
                    send_caller(events_tx, ServerEvent::NoGameAvailable {
                        message: e.to_string(),
                    });
                    return;
                }
            };

            let time_per_turn = Duration::from_secs(if time_per_turn_seconds == 0 {
                DEFAULT_TURN_SECONDS
            } else {
                time_per_turn_seconds
            });

            let handle = {
                let mut registry = state.registry.lock().await;
                if registry.session_of(conn_id).is_some() {
                    send_caller(events_tx, ServerEvent::NoGameAvailable {
                        message: "already in a session".to_string(),
                    });
                    return;
                }
                registry.create(deck, time_per_turn)
            };
            let session_id = handle.session_id();
            match handle.join(conn_id, player_name, events_tx.clone()).await {
                Ok(()) => state.registry.lock().await.bind(conn_id, session_id),
                Err(e) => {
                    // A session nobody ever joined must not linger.
                    state.registry.lock().await.remove(session_id);
                    tracing::warn!(%conn_id, %session_id, error = %e, "creator failed to join");
                    send_caller(events_tx, ServerEvent::NoGameAvailable {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientAction::JoinSession { player_name } => {
            let handles = {
                let registry = state.registry.lock().await;
                if registry.session_of(conn_id).is_some() {
                    send_caller(events_tx, ServerEvent::NoGameAvailable {
                        message: "already in a session".to_string(),
                    });
                    return;
                }
                registry.session_handles()
            };

            // Scan for the first joinable session with the lock released.
            let mut target = None;
            for handle in handles {
                if let Ok(info) = handle.info().await {
                    if info.phase.is_joinable() {
                        target = Some(handle);
                        break;
                    }
                }
            }
            let Some(handle) = target else {
                send_caller(events_tx, ServerEvent::NoGameAvailable {
                    message: "no game available to join".to_string(),
                });
                return;
            };

            let session_id = handle.session_id();
            match handle.join(conn_id, player_name, events_tx.clone()).await {
                Ok(()) => state.registry.lock().await.bind(conn_id, session_id),
                Err(e) => send_caller(events_tx, ServerEvent::NoGameAvailable {
                    message: e.to_string(),
                }),
            }
        }

        ClientAction::StartSession { session_id } => {
            let handle = state.registry.lock().await.get(session_id);
            match handle {
                Some(handle) => {
                    let _ = handle.start(conn_id).await;
                }
                None => send_game_not_found(events_tx, session_id),
            }
        }

        ClientAction::FlipCard {
            session_id,
            card_id,
        } => {
            let handle = state.registry.lock().await.get(session_id);
            match handle {
                Some(handle) => {
                    let _ = handle.flip(conn_id, card_id).await;
                }
                None => send_game_not_found(events_tx, session_id),
            }
        }

        ClientAction::SkipTurn { session_id } => {
            let handle = state.registry.lock().await.get(session_id);
            match handle {
                Some(handle) => {
                    let _ = handle.skip(conn_id).await;
                }
                None => send_game_not_found(events_tx, session_id),
            }
        }
    }
}

fn send_caller(events_tx: &MemberSender, event: ServerEvent) {
    let _ = events_tx.send(event);
}

fn send_game_not_found(
    events_tx: &MemberSender,
    session_id: pairgrid_protocol::SessionId,
) {
    send_caller(events_tx, ServerEvent::GameNotFound {
        message: format!("session {session_id} not found"),
    });
}
