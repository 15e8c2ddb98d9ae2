//! Websocket handler — the realtime relay between chat participants.
//!
//! DESIGN
//! ======
//! A connection authenticates with a one-time ticket, binds to a user id,
//! and registers itself immediately; the registry is last-connection-wins.
//! After that the loop is a plain `select!`:
//! - inbound `sendMessage` events → relay to the receiver's connection
//! - relayed events from peers → forward to this socket
//!
//! The relay is best-effort on top of the durable append the client already
//! performed over HTTP. An offline receiver is not an error; they catch up
//! on the next chat fetch. The gateway has no ack channel: failed relays
//! and malformed events are logged and dropped.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (ticket consumed) → register → send `connected`
//! 2. Client pushes `sendMessage` → relay `getMessage` to receiver
//! 3. Close → unregister, guarded by connection id so a replaced socket's
//!    close cannot evict its replacement.

use axum::extract::ws::{Message as WsFrame, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::{ClientEvent, ServerEvent};
use crate::services::session;
use crate::state::AppState;

/// Outbound channel depth per connection. Chat traffic is light; a full
/// channel means a stalled client, and drops are acceptable.
const OUTBOUND_BUFFER: usize = 64;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(ticket) = params.get("ticket") else {
        return (StatusCode::UNAUTHORIZED, "ticket required").into_response();
    };

    let user_id = match session::consume_ws_ticket(&state.pool, ticket).await {
        Ok(Some(uid)) => uid,
        Ok(None) => return (StatusCode::UNAUTHORIZED, "invalid or expired ticket").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "ws ticket validation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "ticket validation error").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, user_id))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, user_id: Uuid) {
    let connection_id = Uuid::new_v4();

    // Per-connection channel for events relayed from other users.
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);

    // Register before the welcome event so a message relayed during the
    // handshake is not lost.
    state.registry.register(user_id, connection_id, tx).await;

    if send_event(&mut socket, &ServerEvent::Connected { user_id }).await.is_err() {
        state.registry.unregister(user_id, connection_id).await;
        return;
    }

    info!(%user_id, %connection_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    WsFrame::Text(text) => {
                        process_inbound_text(&state, user_id, &text).await;
                    }
                    WsFrame::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.unregister(user_id, connection_id).await;
    info!(%user_id, %connection_id, "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Parse and process one inbound text event.
///
/// Kept separate from the socket loop so tests can exercise relay behavior
/// without a live websocket transport.
async fn process_inbound_text(state: &AppState, user_id: Uuid, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(%user_id, error = %e, "ws: invalid inbound event, dropped");
            return;
        }
    };

    match event {
        ClientEvent::SendMessage { receiver_id, data } => {
            // The payload must carry the authenticated sender; a mismatch is
            // a spoof attempt and the event is dropped.
            if data.sender_id != user_id {
                warn!(%user_id, claimed = %data.sender_id, "ws: sender mismatch, dropped");
                return;
            }

            let message_id = data.id;
            let delivered = state
                .registry
                .relay(receiver_id, ServerEvent::GetMessage { data })
                .await;
            if delivered {
                info!(%user_id, %receiver_id, %message_id, "ws: message relayed");
            } else {
                // Fire-and-forget contract: the receiver is offline (or
                // stalled) and will catch up over HTTP.
                info!(%user_id, %receiver_id, %message_id, "ws: receiver offline, relay skipped");
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(WsFrame::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
