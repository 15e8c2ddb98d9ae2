//! Websocket wire events for the realtime gateway.
//!
//! DESIGN
//! ======
//! The realtime surface is deliberately tiny: a client pushes `sendMessage`
//! after the durable append succeeds, and the addressed receiver gets a
//! `getMessage` carrying the same record. The payload mirrors the persisted
//! `Message` shape so the receiving client can reconcile it by id against
//! what it later fetches over HTTP. The gateway never inspects the payload
//! beyond routing; durable state always wins over the push.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::message::Message;

/// Events a client may send over an established connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Push a just-created message toward the other chat participant.
    #[serde(rename_all = "camelCase")]
    SendMessage { receiver_id: Uuid, data: Message },
}

/// Events the gateway sends to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent once after the upgrade; confirms the identity the connection
    /// is registered under.
    #[serde(rename_all = "camelCase")]
    Connected { user_id: Uuid },
    /// A message addressed to this connection's user. Shaped identically to
    /// the persisted record; the `chatId` inside lets the client match it to
    /// an open chat.
    GetMessage { data: Message },
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
