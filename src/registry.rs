//! Connection registry — the realtime gateway's only shared mutable state.
//!
//! DESIGN
//! ======
//! Maps each user id to at most one live connection. Registration is
//! last-connection-wins: a fresh websocket for a user silently replaces any
//! prior one. Every registration carries a connection id so that the close
//! of a *replaced* socket cannot evict its replacement.
//!
//! The registry queues nothing and persists nothing. `relay` is a
//! best-effort `try_send`; an offline receiver or a full channel drops the
//! event, and the receiver catches up through the durable HTTP path.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::event::ServerEvent;

struct Registration {
    connection_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
}

/// Owned user-to-connection map. Cheap to clone; shared via `Arc` inside.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Registration>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Bind a user to a connection, replacing any prior registration.
    pub async fn register(&self, user_id: Uuid, connection_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        let mut map = self.inner.write().await;
        let replaced = map
            .insert(user_id, Registration { connection_id, tx })
            .is_some();
        if replaced {
            tracing::info!(%user_id, %connection_id, "registry: replaced prior connection");
        }
    }

    /// Remove a user's registration, but only if it still belongs to the
    /// given connection. Returns whether anything was removed.
    pub async fn unregister(&self, user_id: Uuid, connection_id: Uuid) -> bool {
        let mut map = self.inner.write().await;
        match map.get(&user_id) {
            Some(reg) if reg.connection_id == connection_id => {
                map.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Relay an event to a user's live connection, if any. Best-effort: a
    /// full channel counts as not delivered and is never an error.
    pub async fn relay(&self, receiver_id: Uuid, event: ServerEvent) -> bool {
        let map = self.inner.read().await;
        let Some(reg) = map.get(&receiver_id) else {
            return false;
        };
        reg.tx.try_send(event).is_ok()
    }

    /// Whether a user currently has a live connection.
    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.read().await.contains_key(&user_id)
    }

    /// Number of registered connections.
    pub async fn online_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
