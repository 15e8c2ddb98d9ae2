use super::*;

use time::OffsetDateTime;
use tokio::time::{Duration, timeout};

use crate::services::message::Message;

fn dummy_message(sender_id: Uuid) -> Message {
    Message {
        id: Uuid::new_v4(),
        chat_id: Uuid::new_v4(),
        sender_id,
        text: "hi".into(),
        created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
    }
}

async fn assert_receives(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("channel closed")
}

async fn assert_empty(rx: &mut mpsc::Receiver<ServerEvent>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

// =============================================================================
// register / relay
// =============================================================================

#[tokio::test]
async fn relay_delivers_to_registered_user() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let sender = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);

    registry.register(user, Uuid::new_v4(), tx).await;

    let msg = dummy_message(sender);
    let delivered = registry
        .relay(user, ServerEvent::GetMessage { data: msg.clone() })
        .await;
    assert!(delivered);

    match assert_receives(&mut rx).await {
        ServerEvent::GetMessage { data } => assert_eq!(data.id, msg.id),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn relay_to_unregistered_user_is_silent() {
    let registry = ConnectionRegistry::new();
    let delivered = registry
        .relay(Uuid::new_v4(), ServerEvent::GetMessage { data: dummy_message(Uuid::new_v4()) })
        .await;
    assert!(!delivered);
}

#[tokio::test]
async fn relay_with_full_channel_is_best_effort() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(1);
    registry.register(user, Uuid::new_v4(), tx).await;

    let first = registry
        .relay(user, ServerEvent::GetMessage { data: dummy_message(user) })
        .await;
    let second = registry
        .relay(user, ServerEvent::GetMessage { data: dummy_message(user) })
        .await;

    assert!(first);
    assert!(!second, "full channel should drop, not block or error");
}

// =============================================================================
// last-connection-wins
// =============================================================================

#[tokio::test]
async fn register_replaces_prior_connection() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let (old_tx, mut old_rx) = mpsc::channel(8);
    let (new_tx, mut new_rx) = mpsc::channel(8);

    registry.register(user, Uuid::new_v4(), old_tx).await;
    registry.register(user, Uuid::new_v4(), new_tx).await;

    let delivered = registry
        .relay(user, ServerEvent::Connected { user_id: user })
        .await;
    assert!(delivered);

    assert_receives(&mut new_rx).await;
    assert_empty(&mut old_rx).await;
}

#[tokio::test]
async fn register_same_user_keeps_single_entry() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let (tx_a, _rx_a) = mpsc::channel(8);
    let (tx_b, _rx_b) = mpsc::channel(8);

    registry.register(user, Uuid::new_v4(), tx_a).await;
    registry.register(user, Uuid::new_v4(), tx_b).await;

    assert_eq!(registry.online_count().await, 1);
}

// =============================================================================
// unregister
// =============================================================================

#[tokio::test]
async fn unregister_matching_connection_removes() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let conn = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);

    registry.register(user, conn, tx).await;
    assert!(registry.is_online(user).await);

    assert!(registry.unregister(user, conn).await);
    assert!(!registry.is_online(user).await);
}

#[tokio::test]
async fn unregister_stale_connection_is_noop() {
    let registry = ConnectionRegistry::new();
    let user = Uuid::new_v4();
    let old_conn = Uuid::new_v4();
    let new_conn = Uuid::new_v4();
    let (old_tx, _old_rx) = mpsc::channel(8);
    let (new_tx, _new_rx) = mpsc::channel(8);

    registry.register(user, old_conn, old_tx).await;
    registry.register(user, new_conn, new_tx).await;

    // The replaced socket closing must not evict the replacement.
    assert!(!registry.unregister(user, old_conn).await);
    assert!(registry.is_online(user).await);

    assert!(registry.unregister(user, new_conn).await);
    assert!(!registry.is_online(user).await);
}

#[tokio::test]
async fn unregister_unknown_user_is_noop() {
    let registry = ConnectionRegistry::new();
    assert!(!registry.unregister(Uuid::new_v4(), Uuid::new_v4()).await);
}
