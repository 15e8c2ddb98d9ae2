use super::*;

use time::OffsetDateTime;
use tokio::time::{Duration, timeout};

use crate::services::message::Message;
use crate::state::test_helpers;

fn message_from(sender_id: Uuid) -> Message {
    Message {
        id: Uuid::new_v4(),
        chat_id: Uuid::new_v4(),
        sender_id,
        text: "hello".into(),
        created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
    }
}

fn send_message_json(receiver_id: Uuid, data: &Message) -> String {
    format!(
        r#"{{"event":"sendMessage","receiverId":"{receiver_id}","data":{}}}"#,
        serde_json::to_string(data).unwrap()
    )
}

async fn expect_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("channel closed")
}

async fn expect_no_event(rx: &mut mpsc::Receiver<ServerEvent>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no event"
    );
}

// =============================================================================
// process_inbound_text
// =============================================================================

#[tokio::test]
async fn send_message_relays_to_registered_receiver() {
    let state = test_helpers::test_app_state();
    let sender = Uuid::new_v4();
    let receiver = Uuid::new_v4();

    let (tx, mut rx) = mpsc::channel(8);
    state.registry.register(receiver, Uuid::new_v4(), tx).await;

    let msg = message_from(sender);
    process_inbound_text(&state, sender, &send_message_json(receiver, &msg)).await;

    match expect_event(&mut rx).await {
        ServerEvent::GetMessage { data } => {
            assert_eq!(data.id, msg.id);
            assert_eq!(data.chat_id, msg.chat_id);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn send_message_to_offline_receiver_is_silent() {
    let state = test_helpers::test_app_state();
    let sender = Uuid::new_v4();
    let receiver = Uuid::new_v4();

    // No registration for the receiver; must not panic or error.
    let msg = message_from(sender);
    process_inbound_text(&state, sender, &send_message_json(receiver, &msg)).await;
}

#[tokio::test]
async fn spoofed_sender_is_dropped() {
    let state = test_helpers::test_app_state();
    let authenticated = Uuid::new_v4();
    let impostor_victim = Uuid::new_v4();
    let receiver = Uuid::new_v4();

    let (tx, mut rx) = mpsc::channel(8);
    state.registry.register(receiver, Uuid::new_v4(), tx).await;

    // Payload claims a different sender than the authenticated connection.
    let msg = message_from(impostor_victim);
    process_inbound_text(&state, authenticated, &send_message_json(receiver, &msg)).await;

    expect_no_event(&mut rx).await;
}

#[tokio::test]
async fn invalid_json_is_ignored() {
    let state = test_helpers::test_app_state();
    process_inbound_text(&state, Uuid::new_v4(), "not json at all").await;
    process_inbound_text(&state, Uuid::new_v4(), r#"{"event":"sendMessage"}"#).await;
}

#[tokio::test]
async fn duplicate_relay_delivers_both_copies() {
    // At-least-once contract: the gateway does not dedupe; the receiving
    // client dedupes by message id.
    let state = test_helpers::test_app_state();
    let sender = Uuid::new_v4();
    let receiver = Uuid::new_v4();

    let (tx, mut rx) = mpsc::channel(8);
    state.registry.register(receiver, Uuid::new_v4(), tx).await;

    let msg = message_from(sender);
    let json = send_message_json(receiver, &msg);
    process_inbound_text(&state, sender, &json).await;
    process_inbound_text(&state, sender, &json).await;

    let first = expect_event(&mut rx).await;
    let second = expect_event(&mut rx).await;
    match (first, second) {
        (ServerEvent::GetMessage { data: a }, ServerEvent::GetMessage { data: b }) => {
            assert_eq!(a.id, msg.id);
            assert_eq!(b.id, msg.id);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn relay_reaches_only_the_addressed_user() {
    let state = test_helpers::test_app_state();
    let sender = Uuid::new_v4();
    let receiver = Uuid::new_v4();
    let bystander = Uuid::new_v4();

    let (rx_tx, mut receiver_rx) = mpsc::channel(8);
    let (by_tx, mut bystander_rx) = mpsc::channel(8);
    state.registry.register(receiver, Uuid::new_v4(), rx_tx).await;
    state.registry.register(bystander, Uuid::new_v4(), by_tx).await;

    let msg = message_from(sender);
    process_inbound_text(&state, sender, &send_message_json(receiver, &msg)).await;

    expect_event(&mut receiver_rx).await;
    expect_no_event(&mut bystander_rx).await;
}
