//! Message service — append-only message creation.
//!
//! DESIGN
//! ======
//! Messages are created through `append_message` and never mutated or
//! deleted. The append also refreshes the parent chat's denormalized
//! summary (`last_message`) and resets `seen_by` to the sender alone, which
//! is what flips the chat to unread for the receiver.
//!
//! CONSISTENCY
//! ===========
//! Insert-then-update, two sequential statements, deliberately without a
//! transaction. The visible order never inverts because the chat update is
//! issued only after the insert succeeds. A crash between the two leaves a
//! durable message with a stale summary; the summary is advisory, message
//! history is authoritative.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Chat absent, or the sender is not a participant. Deliberately
    /// conflated so non-participants cannot probe for chat existence.
    #[error("chat not found: {0}")]
    ChatNotFound(Uuid),
    #[error("message text must not be empty")]
    EmptyText,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A persisted chat message. Field names on the wire are camelCase to match
/// the platform's client contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// APPEND
// =============================================================================

/// Append a message to a chat on behalf of `sender_id`.
///
/// Validates before touching the store: empty (or whitespace-only) text is
/// rejected, and the sender must be a participant of an existing chat.
///
/// # Errors
///
/// `EmptyText` for blank text, `ChatNotFound` when the chat is missing or
/// the sender is not a participant, `Database` on persistence failure.
pub async fn append_message(
    pool: &PgPool,
    chat_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> Result<Message, MessageError> {
    if text.trim().is_empty() {
        return Err(MessageError::EmptyText);
    }

    let participates: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM chats WHERE id = $1 AND $2 = ANY(participant_ids)
        )",
    )
    .bind(chat_id)
    .bind(sender_id)
    .fetch_one(pool)
    .await?;

    if !participates {
        return Err(MessageError::ChatNotFound(chat_id));
    }

    let id = Uuid::new_v4();
    let created_at: OffsetDateTime = sqlx::query_scalar(
        "INSERT INTO messages (id, chat_id, sender_id, text_body)
         VALUES ($1, $2, $3, $4)
         RETURNING created_at",
    )
    .bind(id)
    .bind(chat_id)
    .bind(sender_id)
    .bind(text)
    .fetch_one(pool)
    .await?;

    // Summary update comes strictly after the insert so a reader can never
    // observe the new last_message without the message row existing.
    sqlx::query("UPDATE chats SET seen_by = ARRAY[$2], last_message = $3 WHERE id = $1")
        .bind(chat_id)
        .bind(sender_id)
        .bind(text)
        .execute(pool)
        .await?;

    tracing::info!(%chat_id, %sender_id, message_id = %id, "message appended");

    Ok(Message { id, chat_id, sender_id, text: text.to_owned(), created_at })
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
