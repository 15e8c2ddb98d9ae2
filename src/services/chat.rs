//! Chat service — two-party conversations, seen tracking, unread counts.
//!
//! DESIGN
//! ======
//! A chat binds exactly two participants for its whole lifetime. `seen_by`
//! tracks which of them have observed the chat's current state, and it is
//! mutated through two intentionally different operations:
//!
//! - `get_chat` *appends* the viewer (passive observation adds the caller),
//! - `mark_chat_read` *replaces* the set with the caller alone.
//!
//! The unread counter depends on which of the two fires when, so they are
//! kept as distinct operations rather than unified.
//!
//! ERROR HANDLING
//! ==============
//! A non-participant asking for a chat gets the same `NotFound` as asking
//! for a chat that does not exist; participation is never leaked.

use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::message::Message;
use crate::services::user::{self, PublicProfile};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Chat absent or the caller is not a participant (conflated).
    #[error("chat not found: {0}")]
    NotFound(Uuid),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A chat row. Wire field names are camelCase per the client contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub seen_by: Vec<Uuid>,
    pub last_message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Chat augmented with the other participant's public profile for list
/// views. `receiver` is `None` when the other user no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct ChatWithReceiver {
    #[serde(flatten)]
    pub chat: Chat,
    pub receiver: Option<PublicProfile>,
}

/// Chat with its full ordered message history.
#[derive(Debug, Clone, Serialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: Chat,
    pub messages: Vec<Message>,
}

/// The participant of `chat` that is not `user_id`, if any.
#[must_use]
pub fn other_participant(participant_ids: &[Uuid], user_id: Uuid) -> Option<Uuid> {
    participant_ids.iter().copied().find(|id| *id != user_id)
}

type ChatTuple = (Uuid, Vec<Uuid>, Vec<Uuid>, Option<String>, OffsetDateTime);

fn chat_from_tuple((id, participant_ids, seen_by, last_message, created_at): ChatTuple) -> Chat {
    Chat { id, participant_ids, seen_by, last_message, created_at }
}

// =============================================================================
// QUERIES
// =============================================================================

/// List every chat the user participates in, newest first, each augmented
/// with the other participant's public profile. A missing receiver degrades
/// silently to `None` instead of failing the whole call.
///
/// # Errors
///
/// Returns a database error if any query fails.
pub async fn list_chats_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ChatWithReceiver>, ChatError> {
    let rows = sqlx::query_as::<_, ChatTuple>(
        "SELECT id, participant_ids, seen_by, last_message, created_at
         FROM chats
         WHERE $1 = ANY(participant_ids)
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let chat = chat_from_tuple(row);
        let receiver = match other_participant(&chat.participant_ids, user_id) {
            Some(other_id) => user::public_profile(pool, other_id).await?,
            None => None,
        };
        out.push(ChatWithReceiver { chat, receiver });
    }
    Ok(out)
}

/// Fetch one chat with its messages in `(created_at, id)` ascending order,
/// restricted to participants. Observing the chat marks it seen: the
/// requester is appended to `seen_by` if absent.
///
/// # Errors
///
/// `NotFound` when the chat is missing or the requester is not a
/// participant, `Database` on persistence failure.
pub async fn get_chat(pool: &PgPool, chat_id: Uuid, requester_id: Uuid) -> Result<ChatWithMessages, ChatError> {
    let row = sqlx::query_as::<_, ChatTuple>(
        "SELECT id, participant_ids, seen_by, last_message, created_at
         FROM chats
         WHERE id = $1 AND $2 = ANY(participant_ids)",
    )
    .bind(chat_id)
    .bind(requester_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ChatError::NotFound(chat_id))?;

    let chat = chat_from_tuple(row);

    let messages = sqlx::query_as::<_, (Uuid, Uuid, Uuid, String, OffsetDateTime)>(
        "SELECT id, chat_id, sender_id, text_body, created_at
         FROM messages
         WHERE chat_id = $1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(id, chat_id, sender_id, text, created_at)| Message { id, chat_id, sender_id, text, created_at })
    .collect();

    // Atomic append, idempotent: the guard keeps seen_by duplicate-free so
    // repeated views by the same user cannot grow the array.
    sqlx::query(
        "UPDATE chats SET seen_by = array_append(seen_by, $2)
         WHERE id = $1 AND NOT ($2 = ANY(seen_by))",
    )
    .bind(chat_id)
    .bind(requester_id)
    .execute(pool)
    .await?;

    Ok(ChatWithMessages { chat, messages })
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Create a new chat between the initiator and the receiver.
///
/// No dedupe against an existing chat for the same pair: each call creates
/// a fresh thread, matching the platform's current semantics.
///
/// # Errors
///
/// `InvalidArgument` when initiator and receiver are the same user,
/// `Database` on persistence failure (including a missing receiver if the
/// store enforces referential integrity).
pub async fn create_chat(pool: &PgPool, initiator_id: Uuid, receiver_id: Uuid) -> Result<Chat, ChatError> {
    if initiator_id == receiver_id {
        return Err(ChatError::InvalidArgument("cannot open a chat with yourself".into()));
    }

    let id = Uuid::new_v4();
    let created_at: OffsetDateTime = sqlx::query_scalar(
        "INSERT INTO chats (id, participant_ids) VALUES ($1, $2) RETURNING created_at",
    )
    .bind(id)
    .bind(vec![initiator_id, receiver_id])
    .fetch_one(pool)
    .await?;

    tracing::info!(chat_id = %id, %initiator_id, %receiver_id, "chat created");

    Ok(Chat {
        id,
        participant_ids: vec![initiator_id, receiver_id],
        seen_by: Vec::new(),
        last_message: None,
        created_at,
    })
}

/// Explicitly mark a chat read: `seen_by` is *replaced* with the caller
/// alone, removing any prior members. Participants only.
///
/// # Errors
///
/// `NotFound` when the chat is missing or the caller is not a participant,
/// `Database` on persistence failure.
pub async fn mark_chat_read(pool: &PgPool, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ChatError> {
    let row = sqlx::query_as::<_, ChatTuple>(
        "UPDATE chats SET seen_by = ARRAY[$2]
         WHERE id = $1 AND $2 = ANY(participant_ids)
         RETURNING id, participant_ids, seen_by, last_message, created_at",
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ChatError::NotFound(chat_id))?;

    Ok(chat_from_tuple(row))
}

// =============================================================================
// NOTIFICATION COUNTER
// =============================================================================

/// Number of chats where the user participates but has not seen the current
/// state. Recomputed fresh on every call; correctness rides on the store's
/// read consistency, no extra synchronization.
///
/// # Errors
///
/// Returns a database error if the count query fails.
pub async fn unread_chat_count(pool: &PgPool, user_id: Uuid) -> Result<i64, ChatError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chats
         WHERE $1 = ANY(participant_ids) AND NOT ($1 = ANY(seen_by))",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
