//! Chat REST surface.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::routes::auth::AuthUser;
use crate::services::chat::{self, Chat, ChatWithMessages, ChatWithReceiver};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatBody {
    pub receiver_id: Option<Uuid>,
}

/// `GET /api/chats` — list the caller's chats with receiver info.
pub async fn list_chats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatWithReceiver>>, ApiError> {
    let chats = chat::list_chats_for_user(&state.pool, auth.user.id).await?;
    Ok(Json(chats))
}

/// `GET /api/chats/:id` — one chat with ordered messages. Side effect:
/// marks the chat seen by the caller (append semantics).
pub async fn get_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatWithMessages>, ApiError> {
    let chat = chat::get_chat(&state.pool, chat_id, auth.user.id).await?;
    Ok(Json(chat))
}

/// `POST /api/chats` — open a new chat with the given receiver.
pub async fn create_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateChatBody>,
) -> Result<Json<Chat>, ApiError> {
    let Some(receiver_id) = body.receiver_id else {
        return Err(ApiError::bad_request("receiverId is required"));
    };

    let chat = chat::create_chat(&state.pool, auth.user.id, receiver_id).await?;
    Ok(Json(chat))
}

/// `PUT /api/chats/read/:id` — explicit mark-read. Resets `seenBy` to the
/// caller alone (replace semantics, unlike the passive view above).
pub async fn read_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Chat>, ApiError> {
    let chat = chat::mark_chat_read(&state.pool, chat_id, auth.user.id).await?;
    Ok(Json(chat))
}

#[cfg(test)]
#[path = "chats_test.rs"]
mod tests;
