//! Message REST surface.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::routes::auth::AuthUser;
use crate::services::message::{self, Message};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddMessageBody {
    pub text: String,
}

/// `POST /api/messages/:chat_id` — append a message to a chat. The durable
/// write happens here; the realtime push is a separate client-initiated
/// event over the websocket.
pub async fn add_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<AddMessageBody>,
) -> Result<Json<Message>, ApiError> {
    let message = message::append_message(&state.pool, chat_id, auth.user.id, &body.text).await?;
    Ok(Json(message))
}

#[cfg(test)]
#[path = "messages_test.rs"]
mod tests;
