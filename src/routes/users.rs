//! User-facing routes: unread notification count and public profiles.

use axum::extract::{Path, State};
use axum::response::Json;
use uuid::Uuid;

use super::ApiError;
use crate::routes::auth::AuthUser;
use crate::services::{chat, user};
use crate::state::AppState;

/// `GET /api/users/notification` — unread chat count for the caller, as a
/// bare integer. Recomputed on every call, no caching.
pub async fn notification_count(State(state): State<AppState>, auth: AuthUser) -> Result<Json<i64>, ApiError> {
    let count = chat::unread_chat_count(&state.pool, auth.user.id).await?;
    Ok(Json(count))
}

/// `GET /api/users/:id/profile` — public profile lookup.
pub async fn user_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<user::PublicProfile>, ApiError> {
    let profile = user::public_profile(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found!"))?;
    Ok(Json(profile))
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
