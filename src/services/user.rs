//! User lookup — the external user-directory interface.
//!
//! The chat core never manages accounts; it only resolves a user id to the
//! public fields a chat list needs (id, display name, avatar).

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Public slice of a user record, safe to embed in chat responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

/// Resolve a user id to its public profile. `Ok(None)` when the user no
/// longer exists — callers decide whether that is an error.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn public_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<PublicProfile>, sqlx::Error> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
        "SELECT id, username, avatar FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, username, avatar)| PublicProfile { id, username, avatar }))
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
