//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the chat REST surface and the websocket gateway under a single
//! Axum router. Every error leaving a handler is rendered as a status code
//! plus a JSON `{"message": ...}` body, matching what the platform's client
//! already parses.

pub mod auth;
pub mod chats;
pub mod messages;
pub mod users;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::chat::ChatError;
use crate::services::message::MessageError;
use crate::state::AppState;

// =============================================================================
// API ERROR
// =============================================================================

/// Structured error returned by REST handlers: status class plus message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "message": self.message }))).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotFound(_) => Self::not_found("Chat not found!"),
            ChatError::InvalidArgument(msg) => Self::bad_request(msg),
            ChatError::Database(e) => {
                tracing::error!(error = %e, "chat database error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<MessageError> for ApiError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::ChatNotFound(_) => Self::not_found("Chat not found!"),
            MessageError::EmptyText => Self::bad_request("text is required"),
            MessageError::Database(e) => {
                tracing::error!(error = %e, "message database error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/ws-ticket", post(auth::ws_ticket))
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/api/chats/{id}", get(chats::get_chat))
        .route("/api/chats/read/{id}", put(chats::read_chat))
        .route("/api/messages/{chat_id}", post(messages::add_message))
        .route("/api/users/notification", get(users::notification_count))
        .route("/api/users/{id}/profile", get(users::user_profile))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
