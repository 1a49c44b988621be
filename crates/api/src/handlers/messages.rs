//! Handlers for the `/messages` resource.
//!
//! Listing and read-state endpoints operate on the authenticated user's
//! visible messages. Creation is a trusted, service-to-service call: the
//! payload names the recipient and the fan-out worker picks the message
//! up on its next run.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inbox_core::error::CoreError;
use inbox_db::models::message::CreateMessage;
use inbox_db::repositories::{MessageRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /messages`.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for message listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for message listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/messages
///
/// List the authenticated user's visible messages, newest first.
pub async fn list_messages(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MessageQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let messages = MessageRepo::list_visible(&state.pool, auth.user_id, limit, offset).await?;

    Ok(Json(serde_json::json!({ "data": messages })))
}

/// POST /api/v1/messages
///
/// Create a message for a user. Returns 201 with the new id; the message
/// stays invisible until the pipeline finishes fanning it out.
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateMessage>,
) -> AppResult<impl IntoResponse> {
    if payload.key.trim().is_empty() {
        return Err(AppError::BadRequest("key must not be empty".to_string()));
    }
    if UserRepo::find_by_id(&state.pool, payload.user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: payload.user_id,
        }));
    }

    let id = MessageRepo::create(&state.pool, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": { "id": id } })),
    ))
}

/// POST /api/v1/messages/{id}/read
///
/// Mark one of the authenticated user's messages as read. Idempotent:
/// re-reading an already-read message is a no-op. Returns the message.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let found = MessageRepo::find_by_id(&state.pool, message_id).await?;
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Message",
            id: message_id,
        })
    };
    let message = found.ok_or_else(not_found)?;
    if message.user_id != auth.user_id || message.deleted_at.is_some() {
        return Err(not_found());
    }

    state.read_state.mark_read(auth.user_id, message_id).await?;

    let message = MessageRepo::find_by_id(&state.pool, message_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(serde_json::json!({ "data": message })))
}

/// POST /api/v1/messages/read-all
///
/// Mark all of the authenticated user's visible messages as read.
/// Returns the number of messages that changed state.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = state.read_state.mark_all_read(auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

/// GET /api/v1/messages/unread-count
///
/// Current number of unread visible messages for the authenticated user.
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = state.read_state.unread_count(auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "unread_count": count }
    })))
}
