//! Message entity models and DTOs.

use inbox_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `messages` table.
///
/// A message is visible to read APIs only when `send_at <= now`,
/// `is_hidden = false`, `is_logged = true`, and `deleted_at IS NULL`.
/// Messages are soft-deleted, never removed from the primary read path.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub user_id: DbId,

    /// Identifies which message-group template this message instantiates.
    pub key: String,

    pub subject: String,
    pub body: String,

    /// Optional structured payload forwarded to the push medium.
    pub data: Option<serde_json::Value>,

    /// Messages are invisible (and not fanned out) until this is due.
    pub send_at: Timestamp,

    pub is_read: bool,
    pub read_at: Option<Timestamp>,

    /// Hidden messages never surface in the inbox but still fan out
    /// (e.g. silent data pushes).
    pub is_hidden: bool,

    /// Set once fan-out logging for the message is complete.
    pub is_logged: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// DTO for creating a message.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub user_id: DbId,
    pub key: String,
    pub subject: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    /// Defaults to now (immediately due).
    pub send_at: Option<Timestamp>,
    /// Defaults to `false`.
    pub is_hidden: Option<bool>,
}
