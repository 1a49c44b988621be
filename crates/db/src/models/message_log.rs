//! Message delivery log models.
//!
//! One row per (message, medium) delivery attempt. Rows are created in the
//! `pending` state when the fan-out pipeline resolves a medium as
//! applicable, transition to exactly one terminal state, and are never
//! deleted — they are the audit trail of every delivery attempt.

use inbox_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Log status values. `sent`, `failed`, and `skipped` are terminal; a log in
/// a terminal state is never re-dispatched.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const SENT: &str = "sent";
    pub const FAILED: &str = "failed";
    pub const SKIPPED: &str = "skipped";
}

/// A row from the `message_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessageLog {
    pub id: DbId,
    pub message_id: DbId,
    pub medium: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A pending log joined with the message fields the dispatch phase needs to
/// build a medium-specific payload.
#[derive(Debug, Clone, FromRow)]
pub struct PendingDelivery {
    pub log_id: DbId,
    pub message_id: DbId,
    pub medium: String,
    pub user_id: DbId,
    pub key: String,
    pub subject: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    /// Carried so completion events can exclude hidden messages' owners.
    pub is_hidden: bool,
}
