//! Stored per-user message preferences.

use inbox_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `message_preferences` table.
///
/// `groups` holds the sparse stored override sequence as JSONB — the raw
/// storage form, not the effective/display form. Reconciliation against
/// live configuration happens in `inbox_core::preferences` on every read.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MessagePreferences {
    pub user_id: DbId,
    pub groups: serde_json::Value,
    pub updated_at: Timestamp,
}
