//! The engine's minimal view of a user.
//!
//! The hosting application owns the real user table; the inbox engine only
//! needs an id to key messages and preferences on, and an email address as
//! the destination for the email medium.

use inbox_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}
