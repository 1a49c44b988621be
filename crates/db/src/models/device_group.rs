//! Push destination state for a user's devices.

use inbox_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `device_groups` table.
///
/// `notification_key` is the provider-issued destination token for the
/// user's device group. It is cleared to NULL when the provider reports the
/// key as permanently invalid, so dead tokens evict themselves.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceGroup {
    pub user_id: DbId,
    pub notification_key: Option<String>,
    pub notification_key_name: Option<String>,
    pub updated_at: Timestamp,
}
