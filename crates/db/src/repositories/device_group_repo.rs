//! Repository for the `device_groups` table.

use inbox_core::types::DbId;
use sqlx::PgPool;

use crate::models::device_group::DeviceGroup;

/// Column list for `device_groups` queries.
const COLUMNS: &str = "user_id, notification_key, notification_key_name, updated_at";

/// Provides access to a user's current push destination.
pub struct DeviceGroupRepo;

impl DeviceGroupRepo {
    /// Fetch the device group for a user.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<DeviceGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_groups WHERE user_id = $1");
        sqlx::query_as::<_, DeviceGroup>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch just the notification key, flattening "no row" and "row with
    /// NULL key" to `None` — both mean the user has no push destination.
    pub async fn get_notification_key(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let key: Option<Option<String>> =
            sqlx::query_scalar("SELECT notification_key FROM device_groups WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(key.flatten())
    }

    /// Set (or replace) the notification key for a user.
    pub async fn upsert_key(
        pool: &PgPool,
        user_id: DbId,
        notification_key: &str,
        notification_key_name: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO device_groups (user_id, notification_key, notification_key_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                notification_key = EXCLUDED.notification_key, \
                notification_key_name = EXCLUDED.notification_key_name, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(notification_key)
        .bind(notification_key_name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Clear a user's notification key after the provider reports it
    /// permanently invalid. Returns `true` if a key was actually cleared.
    pub async fn clear_notification_key(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE device_groups \
             SET notification_key = NULL, updated_at = NOW() \
             WHERE user_id = $1 AND notification_key IS NOT NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
