//! Repository for the `message_preferences` table.

use inbox_core::preferences::StoredGroup;
use inbox_core::types::DbId;
use sqlx::PgPool;

/// Provides access to the sparse stored preference overrides, one row per
/// user, last write wins.
pub struct MessagePreferencesRepo;

impl MessagePreferencesRepo {
    /// Load the stored override sequence for a user.
    ///
    /// A user with no row yet has no overrides — an empty sequence, from
    /// which the preference model synthesizes pure defaults.
    pub async fn get_groups(pool: &PgPool, user_id: DbId) -> Result<Vec<StoredGroup>, sqlx::Error> {
        let groups: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT groups FROM message_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        match groups {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| sqlx::Error::Decode(Box::new(e))),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full stored override sequence for a user.
    pub async fn save_groups(
        pool: &PgPool,
        user_id: DbId,
        groups: &[StoredGroup],
    ) -> Result<(), sqlx::Error> {
        let value = serde_json::to_value(groups).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "INSERT INTO message_preferences (user_id, groups) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                groups = EXCLUDED.groups, \
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }
}
