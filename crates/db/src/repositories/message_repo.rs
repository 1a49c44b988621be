//! Repository for the `messages` table.

use inbox_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message};

/// Column list for `messages` queries.
const COLUMNS: &str = "id, user_id, key, subject, body, data, send_at, is_read, read_at, \
    is_hidden, is_logged, created_at, updated_at, deleted_at";

/// Visibility filter shared by every read-path query.
///
/// The `is_logged` clause keeps a message out of the inbox until the fan-out
/// pipeline has finished logging it, so list output and delivery are
/// consistent.
const VISIBLE: &str =
    "send_at <= NOW() AND is_hidden = false AND is_logged = true AND deleted_at IS NULL";

/// Provides CRUD and read-state operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Create a message, returning the generated ID.
    pub async fn create(pool: &PgPool, input: &CreateMessage) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO messages (user_id, key, subject, body, data, send_at, is_hidden) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()), COALESCE($7, false)) \
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(&input.key)
        .bind(&input.subject)
        .bind(&input.body)
        .bind(&input.data)
        .bind(input.send_at)
        .bind(input.is_hidden)
        .fetch_one(pool)
        .await
    }

    /// Fetch a message by id regardless of visibility.
    pub async fn find_by_id(pool: &PgPool, message_id: DbId) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&query)
            .bind(message_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's visible messages, newest first.
    pub async fn list_visible(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE user_id = $1 AND {VISIBLE} \
             ORDER BY send_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Get the number of unread visible messages for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM messages WHERE user_id = $1 AND is_read = false AND {VISIBLE}"
        );
        let count: Option<i64> = sqlx::query_scalar(&query).bind(user_id).fetch_one(pool).await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark a single visible message as read, scoped to its owner.
    ///
    /// Idempotent: returns `true` only when the message actually changed
    /// state. An already-read, invisible, or foreign message is untouched.
    pub async fn mark_read(
        pool: &PgPool,
        message_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE messages \
             SET is_read = true, read_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND is_read = false AND {VISIBLE}"
        );
        let result = sqlx::query(&query)
            .bind(message_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a user's visible messages as read.
    ///
    /// Idempotent: already-read messages are untouched. Returns the number
    /// of messages that actually changed state.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE messages \
             SET is_read = true, read_at = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND is_read = false AND {VISIBLE}"
        );
        let result = sqlx::query(&query).bind(user_id).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Select messages that are due for fan-out: `send_at` has passed and
    /// logging has not completed. Ordered oldest-due first.
    pub async fn list_unprocessed(pool: &PgPool, limit: i64) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE is_logged = false AND deleted_at IS NULL AND send_at <= NOW() \
             ORDER BY send_at, id \
             LIMIT $1"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Flip `is_logged` for the given messages, but only where no pending
    /// log remains — a message with an unfinished medium stays eligible for
    /// reprocessing. Returns the ids actually flipped.
    pub async fn mark_logged_if_complete(
        pool: &PgPool,
        message_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE messages m \
             SET is_logged = true, updated_at = NOW() \
             WHERE m.id = ANY($1) AND m.is_logged = false \
               AND NOT EXISTS (\
                   SELECT 1 FROM message_logs l \
                   WHERE l.message_id = m.id AND l.status = 'pending') \
             RETURNING m.id",
        )
        .bind(message_ids)
        .fetch_all(pool)
        .await
    }

    /// Soft-delete a message. Returns `true` if a live row was found.
    pub async fn soft_delete(pool: &PgPool, message_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
