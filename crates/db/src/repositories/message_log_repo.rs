//! Repository for the `message_logs` table.
//!
//! The `uq_message_logs_message_medium` unique constraint on
//! `(message_id, medium)` is the storage-level claim that keeps fan-out
//! idempotent: two processor runs racing to log the same pair resolve to
//! exactly one row, and terminal transitions are guarded by
//! `status = 'pending'` so a terminal state is written exactly once.

use inbox_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::message_log::{status, MessageLog, PendingDelivery};

/// Column list for `message_logs` queries.
const COLUMNS: &str = "id, message_id, medium, status, failure_reason, created_at, updated_at";

/// Provides claim and state-transition operations for delivery logs.
pub struct MessageLogRepo;

impl MessageLogRepo {
    /// Claim a (message, medium) pair by inserting a `pending` log.
    ///
    /// Returns `true` if this call created the row; `false` if a log for the
    /// pair already exists (pending or terminal), in which case the caller
    /// must not dispatch.
    pub async fn claim(pool: &PgPool, message_id: DbId, medium: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO message_logs (message_id, medium, status) \
             VALUES ($1, $2, 'pending') \
             ON CONFLICT (message_id, medium) DO NOTHING",
        )
        .bind(message_id)
        .bind(medium)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock a batch of pending logs for dispatch, joined with the message
    /// fields needed to build payloads.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so overlapping processor runs divide
    /// the pending set between them instead of blocking or double-sending.
    /// Must run inside a transaction; the locks hold until commit.
    pub async fn lock_pending(
        conn: &mut PgConnection,
        limit: i64,
    ) -> Result<Vec<PendingDelivery>, sqlx::Error> {
        sqlx::query_as::<_, PendingDelivery>(
            "SELECT l.id AS log_id, l.message_id, l.medium, \
                    m.user_id, m.key, m.subject, m.body, m.data, m.is_hidden \
             FROM message_logs l \
             JOIN messages m ON m.id = l.message_id \
             WHERE l.status = 'pending' \
             ORDER BY l.id \
             LIMIT $1 \
             FOR UPDATE OF l SKIP LOCKED",
        )
        .bind(limit)
        .fetch_all(conn)
        .await
    }

    /// Transition a pending log to `sent`.
    pub async fn mark_sent(conn: &mut PgConnection, log_id: DbId) -> Result<bool, sqlx::Error> {
        Self::transition(conn, log_id, status::SENT, None).await
    }

    /// Transition a pending log to `failed` with a captured reason.
    pub async fn mark_failed(
        conn: &mut PgConnection,
        log_id: DbId,
        failure_reason: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::transition(conn, log_id, status::FAILED, Some(failure_reason)).await
    }

    /// Transition a pending log to `skipped` with a reason.
    pub async fn mark_skipped(
        conn: &mut PgConnection,
        log_id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::transition(conn, log_id, status::SKIPPED, Some(reason)).await
    }

    /// Guarded terminal transition. Returns `false` when the log was no
    /// longer pending (a concurrent run got there first) — the caller's
    /// outcome is then discarded rather than overwriting the audit trail.
    async fn transition(
        conn: &mut PgConnection,
        log_id: DbId,
        new_status: &str,
        failure_reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE message_logs \
             SET status = $2, failure_reason = $3, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(log_id)
        .bind(new_status)
        .bind(failure_reason)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all logs for a message, oldest first.
    pub async fn list_for_message(
        pool: &PgPool,
        message_id: DbId,
    ) -> Result<Vec<MessageLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_logs WHERE message_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, MessageLog>(&query)
            .bind(message_id)
            .fetch_all(pool)
            .await
    }

    /// Count logs for a message in a given status.
    pub async fn count_for_message_in_status(
        pool: &PgPool,
        message_id: DbId,
        log_status: &str,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM message_logs WHERE message_id = $1 AND status = $2",
        )
        .bind(message_id)
        .bind(log_status)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
