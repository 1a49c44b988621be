//! Unread/read state over a user's visible messages.

use std::sync::Arc;

use inbox_core::types::DbId;
use inbox_db::repositories::MessageRepo;
use inbox_db::DbPool;
use inbox_events::{EventBus, InboxEvent};

/// Tracks unread counts and drives mark-all-read, announcing every count
/// change on the event bus.
pub struct ReadStateTracker {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl ReadStateTracker {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// Current number of unread visible messages for a user.
    pub async fn unread_count(&self, user_id: DbId) -> Result<i64, sqlx::Error> {
        MessageRepo::unread_count(&self.pool, user_id).await
    }

    /// Mark one of a user's visible messages read. Idempotent; an event is
    /// published only when the message actually changed state. Returns
    /// whether it did.
    pub async fn mark_read(&self, user_id: DbId, message_id: DbId) -> Result<bool, sqlx::Error> {
        let changed = MessageRepo::mark_read(&self.pool, message_id, user_id).await?;
        if changed {
            let count = MessageRepo::unread_count(&self.pool, user_id).await?;
            self.bus.publish(InboxEvent::unread_count(user_id, count));
            tracing::debug!(user_id, message_id, "Marked message read");
        }
        Ok(changed)
    }

    /// Mark all of a user's visible messages read. Idempotent; an event is
    /// published only when at least one message actually changed state.
    pub async fn mark_all_read(&self, user_id: DbId) -> Result<u64, sqlx::Error> {
        let changed = MessageRepo::mark_all_read(&self.pool, user_id).await?;
        if changed > 0 {
            let count = MessageRepo::unread_count(&self.pool, user_id).await?;
            self.bus.publish(InboxEvent::unread_count(user_id, count));
            tracing::debug!(user_id, changed, "Marked all messages read");
        }
        Ok(changed)
    }
}
