//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`InboxEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the application; the
//! pipeline publishes unread-count changes here and consumers (websocket
//! pushers, cache invalidators) subscribe.

use chrono::{DateTime, Utc};
use inbox_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event type published whenever a user's unread count may have changed.
pub const EVENT_UNREAD_COUNT: &str = "message.unread_count";

// ---------------------------------------------------------------------------
// InboxEvent
// ---------------------------------------------------------------------------

/// A domain event emitted by the inbox engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEvent {
    /// Dot-separated event name, e.g. `"message.unread_count"`.
    pub event_type: String,

    /// The user the event concerns.
    pub user_id: DbId,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl InboxEvent {
    /// Create a new event with an empty payload.
    pub fn new(event_type: impl Into<String>, user_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            user_id,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Build the unread-count event for a user.
    ///
    /// Published after any operation that can change how many unread
    /// messages the user has (new visible messages, mark-all-read).
    pub fn unread_count(user_id: DbId, count: i64) -> Self {
        Self::new(EVENT_UNREAD_COUNT, user_id)
            .with_payload(serde_json::json!({ "unread_count": count }))
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`InboxEvent`].
pub struct EventBus {
    sender: broadcast::Sender<InboxEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: InboxEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
