use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: inbox_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus carrying unread-count announcements.
    pub event_bus: Arc<inbox_events::EventBus>,
    /// Fan-out processor, exposed through the trigger endpoint.
    pub processor: Arc<inbox_pipeline::Processor>,
    /// Unread/read state over the message store.
    pub read_state: Arc<inbox_pipeline::ReadStateTracker>,
}
