//! Route definitions for the `/messages` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Routes mounted at `/messages`.
///
/// ```text
/// GET    /                -> list_messages
/// POST   /                -> create_message
/// POST   /read-all        -> mark_all_read
/// GET    /unread-count    -> unread_count
/// POST   /{id}/read       -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(messages::list_messages).post(messages::create_message))
        .route("/read-all", post(messages::mark_all_read))
        .route("/unread-count", get(messages::unread_count))
        .route("/{id}/read", post(messages::mark_read))
}
