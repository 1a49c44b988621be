pub mod health;
pub mod messages;
pub mod preferences;
pub mod process;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /messages                                 list (GET), create (POST)
/// /messages/read-all                        mark all read (POST)
/// /messages/unread-count                    unread count (GET)
///
/// /preferences                              effective groups (GET), bulk update (PUT)
/// /preferences/{group_id}/{medium}          targeted update (PUT)
/// /preferences/token/{token}                token-addressed GET / PUT
/// /preferences/token/{token}/{group_id}/{medium}  token-addressed targeted PUT
///
/// /process                                  run one fan-out pass (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/messages", messages::router())
        .nest("/preferences", preferences::router())
        .nest("/process", process::router())
}
