//! Route definitions for the `/preferences` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::preferences;
use crate::state::AppState;

/// Routes mounted at `/preferences`.
///
/// ```text
/// GET    /                                   -> get_preferences
/// PUT    /                                   -> update_preferences
/// PUT    /{group_id}/{medium}                -> update_preference
///
/// GET    /token/{token}                      -> get_preferences_by_token
/// PUT    /token/{token}                      -> update_preferences_by_token
/// PUT    /token/{token}/{group_id}/{medium}  -> update_preference_by_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(preferences::get_preferences).put(preferences::update_preferences),
        )
        .route(
            "/token/{token}",
            get(preferences::get_preferences_by_token)
                .put(preferences::update_preferences_by_token),
        )
        .route(
            "/token/{token}/{group_id}/{medium}",
            put(preferences::update_preference_by_token),
        )
        .route("/{group_id}/{medium}", put(preferences::update_preference))
}
