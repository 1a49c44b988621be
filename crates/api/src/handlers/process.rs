//! Handler for the pipeline trigger endpoint.

use axum::extract::State;
use axum::Json;
use inbox_core::config;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/v1/process
///
/// Run one fan-out pass immediately instead of waiting for the worker's
/// next tick. Returns the run's counters.
pub async fn process_now(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let summary = state.processor.process_new_messages(&config::get()).await?;
    Ok(Json(serde_json::json!({ "data": summary })))
}
