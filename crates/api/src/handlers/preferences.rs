//! Handlers for the `/preferences` resource.
//!
//! Preferences read as the live configuration's groups with the user's
//! sparse stored overrides merged in; writes only ever persist the
//! overrides. Each endpoint exists in two flavours: header-authenticated,
//! and token-addressed (`/token/{token}`) for session-less surfaces like
//! email footers. When a token request also carries an authenticated
//! identity, the two must agree.

use axum::extract::{Path, State};
use axum::Json;
use inbox_core::config;
use inbox_core::error::CoreError;
use inbox_core::preferences::{
    apply_groups_update, apply_single_update, effective_groups, EffectiveGroup,
};
use inbox_core::signing::verify_user_token;
use inbox_core::types::DbId;
use inbox_db::repositories::MessagePreferencesRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Resolve a preference token to a user id, enforcing that any
/// header-forwarded identity matches the token's subject.
fn resolve_token_user(
    state: &AppState,
    token: &str,
    maybe_auth: MaybeAuthUser,
) -> Result<DbId, AppError> {
    let user_id = verify_user_token(token, &state.config.signing_secret)?;
    if let MaybeAuthUser(Some(auth)) = maybe_auth {
        if auth.user_id != user_id {
            return Err(AppError::Core(CoreError::Forbidden(
                "Preference token does not belong to the authenticated user".to_string(),
            )));
        }
    }
    Ok(user_id)
}

async fn load_effective(state: &AppState, user_id: DbId) -> Result<Vec<EffectiveGroup>, AppError> {
    let stored = MessagePreferencesRepo::get_groups(&state.pool, user_id).await?;
    Ok(effective_groups(&config::get(), &stored))
}

async fn apply_bulk(
    state: &AppState,
    user_id: DbId,
    incoming: &[serde_json::Value],
) -> Result<Vec<EffectiveGroup>, AppError> {
    let resolved = config::get();
    let mut stored = MessagePreferencesRepo::get_groups(&state.pool, user_id).await?;
    apply_groups_update(&resolved, &mut stored, incoming);
    MessagePreferencesRepo::save_groups(&state.pool, user_id, &stored).await?;
    Ok(effective_groups(&resolved, &stored))
}

async fn apply_targeted(
    state: &AppState,
    user_id: DbId,
    group_id: &str,
    medium: &str,
    value: bool,
) -> Result<EffectiveGroup, AppError> {
    let resolved = config::get();
    let mut stored = MessagePreferencesRepo::get_groups(&state.pool, user_id).await?;
    apply_single_update(&resolved, &mut stored, group_id, medium, value)?;
    MessagePreferencesRepo::save_groups(&state.pool, user_id, &stored).await?;

    let group = effective_groups(&resolved, &stored)
        .into_iter()
        .find(|g| g.id == group_id)
        .ok_or_else(|| {
            AppError::InternalError(format!("group '{group_id}' vanished after update"))
        })?;
    Ok(group)
}

// ---------------------------------------------------------------------------
// Authenticated endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/preferences
///
/// The authenticated user's effective preference groups, in configuration
/// order.
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let groups = load_effective(&state, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "results": groups })))
}

/// PUT /api/v1/preferences
///
/// Bulk preference update. Unknown group ids and mediums in the payload
/// are dropped silently; the response is the full effective list after
/// the update.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(incoming): Json<Vec<serde_json::Value>>,
) -> AppResult<Json<serde_json::Value>> {
    let groups = apply_bulk(&state, auth.user_id, &incoming).await?;
    Ok(Json(serde_json::json!({ "results": groups })))
}

/// PUT /api/v1/preferences/{group_id}/{medium}
///
/// Targeted single-value update. Unlike bulk mode, an unknown group or
/// medium is a 400.
pub async fn update_preference(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((group_id, medium)): Path<(String, String)>,
    Json(value): Json<bool>,
) -> AppResult<Json<serde_json::Value>> {
    let group = apply_targeted(&state, auth.user_id, &group_id, &medium, value).await?;
    Ok(Json(serde_json::json!({ "data": group })))
}

// ---------------------------------------------------------------------------
// Token-addressed endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/preferences/token/{token}
pub async fn get_preferences_by_token(
    maybe_auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = resolve_token_user(&state, &token, maybe_auth)?;
    let groups = load_effective(&state, user_id).await?;
    Ok(Json(serde_json::json!({ "results": groups })))
}

/// PUT /api/v1/preferences/token/{token}
pub async fn update_preferences_by_token(
    maybe_auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(incoming): Json<Vec<serde_json::Value>>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = resolve_token_user(&state, &token, maybe_auth)?;
    let groups = apply_bulk(&state, user_id, &incoming).await?;
    Ok(Json(serde_json::json!({ "results": groups })))
}

/// PUT /api/v1/preferences/token/{token}/{group_id}/{medium}
pub async fn update_preference_by_token(
    maybe_auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path((token, group_id, medium)): Path<(String, String, String)>,
    Json(value): Json<bool>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = resolve_token_user(&state, &token, maybe_auth)?;
    let group = apply_targeted(&state, user_id, &group_id, &medium, value).await?;
    Ok(Json(serde_json::json!({ "data": group })))
}
