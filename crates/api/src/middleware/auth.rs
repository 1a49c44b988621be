//! Identity extractor for Axum handlers.
//!
//! The engine sits behind a gateway that authenticates requests and
//! forwards the caller's identity in the `x-user-id` header. Handlers
//! that require an identity take [`AuthUser`]; the preference-token
//! endpoints take [`MaybeAuthUser`] because they resolve identity from
//! the token itself and only use the header for a consistency check.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use inbox_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the authenticated user id, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user identity.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))?;

        let user_id: DbId = raw
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("Invalid {USER_ID_HEADER} header")))?;

        Ok(AuthUser { user_id })
    }
}

/// Optional identity: present when the gateway forwarded a valid header,
/// absent otherwise. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
