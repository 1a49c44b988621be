//! Opaque signed tokens for session-less preference access.
//!
//! An email footer or similar surface can link to the preference endpoints
//! with a token instead of a session. The token is the user id joined to an
//! HMAC-SHA256 signature of it — verifiable without storage, and resolving
//! to exactly one user identity.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CoreError;
use crate::types::DbId;

type HmacSha256 = Hmac<Sha256>;

/// Separator between the user id and its signature.
const TOKEN_SEPARATOR: char = '.';

/// Produce a preference-access token for a user: `<user_id>.<hex signature>`.
pub fn sign_user_token(user_id: DbId, secret: &[u8]) -> String {
    let signature = hex::encode(compute_signature(user_id, secret));
    format!("{user_id}{TOKEN_SEPARATOR}{signature}")
}

/// Verify a preference-access token and return the user id it names.
///
/// Fails with a validation error on a malformed token or a signature that
/// does not match (verification is constant-time via the HMAC itself).
pub fn verify_user_token(token: &str, secret: &[u8]) -> Result<DbId, CoreError> {
    let (id_part, signature_part) = token
        .split_once(TOKEN_SEPARATOR)
        .ok_or_else(|| CoreError::Validation("Malformed preference token".to_string()))?;
    let user_id: DbId = id_part
        .parse()
        .map_err(|_| CoreError::Validation("Malformed preference token".to_string()))?;
    let signature = hex::decode(signature_part)
        .ok_or_else(|| CoreError::Validation("Malformed preference token".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(id_part.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| CoreError::Validation("Invalid preference token signature".to_string()))?;

    Ok(user_id)
}

fn compute_signature(user_id: DbId, secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(user_id.to_string().as_bytes());
    mac.finalize().into_bytes().to_vec()
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or a non-hex digit.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
