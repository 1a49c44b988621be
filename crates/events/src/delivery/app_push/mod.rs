//! App-push delivery backend interface and registry.
//!
//! A backend receives a batch of [`AppPushMessage`]s and returns one
//! [`PushOutcome`] per message, in order. Backends never touch storage:
//! the caller maps outcomes onto delivery-log transitions and decides
//! whether a destination key must be evicted.

use std::sync::Arc;

use async_trait::async_trait;
use inbox_core::config::{BACKEND_FCM, BACKEND_LOCMEM};
use inbox_core::types::DbId;
use inbox_core::CoreError;

pub mod fcm;
pub mod locmem;

pub use fcm::{FcmBackend, FcmConfig};
pub use locmem::LocmemAppPushBackend;

// ---------------------------------------------------------------------------
// Message and outcome types
// ---------------------------------------------------------------------------

/// A push payload addressed to one user's device group.
#[derive(Debug, Clone)]
pub struct AppPushMessage {
    /// The recipient's notification key, if they have one registered.
    /// Backends skip messages without a key.
    pub notification_key: Option<String>,

    /// Notification title. Empty title and body produce a silent
    /// (data-only) push.
    pub title: String,

    /// Notification body text.
    pub body: String,

    /// Structured payload forwarded as push data.
    pub data: Option<serde_json::Value>,

    /// The delivery log this payload was built from; echoed back so the
    /// caller can correlate outcomes.
    pub log_id: DbId,
}

impl AppPushMessage {
    /// Whether this is a silent data-only push (no visible notification).
    pub fn is_silent(&self) -> bool {
        self.title.is_empty() && self.body.is_empty()
    }
}

/// The result of attempting one push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The provider accepted the message.
    Sent,

    /// The backend did not attempt delivery (e.g. no notification key).
    Skipped(String),

    /// Delivery failed. `unregistered` is set when the provider reported
    /// the destination key permanently invalid — the caller must evict it.
    Failed { reason: String, unregistered: bool },
}

impl PushOutcome {
    /// Failure that leaves the destination key intact.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            unregistered: false,
        }
    }

    /// Failure that invalidates the destination key.
    pub fn unregistered(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            unregistered: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Backend trait and registry
// ---------------------------------------------------------------------------

/// A pluggable app-push delivery channel.
#[async_trait]
pub trait AppPushBackend: Send + Sync + std::fmt::Debug {
    /// Attempt delivery of a batch, returning one outcome per message in
    /// the same order. Implementations must not panic on provider errors;
    /// failures are reported as [`PushOutcome::Failed`].
    async fn send_messages(&self, messages: &[AppPushMessage]) -> Vec<PushOutcome>;
}

/// Construct the app-push backend selected by configuration.
///
/// `name` must be one of the known backend identifiers; configuration
/// validation rejects anything else up front, so an unknown name here
/// means the caller bypassed [`inbox_core::config::InboxConfig::resolve`].
pub fn create_app_push_backend(name: &str) -> Result<Arc<dyn AppPushBackend>, CoreError> {
    match name {
        BACKEND_LOCMEM => Ok(Arc::new(LocmemAppPushBackend::default())),
        BACKEND_FCM => {
            let config = FcmConfig::from_env().ok_or_else(|| {
                CoreError::Validation(
                    "fcm backend selected but FCM_PROJECT_ID is not set".to_string(),
                )
            })?;
            Ok(Arc::new(FcmBackend::new(config)))
        }
        other => Err(CoreError::Validation(format!(
            "unknown app_push backend '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
