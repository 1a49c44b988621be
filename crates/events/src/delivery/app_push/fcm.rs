//! App-push delivery via Firebase Cloud Messaging (HTTP v1).
//!
//! [`FcmBackend`] POSTs one request per message to the FCM `messages:send`
//! endpoint. Provider error codes are classified into outcomes: an
//! `UNREGISTERED` destination is reported back as permanently invalid so
//! the caller can evict the stored key, while auth, sender-mismatch, and
//! quota errors fail the message without touching the key.

use std::time::Duration;

use async_trait::async_trait;

use super::{AppPushBackend, AppPushMessage, PushOutcome};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default FCM HTTP v1 API base.
const DEFAULT_API_BASE: &str = "https://fcm.googleapis.com/v1";

/// Provider error code meaning the destination token no longer exists.
const ERROR_UNREGISTERED: &str = "UNREGISTERED";

// ---------------------------------------------------------------------------
// FcmConfig
// ---------------------------------------------------------------------------

/// Configuration for the FCM backend.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// Firebase project id, used in the request path.
    pub project_id: String,
    /// OAuth2 bearer token. When absent the request is sent without an
    /// `Authorization` header (for proxy setups that inject their own).
    pub access_token: Option<String>,
    /// API base URL, overridable for tests and emulators.
    pub api_base: String,
}

impl FcmConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `FCM_PROJECT_ID` is not set, signalling that the
    /// FCM backend is not configured.
    ///
    /// | Variable           | Required | Default                          |
    /// |--------------------|----------|----------------------------------|
    /// | `FCM_PROJECT_ID`   | yes      | —                                |
    /// | `FCM_ACCESS_TOKEN` | no       | —                                |
    /// | `FCM_API_BASE`     | no       | `https://fcm.googleapis.com/v1`  |
    pub fn from_env() -> Option<Self> {
        let project_id = std::env::var("FCM_PROJECT_ID").ok()?;
        Some(Self {
            project_id,
            access_token: std::env::var("FCM_ACCESS_TOKEN").ok(),
            api_base: std::env::var("FCM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Payload construction
// ---------------------------------------------------------------------------

/// Build the FCM v1 request body for one message.
///
/// Data values are stringified because FCM only accepts string-to-string
/// data maps. Silent messages carry no `notification` block and set the
/// APNs `content-available` flag instead.
fn build_payload(message: &AppPushMessage, notification_key: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "message": {
            "token": notification_key,
        }
    });

    if message.is_silent() {
        body["message"]["apns"] = serde_json::json!({
            "payload": { "aps": { "content-available": 1 } }
        });
    } else {
        body["message"]["notification"] = serde_json::json!({
            "title": message.title,
            "body": message.body,
        });
    }

    if let Some(serde_json::Value::Object(data)) = &message.data {
        let stringified: serde_json::Map<String, serde_json::Value> = data
            .iter()
            .map(|(k, v)| {
                let s = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), serde_json::Value::String(s))
            })
            .collect();
        body["message"]["data"] = serde_json::Value::Object(stringified);
    }

    body
}

/// Map a non-success provider response onto an outcome.
///
/// The v1 error body nests the code under `error.details[].errorCode`
/// (type `FcmError`) with a coarser `error.status` beside it; either may
/// carry `UNREGISTERED`.
fn classify_error(status: u16, body: &str) -> PushOutcome {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let error_code = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        if let Some(details) = error.get("details").and_then(|d| d.as_array()) {
            for detail in details {
                if let Some(code) = detail.get("errorCode").and_then(|c| c.as_str()) {
                    return Some(code.to_string());
                }
            }
        }
        error
            .get("status")
            .and_then(|s| s.as_str())
            .map(String::from)
    });

    match error_code.as_deref() {
        Some(ERROR_UNREGISTERED) => {
            PushOutcome::unregistered(format!("fcm returned HTTP {status}: UNREGISTERED"))
        }
        Some(code) => PushOutcome::failed(format!("fcm returned HTTP {status}: {code}")),
        None => PushOutcome::failed(format!("fcm returned HTTP {status}")),
    }
}

// ---------------------------------------------------------------------------
// FcmBackend
// ---------------------------------------------------------------------------

/// Delivers app pushes through the FCM HTTP v1 API.
#[derive(Debug)]
pub struct FcmBackend {
    config: FcmConfig,
    client: reqwest::Client,
}

impl FcmBackend {
    pub fn new(config: FcmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/projects/{}/messages:send",
            self.config.api_base, self.config.project_id
        )
    }

    async fn send_one(&self, message: &AppPushMessage, notification_key: &str) -> PushOutcome {
        let payload = build_payload(message, notification_key);

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => PushOutcome::Sent,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                let outcome = classify_error(status, &body);
                tracing::warn!(log_id = message.log_id, status, "FCM delivery failed");
                outcome
            }
            Err(e) => {
                tracing::warn!(log_id = message.log_id, error = %e, "FCM request error");
                PushOutcome::failed(format!("fcm request error: {e}"))
            }
        }
    }
}

#[async_trait]
impl AppPushBackend for FcmBackend {
    async fn send_messages(&self, messages: &[AppPushMessage]) -> Vec<PushOutcome> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            match &message.notification_key {
                None => outcomes.push(PushOutcome::Skipped("no notification key".to_string())),
                Some(key) => outcomes.push(self.send_one(message, key).await),
            }
        }
        outcomes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
