//! In-memory app-push backend for tests and local development.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{AppPushBackend, AppPushMessage, PushOutcome};

/// Collects would-be pushes in a process-local outbox instead of calling a
/// provider. Messages without a notification key are skipped, mirroring
/// real backend behaviour.
#[derive(Debug, Default)]
pub struct LocmemAppPushBackend {
    outbox: Mutex<Vec<AppPushMessage>>,
}

impl LocmemAppPushBackend {
    /// Snapshot the messages delivered so far.
    pub fn sent(&self) -> Vec<AppPushMessage> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Drop everything collected so far.
    pub fn clear(&self) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.clear();
        }
    }
}

#[async_trait]
impl AppPushBackend for LocmemAppPushBackend {
    async fn send_messages(&self, messages: &[AppPushMessage]) -> Vec<PushOutcome> {
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            if message.notification_key.is_none() {
                outcomes.push(PushOutcome::Skipped("no notification key".to_string()));
                continue;
            }
            if let Ok(mut outbox) = self.outbox.lock() {
                outbox.push(message.clone());
            }
            outcomes.push(PushOutcome::Sent);
        }
        outcomes
    }
}
