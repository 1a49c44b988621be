//! In-memory email backend for tests and local development.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{EmailBackend, EmailError, EmailMessage};

/// Collects would-be emails in a process-local outbox.
#[derive(Default)]
pub struct LocmemEmailBackend {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl LocmemEmailBackend {
    /// Snapshot the emails delivered so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
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
impl EmailBackend for LocmemEmailBackend {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(message.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_sent_emails() {
        let backend = LocmemEmailBackend::default();
        backend
            .send(&EmailMessage {
                to: "a@example.com".to_string(),
                subject: "Hello".to_string(),
                body: "World".to_string(),
                log_id: 1,
            })
            .await
            .unwrap();

        let sent = backend.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
    }
}
