//! Email delivery backend interface.

use async_trait::async_trait;
use inbox_core::types::DbId;

pub mod locmem;
pub mod smtp;

pub use locmem::LocmemEmailBackend;
pub use smtp::{EmailConfig, SmtpEmailBackend};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// Message type and trait
// ---------------------------------------------------------------------------

/// A plain-text email addressed to one recipient.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,

    /// The delivery log this payload was built from.
    pub log_id: DbId,
}

/// A pluggable email delivery channel.
#[async_trait]
pub trait EmailBackend: Send + Sync {
    /// Deliver one email. Unlike push, email failures surface as errors so
    /// the caller can honour its fail-silently configuration.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}
