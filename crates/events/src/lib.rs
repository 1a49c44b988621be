//! Inbox event bus and delivery backends.
//!
//! This crate provides the notification infrastructure around the message
//! pipeline:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, used to announce unread-count changes.
//! - [`InboxEvent`] — the canonical event envelope.
//! - [`delivery`] — pluggable delivery backends for the dispatchable
//!   mediums (app push, email), selected by name from configuration.

pub mod bus;
pub mod delivery;

pub use bus::{EventBus, InboxEvent};
pub use delivery::app_push::{AppPushBackend, AppPushMessage, PushOutcome};
pub use delivery::email::{EmailBackend, EmailError, EmailMessage};
