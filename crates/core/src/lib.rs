//! Domain logic for the inbox message delivery engine.
//!
//! This crate has no internal dependencies so it can be used by the
//! repository layer, the fan-out pipeline, the worker binary, and the API
//! boundary alike:
//!
//! - [`config`] — built-in configuration defaults, deep merge, and the
//!   process-wide cached message-group registry.
//! - [`preferences`] — the layered per-user preference model (defaults plus
//!   sparse stored overrides, reconciled against live configuration).
//! - [`mediums`] — delivery medium identifier constants.
//! - [`signing`] — opaque signed tokens for session-less preference access.

pub mod config;
pub mod error;
pub mod mediums;
pub mod preferences;
pub mod signing;
pub mod types;

pub use config::{InboxConfig, MessageGroup};
pub use error::CoreError;
