//! Entity models and DTOs, one module per table.

pub mod device_group;
pub mod message;
pub mod message_log;
pub mod message_preferences;
pub mod user;
