//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. The exceptions are the
//! `MessageLogRepo` claim/terminal-transition methods, which accept
//! `&mut PgConnection` so the dispatch phase can run them inside one
//! row-locking transaction.

pub mod device_group_repo;
pub mod message_log_repo;
pub mod message_preferences_repo;
pub mod message_repo;
pub mod user_repo;

pub use device_group_repo::DeviceGroupRepo;
pub use message_log_repo::MessageLogRepo;
pub use message_preferences_repo::MessagePreferencesRepo;
pub use message_repo::MessageRepo;
pub use user_repo::UserRepo;
