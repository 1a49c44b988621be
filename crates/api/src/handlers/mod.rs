pub mod messages;
pub mod preferences;
pub mod process;
