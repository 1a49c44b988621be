//! Delivery backends for the dispatchable mediums.
//!
//! Backends are network adapters only: they take fully-built payloads,
//! talk to the outside world, and report per-message outcomes. All storage
//! mutation (log transitions, key eviction) is the pipeline's job.

pub mod app_push;
pub mod email;
