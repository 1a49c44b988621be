//! Message fan-out pipeline and read-state tracking.
//!
//! [`Processor`] drives the two-phase fan-out: resolving each due message's
//! applicable mediums into claimed delivery logs, then dispatching pending
//! logs through the configured backends. [`ReadStateTracker`] owns the
//! unread/read side and announces count changes on the event bus.

pub mod processor;
pub mod read_state;

pub use processor::{PipelineError, ProcessSummary, Processor};
pub use read_state::ReadStateTracker;
