//! Status event port
//!
//! The only externally observable progress contract: consumers receive
//! best-effort events at task boundaries and must tolerate missing
//! progress values.

use conductor_domain::StatusUpdate;

/// Consumer of task lifecycle status events.
pub trait StatusSink: Send + Sync {
    fn on_status(&self, update: &StatusUpdate);
}

/// Sink that discards every event.
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn on_status(&self, _update: &StatusUpdate) {}
}
