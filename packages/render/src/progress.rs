//! Progress reporting for multi-state renders.
//!
//! The render crate only reports through [`ProgressCallback`]; the binary
//! decides how to draw it.

/// Receives progress updates from a long-running render.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total units of work.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Updates the message shown alongside the indicator.
    fn set_message(&self, msg: String);

    /// Marks progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
