//! Tactile feedback patterns.

use tracing::info;

/// Feedback patterns the scan flow can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    /// Medium impact tap, e.g. when the shutter is pressed.
    Impact,
    /// Success notification.
    Success,
    /// Error notification.
    Error,
}

/// Something that can buzz, beep or otherwise acknowledge the learner.
///
/// Feedback is cosmetic: implementations must not fail and must not block.
pub trait Haptics: Send {
    fn notify(&self, feedback: Feedback);
}

/// Writes every feedback request to the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn notify(&self, feedback: Feedback) {
        info!(?feedback, "haptic feedback");
    }
}
