//! Fire-and-forget progress reporting.
//!
//! Tool handlers emit progress percentages at fixed checkpoints through a
//! [`ProgressReporter`]. The reporter is a narrow one-way channel: a handler
//! never learns whether anyone is listening, and a slow, absent, or dropped
//! receiver never changes the handler's own result.

use tokio::sync::mpsc;
use tracing::debug;

/// One progress notification, as a 0-100 percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
}

/// Optional sink for progress updates.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::UnboundedSender<ProgressUpdate>>,
}

impl ProgressReporter {
    /// A reporter that drops every update.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// A reporter paired with a receiver for the updates.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Report a progress percentage. Send failures are ignored.
    pub fn report(&self, percent: u8) {
        debug!(percent, "progress");
        if let Some(sender) = &self.sender {
            let _ = sender.send(ProgressUpdate { percent });
        }
    }
}
