//! Progress and error notification for batches.

use tokio::sync::mpsc;
use tracing::debug;

use super::types::BatchEvent;

/// Receives batch notifications.
///
/// Calls come from the single loop that aggregates task results, so they
/// never overlap. They happen in completion order.
pub trait BatchObserver: Send + Sync {
    /// A file finished with a result; `completed` counts every finished file so far.
    fn on_progress(&self, completed: usize, total: usize, file: &std::path::Path, success: bool);

    /// A file hit a hard error.
    fn on_error(&self, file: &std::path::Path, error: &str);
}

/// Forwards notifications into a channel as [`BatchEvent`]s.
///
/// The channel is unbounded: a batch emits at most one event per matched
/// file, and a slow consumer never loses one. Events are discarded only
/// once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<BatchEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<BatchEvent>) -> Self {
        Self { tx }
    }

    /// Creates an observer and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: BatchEvent) {
        if self.tx.send(event).is_err() {
            debug!("Batch event receiver closed, discarding event");
        }
    }
}

impl BatchObserver for ChannelObserver {
    fn on_progress(&self, completed: usize, total: usize, file: &std::path::Path, success: bool) {
        self.send(BatchEvent::Progress {
            completed,
            total,
            file: file.to_path_buf(),
            success,
        });
    }

    fn on_error(&self, file: &std::path::Path, error: &str) {
        self.send(BatchEvent::Error {
            file: file.to_path_buf(),
            error: error.to_string(),
        });
    }
}
