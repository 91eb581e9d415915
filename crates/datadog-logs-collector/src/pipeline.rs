//! Pipeline sink interface and the round-robin channel provider.
//!
//! Tailers never talk to downstream processing directly; each one is handed a
//! bounded channel sender at setup time and pushes parsed records into it for
//! the rest of its life. The provider decides how tailers are sharded over
//! the available processing pipelines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use tokio::sync::mpsc;

use crate::checkpoint::Cursor;

/// A parsed log record on its way into the processing pipeline.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Identifier of the source that produced this record.
    pub source: String,
    /// The log message content.
    pub message: String,
    /// systemd unit the entry originated from, when known.
    pub unit: Option<String>,
    /// Wall-clock time the entry was written to the journal.
    pub timestamp: Option<SystemTime>,
    /// Position of this record within its source's stream. Committing it to
    /// the cursor registry marks everything up to and including this record
    /// as durably handled.
    pub cursor: Option<Cursor>,
}

/// Narrow interface the launcher uses to obtain output channels.
///
/// Each call yields a sender a tailer may write records to indefinitely;
/// internal sharding and backpressure are the provider's business.
pub trait PipelineProvider: Send + Sync {
    /// Returns the next available pipeline channel.
    fn next_channel(&self) -> mpsc::Sender<LogRecord>;
}

/// Concrete provider sharding tailers over `N` bounded channels round-robin.
pub struct Provider {
    senders: Vec<mpsc::Sender<LogRecord>>,
    next: AtomicUsize,
}

impl Provider {
    /// Creates `pipeline_count` bounded channels and returns the provider
    /// together with the receiving ends.
    ///
    /// The receivers belong to the embedding process; dropping one closes the
    /// corresponding channel and the tailers writing to it stop producing.
    /// `pipeline_count` is clamped to at least one channel.
    #[must_use]
    pub fn new(pipeline_count: usize, channel_capacity: usize) -> (Self, Vec<mpsc::Receiver<LogRecord>>) {
        let count = pipeline_count.max(1);
        let mut senders = Vec::with_capacity(count);
        let mut receivers = Vec::with_capacity(count);
        for _ in 0..count {
            let (tx, rx) = mpsc::channel(channel_capacity.max(1));
            senders.push(tx);
            receivers.push(rx);
        }
        (
            Self {
                senders,
                next: AtomicUsize::new(0),
            },
            receivers,
        )
    }
}

impl PipelineProvider for Provider {
    fn next_channel(&self) -> mpsc::Sender<LogRecord> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        self.senders[index].clone()
    }
}
