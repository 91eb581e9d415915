//! Tailer contract consumed by the launcher.
//!
//! A tailer is the active reader bound to one source. The launcher never
//! reads from or writes records into a tailer directly; all record flow goes
//! through the pipeline channel the tailer was constructed with.

pub mod journald;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::checkpoint::Cursor;
use crate::config::LogSource;
use crate::pipeline::LogRecord;
use crate::shutdown::Stoppable;

/// Errors raised while constructing or starting a tailer.
#[derive(Debug, thiserror::Error)]
pub enum TailerError {
    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn journal reader: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("journal reader produced no output stream")]
    MissingOutput,

    #[error("tailer is already started")]
    AlreadyStarted,
}

/// One active reader bound to one source.
///
/// `stop` (from [`Stoppable`]) must be safe to call exactly once after a
/// successful start and must return only after the reader has fully
/// quiesced, with no records in flight.
#[async_trait]
pub trait Tailer: Stoppable {
    /// Stable identifier of the source this tailer reads. Doubles as the
    /// registry and checkpoint key.
    fn identifier(&self) -> &str;

    /// Begins reading, resuming after `cursor` when present, otherwise at
    /// the current end of the source.
    ///
    /// A failed start must leave nothing behind: no reader task, no child
    /// process, no records produced.
    async fn start(&self, cursor: Option<Cursor>) -> Result<(), TailerError>;
}

/// Builds tailers for the launcher.
///
/// The factory seam keeps the launcher agnostic to the concrete reader; the
/// production implementation is
/// [`journald::JournaldTailerFactory`], tests substitute their own.
pub trait TailerFactory: Send + Sync {
    /// Constructs (but does not start) a tailer for `source`, bound to
    /// `output`.
    fn build(
        &self,
        source: &LogSource,
        output: mpsc::Sender<LogRecord>,
    ) -> Result<Arc<dyn Tailer>, TailerError>;
}
