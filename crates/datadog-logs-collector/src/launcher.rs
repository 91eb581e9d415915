//! Launcher: lifecycle orchestration for journald tailers.
//!
//! The launcher owns the subset of configured sources that belong to the
//! journald backend and guarantees exactly one live tailer per source
//! identifier between a `start` and the next `stop`. Start is re-entrant and
//! per-source best effort: a bad source is logged and skipped, never aborting
//! the batch. Stop hands every active tailer to the shutdown coordinator and
//! blocks until all of them have quiesced.
//!
//! ```text
//!   sources ──> Launcher ──┬─> Tailer ──> pipeline channel
//!                registry  ├─> Tailer ──> pipeline channel
//!                          └─> Tailer ──> pipeline channel
//!                  │
//!                  └── cursors from CursorRegistry, teardown via ParallelStopper
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::checkpoint::CursorRegistry;
use crate::config::{LogSource, SourceType};
use crate::pipeline::PipelineProvider;
use crate::shutdown::ParallelStopper;
use crate::tailer::{Tailer, TailerError, TailerFactory};

/// Why a single source failed to come up.
///
/// Construction and start failures are distinguished so the log line points
/// at the right collaborator. Neither is fatal to the launcher.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("could not build tailer: {0}")]
    Build(#[source] TailerError),

    #[error("could not start tailer: {0}")]
    Start(#[source] TailerError),
}

/// Starts and stops journald tailers, one per distinct source identifier.
///
/// `start` and `stop` take `&mut self`: the launcher is driven from a single
/// task and is not meant for concurrent invocation. Each tailer it starts is
/// an independent task with its own schedule.
pub struct Launcher {
    sources: Vec<LogSource>,
    pipeline_provider: Arc<dyn PipelineProvider>,
    cursor_registry: Arc<dyn CursorRegistry>,
    factory: Arc<dyn TailerFactory>,
    tailers: HashMap<String, Arc<dyn Tailer>>,
}

impl Launcher {
    /// Creates a launcher owning the journald sources of `sources`.
    ///
    /// Only filters and stores; nothing is spawned until [`Launcher::start`].
    #[must_use]
    pub fn new(
        sources: &[LogSource],
        pipeline_provider: Arc<dyn PipelineProvider>,
        cursor_registry: Arc<dyn CursorRegistry>,
        factory: Arc<dyn TailerFactory>,
    ) -> Self {
        let journald_sources = sources
            .iter()
            .filter(|source| source.source_type == SourceType::Journald)
            .cloned()
            .collect();
        Self {
            sources: journald_sources,
            pipeline_provider,
            cursor_registry,
            factory,
            tailers: HashMap::new(),
        }
    }

    /// Starts a tailer for every owned source that is not already tailed, in
    /// listed order.
    ///
    /// Re-entrant: calling `start` again (e.g. after a source list grew on
    /// reconfiguration) only picks up identifiers without an active tailer.
    /// Removed sources are not reconciled; they keep tailing until `stop`.
    /// A source that fails setup is logged and skipped so the remaining
    /// sources still come up.
    pub async fn start(&mut self) {
        for source in self.sources.clone() {
            if self.tailers.contains_key(&source.identifier) {
                // One tailer per journal.
                continue;
            }
            match self.setup_tailer(&source).await {
                Ok(tailer) => {
                    debug!(source = %source.identifier, "tailer started");
                    self.tailers.insert(source.identifier.clone(), tailer);
                }
                Err(e) => {
                    warn!(source = %source.identifier, error = %e, "could not set up journald tailer");
                }
            }
        }
    }

    /// Stops every active tailer concurrently and blocks until all of them
    /// have confirmed termination. The registry is empty afterwards.
    ///
    /// Idempotent: with no active tailers this returns immediately.
    pub async fn stop(&mut self) {
        if self.tailers.is_empty() {
            return;
        }

        info!(count = self.tailers.len(), "stopping journald tailers");
        let mut stopper = ParallelStopper::new();
        for (_, tailer) in self.tailers.drain() {
            stopper.add(tailer);
        }
        stopper.stop().await;
    }

    /// Number of active tailers.
    #[must_use]
    pub fn active_tailers(&self) -> usize {
        self.tailers.len()
    }

    /// Whether `identifier` is currently being tailed.
    #[must_use]
    pub fn is_tailing(&self, identifier: &str) -> bool {
        self.tailers.contains_key(identifier)
    }

    /// Configures and starts a new tailer for `source`.
    ///
    /// Resolves the resume cursor before the tailer starts, so resumption is
    /// settled before the first record can be produced. A cursor lookup
    /// failure degrades to a tail start instead of failing the source. A
    /// failed start leaves no half-started tailer behind; the tailer's own
    /// start contract guarantees that.
    async fn setup_tailer(&self, source: &LogSource) -> Result<Arc<dyn Tailer>, SetupError> {
        let output = self.pipeline_provider.next_channel();
        let tailer = self.factory.build(source, output).map_err(SetupError::Build)?;

        let cursor = match self.cursor_registry.last_committed_cursor(tailer.identifier()) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(
                    source = %tailer.identifier(),
                    error = %e,
                    "cursor lookup failed, starting from the tail"
                );
                None
            }
        };

        tailer.start(cursor).await.map_err(SetupError::Start)?;
        Ok(tailer)
    }
}
