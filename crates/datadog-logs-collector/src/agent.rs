//! Top-level wiring of the log collection subsystem.
//!
//! [`LogsAgent`] assembles the concrete collaborators (round-robin pipeline
//! provider, file-backed cursor registry, journald tailer factory) into a
//! launcher, and stages them through the same construct / start / shutdown
//! lifecycle the rest of the agent uses. Downstream processing is the
//! embedding process's business: it receives the pipeline channels at
//! construction and drains them on its own tasks.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::checkpoint::FileCursorRegistry;
use crate::config::{LogSource, LogsConfig};
use crate::launcher::Launcher;
use crate::pipeline::{LogRecord, Provider};
use crate::tailer::journald::JournaldTailerFactory;

/// Log collection subsystem: launcher plus its wired-up collaborators.
pub struct LogsAgent {
    launcher: Launcher,
    is_started: bool,
}

impl LogsAgent {
    /// Builds the subsystem from process-wide defaults, the configured
    /// source list, and the path of the durable cursor registry.
    ///
    /// Returns the agent together with the pipeline receivers; the caller
    /// owns downstream processing. Nothing is spawned until
    /// [`LogsAgent::start`].
    #[must_use]
    pub fn new(
        config: &LogsConfig,
        sources: &[LogSource],
        registry_path: &Path,
    ) -> (Self, Vec<mpsc::Receiver<LogRecord>>) {
        let (provider, receivers) = Provider::new(config.pipeline_count, config.channel_capacity);
        let registry = Arc::new(FileCursorRegistry::open(registry_path));
        let factory = Arc::new(JournaldTailerFactory::new(config.journalctl_path.clone()));
        let launcher = Launcher::new(sources, Arc::new(provider), registry, factory);
        (
            Self {
                launcher,
                is_started: false,
            },
            receivers,
        )
    }

    /// Starts collection on every configured source.
    ///
    /// Re-entrant like [`Launcher::start`]; the started flag only tracks the
    /// idle/running transition for logging.
    pub async fn start(&mut self) {
        if !self.is_started {
            info!("starting logs collection");
        }
        self.launcher.start().await;
        self.is_started = true;
        debug!(active = self.launcher.active_tailers(), "logs collection running");
    }

    /// Stops every active tailer concurrently and returns once all of them
    /// have quiesced. Safe to call when nothing is running.
    pub async fn stop(&mut self) {
        self.launcher.stop().await;
        if self.is_started {
            info!("logs collection stopped");
        }
        self.is_started = false;
    }

    /// Number of currently active tailers.
    #[must_use]
    pub fn active_tailers(&self) -> usize {
        self.launcher.active_tailers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_agent_wires_up_without_side_effects() {
        let dir = TempDir::new().expect("tempdir");
        let config = LogsConfig::default();
        let sources = vec![LogSource::new("journald:default", SourceType::Journald)];

        let (agent, receivers) =
            LogsAgent::new(&config, &sources, &dir.path().join("cursors.json"));
        assert_eq!(receivers.len(), config.pipeline_count);
        assert_eq!(agent.active_tailers(), 0);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_a_noop() {
        let dir = TempDir::new().expect("tempdir");
        let config = LogsConfig::default();
        let (mut agent, _receivers) =
            LogsAgent::new(&config, &[], &dir.path().join("cursors.json"));
        agent.stop().await;
        assert_eq!(agent.active_tailers(), 0);
    }
}
