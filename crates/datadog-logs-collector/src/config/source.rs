//! Log source configuration.

use std::fmt;

use serde::Deserialize;

/// Kind of origin a [`LogSource`] reads from.
///
/// The shared source list covers every collection backend the agent knows
/// about; each launcher filters the list down to the type it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// systemd journal entries.
    Journald,
    /// Plain files tailed on disk.
    File,
    /// Log lines received over TCP.
    Tcp,
    /// Log lines received over UDP.
    Udp,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Journald => "journald",
            SourceType::File => "file",
            SourceType::Tcp => "tcp",
            SourceType::Udp => "udp",
        };
        write!(f, "{name}")
    }
}

/// One configured origin of log data.
///
/// Immutable once read by the launcher. The `identifier` is the deduplication
/// key for the whole lifecycle: at most one tailer exists per identifier, and
/// checkpoints are recorded under it.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSource {
    /// Unique identifier, e.g. a journal directory path or `journald:default`.
    pub identifier: String,
    /// Collection backend this source belongs to.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Optional comma-separated list of systemd unit names to restrict
    /// collection to. `None` collects every unit.
    #[serde(default)]
    pub unit_filter: Option<String>,
}

impl LogSource {
    /// Creates a source with no unit filter.
    #[must_use]
    pub fn new(identifier: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            identifier: identifier.into(),
            source_type,
            unit_filter: None,
        }
    }

    /// Sets the comma-separated unit filter.
    #[must_use]
    pub fn with_unit_filter(mut self, filter: impl Into<String>) -> Self {
        self.unit_filter = Some(filter.into());
        self
    }
}
