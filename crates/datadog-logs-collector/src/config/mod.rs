//! Configuration for the logs collection subsystem.
//!
//! Process-wide defaults live in [`LogsConfig`] and are injected explicitly
//! into constructors; nothing in this crate reads ambient global state. The
//! per-source configuration unit is [`LogSource`], owned by the embedding
//! agent's configuration subsystem and handed to the launcher as an ordered
//! list.

pub mod source;

pub use source::{LogSource, SourceType};

use std::path::PathBuf;

use serde::Deserialize;

/// Default number of processing pipelines tailer output is sharded over.
const DEFAULT_PIPELINE_COUNT: usize = 4;

/// Default capacity of each pipeline channel.
///
/// When a channel is full the sending tailer blocks on its own task until the
/// downstream processor catches up; the launcher is never affected.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Process-wide settings for log collection.
///
/// All fields have defaults so an empty config section deserializes to a
/// working configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Number of downstream pipeline channels to shard tailers over.
    pub pipeline_count: usize,
    /// Bounded capacity of each pipeline channel, in records.
    pub channel_capacity: usize,
    /// Binary used to read the journal. Overridable for sandboxed
    /// environments where `journalctl` is not on `PATH`.
    pub journalctl_path: PathBuf,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            pipeline_count: DEFAULT_PIPELINE_COUNT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            journalctl_path: PathBuf::from("journalctl"),
        }
    }
}
