//! Journald tailer.
//!
//! Reads the systemd journal by spawning `journalctl --output=json --follow`
//! and parsing its line-oriented JSON export. Resumption uses the journal's
//! own cursor tokens: with a committed cursor the reader continues after it
//! (`--after-cursor`), without one it starts at the current tail
//! (`--lines=0`) rather than replaying history.
//!
//! The reader runs as its own tokio task. Backpressure from the pipeline
//! channel blocks only that task; stop cancels the token, kills the child
//! process, and joins the task, so no record is in flight once stop returns.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::checkpoint::Cursor;
use crate::config::{LogSource, SourceType};
use crate::pipeline::LogRecord;
use crate::shutdown::Stoppable;
use crate::tailer::{Tailer, TailerError, TailerFactory};

/// Backend-specific reader configuration derived from a [`LogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaldConfig {
    /// systemd units to restrict collection to; empty collects everything.
    pub units: Vec<String>,
    /// Journal directory to read, `None` for the system default.
    pub path: Option<PathBuf>,
}

impl JournaldConfig {
    /// Derives the reader configuration from a source: the unit filter is
    /// split on `,` into unit names, and an absolute-path identifier selects
    /// that journal directory instead of the system default.
    #[must_use]
    pub fn from_source(source: &LogSource) -> Self {
        let units = source
            .unit_filter
            .as_deref()
            .map(|filter| filter.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        let path = source
            .identifier
            .starts_with('/')
            .then(|| PathBuf::from(&source.identifier));
        Self { units, path }
    }
}

/// Arguments passed to the journal reader binary.
fn journalctl_args(config: &JournaldConfig, cursor: Option<&Cursor>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--output=json".into(), "--follow".into()];
    match cursor {
        Some(cursor) => args.push(format!("--after-cursor={cursor}").into()),
        // No history to resume: skip the backlog and read from the tail.
        None => args.push("--lines=0".into()),
    }
    for unit in &config.units {
        args.push(format!("--unit={unit}").into());
    }
    if let Some(path) = &config.path {
        args.push(format!("--directory={}", path.display()).into());
    }
    args
}

/// One field subset of the journal's JSON export format.
#[derive(Debug, Deserialize)]
struct JournalEntry {
    #[serde(rename = "MESSAGE")]
    message: Option<Value>,
    #[serde(rename = "__CURSOR")]
    cursor: Option<String>,
    #[serde(rename = "_SYSTEMD_UNIT")]
    unit: Option<String>,
    #[serde(rename = "__REALTIME_TIMESTAMP")]
    realtime_timestamp: Option<String>,
}

/// Parses one journal export line into a record, or `None` when the line is
/// not a usable entry.
fn parse_entry(identifier: &str, line: &str) -> Option<LogRecord> {
    let entry: JournalEntry = serde_json::from_str(line).ok()?;
    let message = message_text(entry.message?)?;
    let timestamp = entry
        .realtime_timestamp
        .and_then(|micros| micros.parse::<u64>().ok())
        .map(|micros| UNIX_EPOCH + Duration::from_micros(micros));
    Some(LogRecord {
        source: identifier.to_string(),
        message,
        unit: entry.unit,
        timestamp,
        cursor: entry.cursor.map(Cursor::from),
    })
}

/// The journal exports `MESSAGE` as a string, or as a byte array when the
/// payload is not valid UTF-8.
fn message_text(value: Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message),
        Value::Array(bytes) => {
            let bytes: Vec<u8> = bytes
                .into_iter()
                .filter_map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => None,
    }
}

/// Active reader for one journald source.
pub struct JournaldTailer {
    identifier: String,
    config: JournaldConfig,
    journalctl_path: PathBuf,
    output: mpsc::Sender<LogRecord>,
    cancel: CancellationToken,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl JournaldTailer {
    /// Creates a stopped tailer bound to `output`.
    #[must_use]
    pub fn new(
        identifier: String,
        config: JournaldConfig,
        journalctl_path: PathBuf,
        output: mpsc::Sender<LogRecord>,
    ) -> Self {
        Self {
            identifier,
            config,
            journalctl_path,
            output,
            cancel: CancellationToken::new(),
            reader: Mutex::new(None),
        }
    }

    fn build_command(&self, cursor: Option<&Cursor>) -> Command {
        let mut command = Command::new(&self.journalctl_path);
        command
            .args(journalctl_args(&self.config, cursor))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Tailer for JournaldTailer {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn start(&self, cursor: Option<Cursor>) -> Result<(), TailerError> {
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        if reader.is_some() {
            return Err(TailerError::AlreadyStarted);
        }

        let mut child = self.build_command(cursor.as_ref()).spawn()?;
        // `kill_on_drop` reaps the child if we bail out before the reader
        // task takes ownership of it.
        let stdout = child.stdout.take().ok_or(TailerError::MissingOutput)?;

        info!(
            source = %self.identifier,
            resuming = cursor.is_some(),
            units = self.config.units.len(),
            "starting journald tailer"
        );

        *reader = Some(tokio::spawn(run_reader(
            child,
            stdout,
            self.identifier.clone(),
            self.output.clone(),
            self.cancel.clone(),
        )));
        Ok(())
    }
}

#[async_trait]
impl Stoppable for JournaldTailer {
    async fn stop(&self) {
        self.cancel.cancel();
        let reader = {
            let mut guard = self.reader.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(reader) = reader {
            if let Err(e) = reader.await {
                error!(source = %self.identifier, error = %e, "journal reader task failed during stop");
            }
        }
        debug!(source = %self.identifier, "journald tailer stopped");
    }
}

/// Reader loop: one journal entry per stdout line, pushed to the pipeline
/// channel until cancellation, reader exit, or channel closure.
async fn run_reader(
    mut child: Child,
    stdout: ChildStdout,
    identifier: String,
    output: mpsc::Sender<LogRecord>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(source = %identifier, "journal reader cancelled");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let Some(record) = parse_entry(&identifier, &line) else {
                        debug!(source = %identifier, "skipping unparsable journal entry");
                        continue;
                    };
                    // The push may block under pipeline backpressure;
                    // cancellation must still win so stop stays bounded.
                    tokio::select! {
                        () = cancel.cancelled() => {
                            debug!(source = %identifier, "journal reader cancelled mid-send");
                            break;
                        }
                        sent = output.send(record) => {
                            if sent.is_err() {
                                debug!(source = %identifier, "pipeline channel closed, stopping reader");
                                break;
                            }
                        }
                    }
                }
                Ok(None) => {
                    warn!(source = %identifier, "journal reader closed its output");
                    break;
                }
                Err(e) => {
                    warn!(source = %identifier, error = %e, "failed reading journal output");
                    break;
                }
            }
        }
    }

    if let Err(e) = child.start_kill() {
        // Already exited; nothing to kill.
        debug!(source = %identifier, error = %e, "journal reader already terminated");
    }
    let _ = child.wait().await;
}

/// Production [`TailerFactory`] building [`JournaldTailer`]s.
pub struct JournaldTailerFactory {
    journalctl_path: PathBuf,
}

impl JournaldTailerFactory {
    /// Creates a factory spawning readers via `journalctl_path`.
    #[must_use]
    pub fn new(journalctl_path: PathBuf) -> Self {
        Self { journalctl_path }
    }
}

impl TailerFactory for JournaldTailerFactory {
    fn build(
        &self,
        source: &LogSource,
        output: mpsc::Sender<LogRecord>,
    ) -> Result<Arc<dyn Tailer>, TailerError> {
        if source.source_type != SourceType::Journald {
            return Err(TailerError::InvalidConfig(format!(
                "cannot tail a {} source with the journald backend",
                source.source_type
            )));
        }
        if source.identifier.is_empty() {
            return Err(TailerError::InvalidConfig(
                "source has an empty identifier".to_string(),
            ));
        }
        Ok(Arc::new(JournaldTailer::new(
            source.identifier.clone(),
            JournaldConfig::from_source(source),
            self.journalctl_path.clone(),
            output,
        )))
    }
}
