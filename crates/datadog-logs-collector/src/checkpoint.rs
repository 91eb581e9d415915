//! Durable cursor registry for crash-safe tailer resumption.
//!
//! The registry maps source identifiers to the last cursor the pipeline
//! committed for them. Lookups happen once per tailer, before its reader
//! starts, so resumption is resolved before the first record is produced.
//! Resumption is best-effort: a registry that cannot be read degrades to
//! "no history" and sources start from their current tail.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Opaque resumption token marking a position within a source's stream.
///
/// The token's contents are meaningful only to the tailer that produced it;
/// everything else stores and transports it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by a cursor registry.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to access cursor registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("cursor registry contents are invalid: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable identifier → cursor mapping consumed by the launcher.
///
/// Implementations must be safe for concurrent use: every tailer addresses
/// the registry strictly under its own identifier, so contention is limited
/// to the registry's internal synchronization.
pub trait CursorRegistry: Send + Sync {
    /// Returns the last committed cursor for `identifier`, or `None` when the
    /// source has no recorded history.
    fn last_committed_cursor(&self, identifier: &str) -> Result<Option<Cursor>, CheckpointError>;

    /// Records `cursor` as the last durably handled position for
    /// `identifier`.
    fn commit_cursor(&self, identifier: &str, cursor: Cursor) -> Result<(), CheckpointError>;
}

/// JSON-file-backed cursor registry.
///
/// The whole mapping is loaded at open and rewritten atomically (temp file +
/// rename) on every commit, so a crash mid-write never leaves a truncated
/// registry behind.
pub struct FileCursorRegistry {
    path: PathBuf,
    cursors: Mutex<HashMap<String, Cursor>>,
}

impl FileCursorRegistry {
    /// Opens the registry at `path`, loading any previously persisted
    /// cursors.
    ///
    /// A missing file is an empty registry. An unreadable or corrupt file is
    /// logged and treated as empty rather than failing the open; resumption
    /// degrades, collection does not.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cursors = match Self::load(&path) {
            Ok(cursors) => cursors,
            Err(CheckpointError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cursor registry on disk, starting empty");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load cursor registry, starting empty");
                HashMap::new()
            }
        };
        Self {
            path,
            cursors: Mutex::new(cursors),
        }
    }

    fn load(path: &Path) -> Result<HashMap<String, Cursor>, CheckpointError> {
        let contents = fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    fn persist(&self, cursors: &HashMap<String, Cursor>) -> Result<(), CheckpointError> {
        let serialized = serde_json::to_vec_pretty(cursors)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl CursorRegistry for FileCursorRegistry {
    fn last_committed_cursor(&self, identifier: &str) -> Result<Option<Cursor>, CheckpointError> {
        let cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cursors.get(identifier).cloned())
    }

    fn commit_cursor(&self, identifier: &str, cursor: Cursor) -> Result<(), CheckpointError> {
        let mut cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        cursors.insert(identifier.to_string(), cursor);
        self.persist(&cursors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_path(dir: &TempDir) -> PathBuf {
        dir.path().join("cursors.json")
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let dir = TempDir::new().expect("tempdir");
        let registry = FileCursorRegistry::open(registry_path(&dir));
        let cursor = registry
            .last_committed_cursor("journald:default")
            .expect("lookup should succeed");
        assert!(cursor.is_none());
    }

    #[test]
    fn test_commit_then_lookup() {
        let dir = TempDir::new().expect("tempdir");
        let registry = FileCursorRegistry::open(registry_path(&dir));

        registry
            .commit_cursor("journald:default", Cursor::from("s=abc;i=12"))
            .expect("commit should succeed");

        let cursor = registry
            .last_committed_cursor("journald:default")
            .expect("lookup should succeed");
        assert_eq!(cursor, Some(Cursor::from("s=abc;i=12")));
    }

    #[test]
    fn test_cursors_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = registry_path(&dir);

        {
            let registry = FileCursorRegistry::open(&path);
            registry
                .commit_cursor("/var/log/journal", Cursor::from("s=abc;i=7"))
                .expect("commit should succeed");
        }

        let reopened = FileCursorRegistry::open(&path);
        let cursor = reopened
            .last_committed_cursor("/var/log/journal")
            .expect("lookup should succeed");
        assert_eq!(cursor, Some(Cursor::from("s=abc;i=7")));
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = registry_path(&dir);
        fs::write(&path, b"not json at all").expect("write corrupt file");

        let registry = FileCursorRegistry::open(&path);
        let cursor = registry
            .last_committed_cursor("journald:default")
            .expect("lookup should succeed");
        assert!(cursor.is_none());

        // A later commit replaces the corrupt file with a valid one.
        registry
            .commit_cursor("journald:default", Cursor::from("s=new"))
            .expect("commit should succeed");
        let reopened = FileCursorRegistry::open(&path);
        assert_eq!(
            reopened
                .last_committed_cursor("journald:default")
                .expect("lookup should succeed"),
            Some(Cursor::from("s=new"))
        );
    }

    #[test]
    fn test_identifiers_are_independent() {
        let dir = TempDir::new().expect("tempdir");
        let registry = FileCursorRegistry::open(registry_path(&dir));

        registry
            .commit_cursor("a", Cursor::from("cursor-a"))
            .expect("commit should succeed");
        registry
            .commit_cursor("b", Cursor::from("cursor-b"))
            .expect("commit should succeed");

        assert_eq!(
            registry.last_committed_cursor("a").expect("lookup"),
            Some(Cursor::from("cursor-a"))
        );
        assert_eq!(
            registry.last_committed_cursor("b").expect("lookup"),
            Some(Cursor::from("cursor-b"))
        );
    }
}
