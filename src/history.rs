//! Recent-files history for host environments
//!
//! An ordered, capped list of processed-file records that a host may
//! persist between sessions. The crypto core neither reads nor writes
//! this; it exists so hosts share one implementation of the bookkeeping.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result, VaultError};
use crate::job::Mode;

/// Maximum number of retained entries
pub const HISTORY_CAP: usize = 10;

/// Bytes of randomness behind a generated entry id
const ID_LEN: usize = 9;

/// One processed-file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch, as reported by the host.
    pub timestamp: u64,
    pub mode: Mode,
}

/// Most-recent-first list of processed files, capped at [`HISTORY_CAP`].
///
/// Persisted as a bare JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentFiles {
    entries: Vec<HistoryEntry>,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Insert at the front, dropping the oldest entries beyond the cap.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load from a JSON file.
    ///
    /// A missing file and an unparseable file both yield an empty
    /// history; other read failures surface as errors.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(VaultError::with_source(
                    ErrorKind::UnexpectedFailure,
                    format!("failed to read history from {}", path.display()),
                    e,
                ));
            }
        };
        Ok(serde_json::from_slice(&bytes).unwrap_or_default())
    }

    /// Save as JSON, atomically replacing any previous file
    /// (tempfile + fsync + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().ok_or_else(|| {
            VaultError::new(
                ErrorKind::UnexpectedFailure,
                "history path has no parent directory",
            )
        })?;

        let json = serde_json::to_vec_pretty(self).map_err(|e| {
            VaultError::with_source(ErrorKind::UnexpectedFailure, "failed to serialize history", e)
        })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            VaultError::with_source(ErrorKind::UnexpectedFailure, "failed to create tempfile", e)
        })?;
        temp_file.write_all(&json).map_err(|e| {
            VaultError::with_source(ErrorKind::UnexpectedFailure, "failed to write to tempfile", e)
        })?;
        // Flush and fsync() such that the rename later, if it succeeds,
        // will always point to a valid file.
        temp_file.flush().map_err(|e| {
            VaultError::with_source(ErrorKind::UnexpectedFailure, "failed to flush tempfile", e)
        })?;
        temp_file.as_file().sync_all().map_err(|e| {
            VaultError::with_source(
                ErrorKind::UnexpectedFailure,
                "failed to sync file prior to rename",
                e,
            )
        })?;
        temp_file.persist(path).map_err(|e| {
            VaultError::with_source(
                ErrorKind::UnexpectedFailure,
                format!("failed to rename to history file {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

/// Random URL-safe identifier for a history entry.
pub fn new_entry_id() -> String {
    let mut bytes = [0u8; ID_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, timestamp: u64) -> HistoryEntry {
        HistoryEntry {
            id: new_entry_id(),
            name: name.to_owned(),
            timestamp,
            mode: Mode::Encrypt,
        }
    }

    #[test]
    fn test_most_recent_first() {
        let mut history = RecentFiles::new();
        history.record(entry("first.txt", 1));
        history.record(entry("second.txt", 2));

        assert_eq!(history.entries()[0].name, "second.txt");
        assert_eq!(history.entries()[1].name, "first.txt");
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = RecentFiles::new();
        for i in 0..(HISTORY_CAP + 5) {
            history.record(entry(&format!("file{i}.txt"), i as u64));
        }

        assert_eq!(history.entries().len(), HISTORY_CAP);
        assert_eq!(history.entries()[0].name, "file14.txt");
        assert_eq!(history.entries()[HISTORY_CAP - 1].name, "file5.txt");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent.json");

        let mut history = RecentFiles::new();
        history.record(entry("a.txt", 10));
        history.record(entry("b.txt", 20));
        history.save(&path).unwrap();

        let loaded = RecentFiles::load(&path).unwrap();
        assert_eq!(loaded.entries(), history.entries());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = RecentFiles::load(&temp_dir.path().join("absent.json")).unwrap();
        assert!(loaded.entries().is_empty());
    }

    #[test]
    fn test_load_corrupted_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent.json");
        fs::write(&path, b"{ not json ]").unwrap();

        let loaded = RecentFiles::load(&path).unwrap();
        assert!(loaded.entries().is_empty());
    }

    #[test]
    fn test_persisted_shape_is_bare_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recent.json");

        let mut history = RecentFiles::new();
        history.record(entry("a.txt", 10));
        history.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.trim_start().starts_with('['));
        assert!(raw.contains("\"encrypt\""));
    }

    #[test]
    fn test_clear() {
        let mut history = RecentFiles::new();
        history.record(entry("a.txt", 10));
        history.clear();
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_entry_ids_are_unique_and_url_safe() {
        let a = new_entry_id();
        let b = new_entry_id();

        assert_ne!(a, b);
        for id in [&a, &b] {
            assert!(!id.contains('+'));
            assert!(!id.contains('/'));
            assert!(!id.contains('='));
        }
    }
}
