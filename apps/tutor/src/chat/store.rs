//! JSON-file persistence for the chat transcript.
//!
//! Reads are fail-soft (history is best-effort state), writes are not: a failed
//! save is returned to the caller so lost durability is never silent.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::models::Transcript;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Durable home of the transcript between sessions. Every save rewrites the
/// whole file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted transcript. A missing or unreadable record yields an
    /// empty transcript.
    pub fn load(&self) -> Transcript {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No chat history on disk, starting empty");
                return Transcript::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Chat history unreadable, starting empty");
                return Transcript::new();
            }
        };

        match serde_json::from_str::<Transcript>(&raw) {
            Ok(transcript) => {
                debug!(turns = transcript.len(), "Chat history loaded");
                transcript
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Chat history malformed, starting empty");
                Transcript::new()
            }
        }
    }

    /// Serializes the full transcript and atomically replaces the record.
    pub fn save(&self, transcript: &Transcript) -> Result<(), StoreError> {
        let payload = serde_json::to_string_pretty(transcript)?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        // Temp file in the target directory so the final rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(payload.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(turns = transcript.len(), path = %self.path.display(), "Chat history saved");
        Ok(())
    }

    /// `save` on the blocking pool, for callers on the async executor.
    pub async fn persist(&self, transcript: Transcript) -> Result<(), StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&transcript)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::{ts, Role, Turn};
    use tempfile::TempDir;

    fn sample_transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.append(Turn::new(
            Role::User,
            "What is overfitting?",
            ts("2024-01-01 10:00:00"),
        ));
        transcript.append(Turn::new(
            Role::Assistant,
            "Overfitting is...",
            ts("2024-01-01 10:00:01"),
        ));
        transcript
    }

    #[test]
    fn test_save_then_load_round_trips_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_history.json");

        HistoryStore::new(&path).save(&sample_transcript()).unwrap();
        let loaded = HistoryStore::new(&path).load();

        let turns = loaded.all();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), Role::User);
        assert_eq!(turns[0].text(), "What is overfitting?");
        assert_eq!(turns[0].timestamp(), ts("2024-01-01 10:00:00"));
        assert_eq!(turns[1].role(), Role::Assistant);
        assert_eq!(turns[1].text(), "Overfitting is...");
        assert_eq!(turns[1].timestamp(), ts("2024-01-01 10:00:01"));
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("chat_history.json"));

        let mut transcript = sample_transcript();
        store.save(&transcript).unwrap();
        transcript.append(Turn::new(Role::User, "And underfitting?", ts("2024-01-01 10:05:00")));
        store.save(&transcript).unwrap();

        assert_eq!(store.load(), transcript);
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temp files must not be left behind");
    }

    #[test]
    fn test_saved_record_uses_named_fields() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("chat_history.json"));
        store.save(&sample_transcript()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[1]["timestamp"], "2024-01-01 10:00:01");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("does_not_exist.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_history.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(HistoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_history.json");
        fs::write(&path, r#"{"role":"user"}"#).unwrap();
        assert!(HistoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_load_legacy_triples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_history.json");
        fs::write(
            &path,
            r#"[["user","What is overfitting?","2024-01-01 10:00:00"],
                ["assistant","Overfitting is... ","2024-01-01 10:00:00"]]"#,
        )
        .unwrap();

        let loaded = HistoryStore::new(&path).load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.all()[1].role(), Role::Assistant);
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("chat_history.json");
        HistoryStore::new(&path).save(&sample_transcript()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file in the way").unwrap();

        let store = HistoryStore::new(blocker.join("chat_history.json"));
        let err = store.save(&sample_transcript()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn test_persist_writes_from_the_blocking_pool() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("chat_history.json"));

        store.persist(sample_transcript()).await.unwrap();

        assert_eq!(store.load(), sample_transcript());
    }

    #[tokio::test]
    async fn test_persist_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file in the way").unwrap();

        let store = HistoryStore::new(blocker.join("chat_history.json"));
        let err = store.persist(sample_transcript()).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
