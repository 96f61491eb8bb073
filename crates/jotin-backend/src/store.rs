//! JSON-file note store.
//!
//! All notes live in one `notes.json` document. Every operation reads the
//! file, applies its change and writes the whole document back, serialized
//! behind a single async lock so concurrent commands never interleave.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jotin_core::{Note, NoteId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const NOTES_FILE_NAME: &str = "notes.json";

#[derive(Clone)]
pub struct NoteStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl NoteStore {
    /// Open the store inside `data_dir`, creating the directory if needed.
    pub fn open_dir(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).map_err(Error::CreateDataDir)?;
        Ok(Self::open_path(data_dir.join(NOTES_FILE_NAME)))
    }

    /// Use `path` as the notes document. The file need not exist yet.
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trim `text` and append it as a new note.
    pub async fn create(&self, text: &str) -> Result<Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyNote);
        }

        let _guard = self.write_lock.lock().await;
        let mut notes = load_notes(&self.path)?;
        let note = Note::new(NoteId::new(Uuid::now_v7().to_string()), text);
        notes.push(note.clone());
        save_notes(&self.path, &notes)?;

        tracing::debug!("Stored note {} ({} total)", note.id, notes.len());
        Ok(note)
    }

    /// All notes, newest first.
    pub async fn list(&self) -> Result<Vec<Note>> {
        let _guard = self.write_lock.lock().await;
        let mut notes = load_notes(&self.path)?;
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut notes = load_notes(&self.path)?;
        let before = notes.len();
        notes.retain(|note| &note.id != id);
        if notes.len() == before {
            return Err(Error::NoteNotFound);
        }

        save_notes(&self.path, &notes)?;
        tracing::debug!("Removed note {id}");
        Ok(())
    }
}

/// A missing or blank file is an empty collection.
fn load_notes(path: &Path) -> Result<Vec<Note>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path).map_err(Error::ReadNotes)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&raw).map_err(Error::ParseNotes)
}

/// Write to a sibling temp file and move it into place. When the rename is
/// refused (e.g. the target is held open on Windows) copy over it instead.
fn save_notes(path: &Path, notes: &[Note]) -> Result<()> {
    let payload = serde_json::to_string_pretty(notes).map_err(Error::SerializeNotes)?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, payload).map_err(Error::WriteTemp)?;

    match fs::rename(&temp_path, path) {
        Ok(()) => Ok(()),
        Err(rename) => match fs::copy(&temp_path, path) {
            Ok(_) => {
                tracing::warn!("Rename of notes file failed ({rename}); saved via copy");
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    tracing::warn!(
                        "Saved notes via copy fallback, but failed to remove temp file: {cleanup}"
                    );
                }
                Ok(())
            }
            Err(copy) => Err(Error::Finalize { rename, copy }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, NoteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = NoteStore::open_dir(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn missing_and_blank_files_are_empty() {
        let (_dir, store) = store();
        assert_eq!(store.list().await.unwrap(), Vec::new());

        fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.list().await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn create_trims_and_persists() {
        let (_dir, store) = store();

        let note = store.create("  buy milk \n").await.unwrap();

        assert_eq!(note.text, "buy milk");
        assert_eq!(note.updated_at, None);
        let reopened = NoteStore::open_path(store.path().to_path_buf());
        assert_eq!(reopened.list().await.unwrap(), vec![note]);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn create_rejects_blank_text() {
        let (_dir, store) = store();

        let error = store.create(" \t\n").await.unwrap_err();

        assert_eq!(error.to_string(), "Note text cannot be empty");
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, store) = store();
        let first = store.create("first").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.create("second").await.unwrap();

        let ids = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|note| note.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn delete_removes_note_once() {
        let (_dir, store) = store();
        let note = store.create("x").await.unwrap();

        store.delete(&note.id).await.unwrap();
        let error = store.delete(&note.id).await.unwrap_err();

        assert_eq!(error.to_string(), "Note not found");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_reports_parse_error() {
        let (_dir, store) = store();
        fs::write(store.path(), "{ not json").unwrap();

        let error = store.list().await.unwrap_err();

        assert!(error.to_string().starts_with("Failed to parse notes file"));
    }

    #[tokio::test]
    async fn reads_notes_without_updated_at() {
        let (_dir, store) = store();
        fs::write(
            store.path(),
            r#"[{"id":"legacy","text":"old","created_at":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let notes = store.list().await.unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, NoteId::from("legacy"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_are_all_kept() {
        let (_dir, store) = store();

        let tasks = (0..16)
            .map(|index| {
                let store = store.clone();
                tokio::spawn(async move { store.create(&format!("note {index}")).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), 16);
    }
}
