use std::io;

use jotin_core::{ClipboardFailure, StorageFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jotin_core::Error),
    #[error(transparent)]
    Backend(#[from] jotin_backend::Error),
    #[error(transparent)]
    Storage(#[from] StorageFailure),
    #[error(transparent)]
    Clipboard(#[from] ClipboardFailure),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
}
