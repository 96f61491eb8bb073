//! Error types for the reference backend.
//!
//! Display strings double as the messages surfaces show, so they are phrased
//! for users.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Note text cannot be empty")]
    EmptyNote,

    #[error("Note not found")]
    NoteNotFound,

    #[error("Failed to create data directory: {0}")]
    CreateDataDir(#[source] io::Error),

    #[error("Could not determine the data directory")]
    NoDataDir,

    #[error("Failed to read notes file: {0}")]
    ReadNotes(#[source] io::Error),

    #[error("Failed to parse notes file: {0}")]
    ParseNotes(#[source] serde_json::Error),

    #[error("Failed to serialize notes payload: {0}")]
    SerializeNotes(#[source] serde_json::Error),

    #[error("Failed to write temp notes file: {0}")]
    WriteTemp(#[source] io::Error),

    #[error("Failed to finalize notes file. rename error: {rename}; copy error: {copy}")]
    Finalize { rename: io::Error, copy: io::Error },

    #[error("Failed to access clipboard: {0}")]
    ClipboardAccess(String),

    #[error("Failed to copy note: {0}")]
    ClipboardWrite(String),

    #[error("Unknown surface '{0}'")]
    UnknownSurface(String),

    #[error("Failed to encode response: {0}")]
    Response(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
