//! Typed request/response client for the storage backend.
//!
//! Surfaces never touch persistence directly: every operation is a
//! [`Command`] sent over a [`CommandTransport`] and answered with a JSON value
//! or an error message. [`StorageClient`] wraps the transport with typed calls.
//! Calls are neither queued nor retried and may run concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageFailure;
use crate::models::{Note, NoteId};
use crate::util::compact_text;

/// A request understood by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    CreateNote { text: String },
    ListNotes,
    DeleteNote { id: NoteId },
    CopyNoteText { text: String },
    OpenQuickCapture,
    CloseQuickCapture,
    ShowSurface { label: String },
    HideSurface { label: String },
    FocusSurface { label: String },
}

impl Command {
    /// Wire name of the command, used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateNote { .. } => "create_note",
            Self::ListNotes => "list_notes",
            Self::DeleteNote { .. } => "delete_note",
            Self::CopyNoteText { .. } => "copy_note_text",
            Self::OpenQuickCapture => "open_quick_capture",
            Self::CloseQuickCapture => "close_quick_capture",
            Self::ShowSurface { .. } => "show_surface",
            Self::HideSurface { .. } => "hide_surface",
            Self::FocusSurface { .. } => "focus_surface",
        }
    }
}

/// Channel carrying commands to the backend.
///
/// A successful response is a JSON value (`null` for commands without a
/// result); a rejected command yields the backend's error message.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn invoke(&self, command: Command) -> Result<Value, String>;
}

/// Typed wrapper over a [`CommandTransport`].
#[derive(Clone)]
pub struct StorageClient {
    transport: Arc<dyn CommandTransport>,
}

impl StorageClient {
    pub fn new(transport: Arc<dyn CommandTransport>) -> Self {
        Self { transport }
    }

    /// Create a note from `text`. The backend trims and validates it.
    pub async fn create(&self, text: &str) -> Result<Note, StorageFailure> {
        self.request(Command::CreateNote {
            text: text.to_string(),
        })
        .await
    }

    /// List all notes in backend display order.
    pub async fn list(&self) -> Result<Vec<Note>, StorageFailure> {
        self.request(Command::ListNotes).await
    }

    pub async fn delete(&self, id: &NoteId) -> Result<(), StorageFailure> {
        self.send(Command::DeleteNote { id: id.clone() }).await
    }

    /// Privileged clipboard write performed by the backend process.
    pub async fn copy_to_system_clipboard(&self, text: &str) -> Result<(), StorageFailure> {
        self.send(Command::CopyNoteText {
            text: text.to_string(),
        })
        .await
    }

    /// Ask the window manager to show the capture surface.
    ///
    /// The error is soft: callers surface it inline and carry on.
    pub async fn open_capture_surface(&self) -> Result<(), StorageFailure> {
        self.send(Command::OpenQuickCapture).await
    }

    /// Hide the capture surface. Best-effort.
    pub async fn close_capture_surface(&self) {
        self.best_effort(Command::CloseQuickCapture).await;
    }

    pub async fn show_surface(&self, label: &str) {
        self.best_effort(Command::ShowSurface {
            label: label.to_string(),
        })
        .await;
    }

    pub async fn hide_surface(&self, label: &str) {
        self.best_effort(Command::HideSurface {
            label: label.to_string(),
        })
        .await;
    }

    pub async fn focus_surface(&self, label: &str) {
        self.best_effort(Command::FocusSurface {
            label: label.to_string(),
        })
        .await;
    }

    async fn request<T: DeserializeOwned>(&self, command: Command) -> Result<T, StorageFailure> {
        let name = command.name();
        let value = self.invoke(command).await?;
        serde_json::from_value(value).map_err(|error| {
            StorageFailure::new(format!("Invalid response to {name}: {error}"))
        })
    }

    async fn send(&self, command: Command) -> Result<(), StorageFailure> {
        self.invoke(command).await.map(|_| ())
    }

    async fn best_effort(&self, command: Command) {
        let name = command.name();
        if let Err(error) = self.invoke(command).await {
            tracing::debug!("Ignoring failed {name}: {error}");
        }
    }

    async fn invoke(&self, command: Command) -> Result<Value, StorageFailure> {
        let name = command.name();
        tracing::debug!("Invoking {name}");
        self.transport.invoke(command).await.map_err(|message| {
            tracing::warn!("{name} failed: {}", compact_text(&message));
            StorageFailure::new(message)
        })
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::testing::ScriptedTransport;
    use super::*;

    fn client() -> (Arc<ScriptedTransport>, StorageClient) {
        let transport = Arc::new(ScriptedTransport::default());
        let client = StorageClient::new(transport.clone());
        (transport, client)
    }

    #[test]
    fn commands_serialize_with_tag() {
        let value = serde_json::to_value(Command::DeleteNote { id: "n-1".into() }).unwrap();
        assert_eq!(value, json!({ "cmd": "delete_note", "id": "n-1" }));
        assert_eq!(
            serde_json::to_value(Command::ListNotes).unwrap(),
            json!({ "cmd": "list_notes" })
        );
    }

    #[tokio::test]
    async fn create_decodes_note() {
        let (transport, client) = client();
        let note = Note::new("n-1", "buy milk");
        transport.reply(Ok(serde_json::to_value(&note).unwrap()));

        let created = client.create("buy milk").await.unwrap();

        assert_eq!(created, note);
        assert_eq!(
            transport.invoked(),
            vec![Command::CreateNote {
                text: "buy milk".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn rejected_command_becomes_storage_failure() {
        let (transport, client) = client();
        transport.reply(Err("Note not found".to_string()));

        let error = client.delete(&NoteId::from("missing")).await.unwrap_err();

        assert_eq!(error.message(), "Note not found");
    }

    #[tokio::test]
    async fn malformed_response_is_a_storage_failure() {
        let (transport, client) = client();
        transport.reply(Ok(json!({ "unexpected": true })));

        let error = client.list().await.unwrap_err();

        assert!(error.message().starts_with("Invalid response to list_notes"));
    }

    #[tokio::test]
    async fn best_effort_commands_swallow_errors() {
        let (transport, client) = client();
        transport.reply(Err("no such window".to_string()));

        client.hide_surface("capture").await;

        assert_eq!(transport.count("hide_surface"), 1);
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let (transport, client) = client();
        transport.reply(Err("disk full".to_string()));

        assert!(client.create("x").await.is_err());
        assert_eq!(transport.count("create_note"), 1);
    }
}
