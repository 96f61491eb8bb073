//! Command dispatcher: the backend side of the command channel.

use std::sync::Arc;

use async_trait::async_trait;
use jotin_core::bus::{topics, CAPTURE_SURFACE};
use jotin_core::{Command, CommandTransport, EventBus};
use serde_json::Value;

use crate::clipboard::PrivilegedClipboard;
use crate::error::{Error, Result};
use crate::store::NoteStore;
use crate::windows::WindowManager;

/// Executes [`Command`]s against the store, clipboard and windows, and
/// broadcasts `notes-changed` / `capture-opened` on the host bus.
#[derive(Clone)]
pub struct Backend {
    store: NoteStore,
    bus: EventBus,
    clipboard: Arc<dyn PrivilegedClipboard>,
    windows: Arc<dyn WindowManager>,
}

impl Backend {
    pub fn new(
        store: NoteStore,
        bus: EventBus,
        clipboard: Arc<dyn PrivilegedClipboard>,
        windows: Arc<dyn WindowManager>,
    ) -> Self {
        Self {
            store,
            bus,
            clipboard,
            windows,
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<Value> {
        match command {
            Command::CreateNote { text } => {
                let note = self.store.create(&text).await?;
                self.bus.publish(topics::NOTES_CHANGED, None);
                tracing::info!("Created note {}", note.id);
                serde_json::to_value(note).map_err(Error::Response)
            }
            Command::ListNotes => {
                let notes = self.store.list().await?;
                serde_json::to_value(notes).map_err(Error::Response)
            }
            Command::DeleteNote { id } => {
                self.store.delete(&id).await?;
                self.bus.publish(topics::NOTES_CHANGED, None);
                tracing::info!("Deleted note {id}");
                Ok(Value::Null)
            }
            Command::CopyNoteText { text } => {
                self.clipboard.set_text(&text)?;
                Ok(Value::Null)
            }
            Command::OpenQuickCapture => {
                self.windows.show(CAPTURE_SURFACE)?;
                self.windows.focus(CAPTURE_SURFACE)?;
                self.bus.publish(topics::CAPTURE_OPENED, None);
                Ok(Value::Null)
            }
            Command::CloseQuickCapture => {
                self.windows.hide(CAPTURE_SURFACE)?;
                Ok(Value::Null)
            }
            Command::ShowSurface { label } => {
                self.windows.show(&label)?;
                Ok(Value::Null)
            }
            Command::HideSurface { label } => {
                self.windows.hide(&label)?;
                Ok(Value::Null)
            }
            Command::FocusSurface { label } => {
                self.windows.focus(&label)?;
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl CommandTransport for Backend {
    async fn invoke(&self, command: Command) -> std::result::Result<Value, String> {
        let name = command.name();
        self.dispatch(command).await.map_err(|error| {
            tracing::debug!("Command {name} rejected: {error}");
            error.to_string()
        })
    }
}
