//! Privileged clipboard writes performed by the backend process.

use crate::error::{Error, Result};

pub trait PrivilegedClipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// System clipboard through `arboard`. A handle is opened per write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl PrivilegedClipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|error| Error::ClipboardAccess(error.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|error| Error::ClipboardWrite(error.to_string()))
    }
}
