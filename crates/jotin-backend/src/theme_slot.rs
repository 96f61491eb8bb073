//! Theme slot persisted as a one-word file next to the notes.

use std::fs;
use std::path::{Path, PathBuf};

use jotin_core::theme::ThemeSlot;
use jotin_core::ThemeMode;

pub const THEME_FILE_NAME: &str = "theme";

#[derive(Debug, Clone)]
pub struct FileThemeSlot {
    path: PathBuf,
}

impl FileThemeSlot {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(THEME_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeSlot for FileThemeSlot {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw.trim().to_string()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
            Err(error) => {
                tracing::warn!("Failed to read theme from {}: {error}", self.path.display());
                None
            }
        }
    }

    fn write(&self, mode: ThemeMode) -> jotin_core::Result<()> {
        fs::write(&self.path, mode.as_str())?;
        Ok(())
    }
}
