//! jotin-backend - Reference storage and window backend for Jotin
//!
//! Implements the command channel the surfaces talk to: a JSON-file note
//! store, a privileged clipboard, a persisted theme slot and a window manager
//! seam, all behind one [`Backend`] dispatcher.

pub mod clipboard;
pub mod dispatch;
pub mod error;
pub mod paths;
pub mod store;
pub mod theme_slot;
pub mod windows;

pub use clipboard::{PrivilegedClipboard, SystemClipboard};
pub use dispatch::Backend;
pub use error::{Error, Result};
pub use paths::{default_config_path, resolve_data_dir};
pub use store::NoteStore;
pub use theme_slot::FileThemeSlot;
pub use windows::{HeadlessWindows, WindowManager, WindowState};
