//! Data models for Jotin

mod note;
mod theme;

pub use note::{Note, NoteId};
pub use theme::ThemeMode;
