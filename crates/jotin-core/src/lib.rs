//! jotin-core - Core library for Jotin
//!
//! This crate contains the coordination core shared by the capture and list
//! surfaces: note models, the cross-surface event bus, the typed command
//! client for the storage backend, and the synchronization protocols that
//! keep independently rendered surfaces consistent with each other.

pub mod bus;
pub mod capture;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod deletion;
pub mod error;
pub mod focus;
pub mod list;
pub mod models;
pub mod theme;
pub mod util;

pub use bus::{BusEvent, EventBus, Subscription, SurfaceBus};
pub use commands::{Command, CommandTransport, StorageClient};
pub use config::CoreConfig;
pub use error::{ClipboardFailure, Error, Result, StorageFailure};
pub use models::{Note, NoteId, ThemeMode};
