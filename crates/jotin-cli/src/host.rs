//! Wires the backend and both surfaces together for one CLI invocation.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jotin_backend::{
    default_config_path, Backend, FileThemeSlot, HeadlessWindows, NoteStore, SystemClipboard,
};
use jotin_core::bus::{CAPTURE_SURFACE, MAIN_SURFACE};
use jotin_core::capture::CaptureSurface;
use jotin_core::focus::FocusTarget;
use jotin_core::list::ListSurface;
use jotin_core::theme::{OsThemePreference, SystemPreference, ThemeController, ThemeSlot};
use jotin_core::{CoreConfig, EventBus, StorageClient, StorageFailure};

use crate::error::CliError;
use crate::native_clipboard::CommandClipboard;

/// Config file from `--config` or the platform config directory, then
/// environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<CoreConfig, CliError> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path);
    let config = match path {
        Some(path) => CoreConfig::load_from_path(&path)?,
        None => CoreConfig::default(),
    };
    Ok(config.apply_env()?)
}

/// The terminal prompt is always present and owns the keyboard.
#[derive(Default)]
struct TerminalInput {
    focused: AtomicBool,
}

impl FocusTarget for TerminalInput {
    fn is_mounted(&self) -> bool {
        true
    }

    fn focus_and_select(&self) {
        self.focused.store(true, Ordering::SeqCst);
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

pub struct Host {
    bus: EventBus,
    client: StorageClient,
    slot: Arc<dyn ThemeSlot>,
    system: Arc<dyn SystemPreference>,
    config: CoreConfig,
    list: ListSurface,
}

impl Host {
    /// Open the store in `data_dir` and mount the list surface.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(data_dir: &Path, config: CoreConfig) -> Result<Self, CliError> {
        let store = NoteStore::open_dir(data_dir)?;
        tracing::debug!("Using notes at {}", store.path().display());

        let bus = EventBus::new(config.bus_capacity);
        let backend = Backend::new(
            store,
            bus.clone(),
            Arc::new(SystemClipboard),
            Arc::new(HeadlessWindows::default()),
        );
        let client = StorageClient::new(Arc::new(backend));
        let slot: Arc<dyn ThemeSlot> = Arc::new(FileThemeSlot::in_dir(data_dir));
        let system: Arc<dyn SystemPreference> = Arc::new(OsThemePreference);

        let main_bus = bus.surface(MAIN_SURFACE);
        let theme = ThemeController::new(main_bus.clone(), Arc::clone(&slot), Arc::clone(&system));
        let list = ListSurface::mount(
            main_bus,
            client.clone(),
            theme,
            Arc::new(CommandClipboard::default()),
            &config,
        );

        Ok(Self {
            bus,
            client,
            slot,
            system,
            config,
            list,
        })
    }

    pub const fn list(&self) -> &ListSurface {
        &self.list
    }

    /// The list surface after its pending loads finished.
    ///
    /// A failed load is an error here since there is no UI to show it inline.
    pub async fn loaded_list(&self) -> Result<&ListSurface, CliError> {
        self.list.wait_until_settled().await;
        if let Some(error) = self.list.snapshot().list.error() {
            return Err(StorageFailure::new(error).into());
        }
        Ok(&self.list)
    }

    /// Mount a capture surface on the shared bus.
    pub fn mount_capture(&self) -> CaptureSurface {
        let capture_bus = self.bus.surface(CAPTURE_SURFACE);
        let theme = ThemeController::new(
            capture_bus.clone(),
            Arc::clone(&self.slot),
            Arc::clone(&self.system),
        );
        CaptureSurface::mount(
            capture_bus,
            self.client.clone(),
            theme,
            Arc::new(TerminalInput::default()),
            &self.config,
        )
    }
}
