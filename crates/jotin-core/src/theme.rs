//! Theme synchronization between surfaces.
//!
//! Surfaces share no memory, so the theme is kept consistent by a
//! last-writer-wins protocol: a toggle applies locally, persists to the shared
//! slot and broadcasts `theme-changed`. Every surface adopts recognized
//! payloads verbatim and, where the slot offers change notifications, also
//! follows the slot.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::{topics, Subscription, SurfaceBus};
use crate::error::Result;
use crate::models::ThemeMode;

/// The single persisted theme slot.
pub trait ThemeSlot: Send + Sync {
    /// Raw persisted value, if any.
    fn read(&self) -> Option<String>;

    fn write(&self, mode: ThemeMode) -> Result<()>;

    /// Native change notifications, when the backing store provides them.
    fn watch(&self) -> Option<watch::Receiver<Option<String>>> {
        None
    }
}

/// OS-reported color scheme preference.
pub trait SystemPreference: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Resolve a theme from scratch: persisted value if recognized, else OS preference.
pub fn resolve_theme(slot: &dyn ThemeSlot, system: &dyn SystemPreference) -> ThemeMode {
    if let Some(mode) = slot.read().as_deref().and_then(ThemeMode::recognize) {
        return mode;
    }
    if system.prefers_dark() {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    }
}

/// Per-surface theme state wired to the bus and the shared slot.
#[derive(Clone)]
pub struct ThemeController {
    inner: Arc<ThemeInner>,
}

struct ThemeInner {
    bus: SurfaceBus,
    slot: Arc<dyn ThemeSlot>,
    system: Arc<dyn SystemPreference>,
    mode: watch::Sender<ThemeMode>,
}

impl ThemeController {
    /// Create a controller holding the initially resolved theme.
    pub fn new(
        bus: SurfaceBus,
        slot: Arc<dyn ThemeSlot>,
        system: Arc<dyn SystemPreference>,
    ) -> Self {
        let initial = resolve_theme(slot.as_ref(), system.as_ref());
        tracing::debug!("Surface '{}' starts with {initial} theme", bus.label());
        let (mode, _) = watch::channel(initial);
        Self {
            inner: Arc::new(ThemeInner {
                bus,
                slot,
                system,
                mode,
            }),
        }
    }

    pub fn current(&self) -> ThemeMode {
        *self.inner.mode.borrow()
    }

    /// Receiver notified whenever the local theme changes.
    pub fn changes(&self) -> watch::Receiver<ThemeMode> {
        self.inner.mode.subscribe()
    }

    /// User-initiated toggle. Returns the new mode.
    pub fn toggle(&self) -> ThemeMode {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    /// Apply locally, persist, then broadcast.
    ///
    /// A persist failure is logged; the local change and the broadcast still happen.
    pub fn set(&self, mode: ThemeMode) {
        self.apply(mode);
        if let Err(error) = self.inner.slot.write(mode) {
            tracing::warn!("Failed to persist theme preference: {error}");
        }
        self.inner
            .bus
            .publish(topics::THEME_CHANGED, Some(Value::from(mode.as_str())));
        tracing::info!("Theme switched to {mode}");
    }

    /// Adopt a broadcast payload. Returns `false` for unrecognized payloads.
    pub fn apply_payload(&self, payload: Option<&Value>) -> bool {
        match ThemeMode::from_payload(payload) {
            Some(mode) => {
                self.apply(mode);
                true
            }
            None => {
                tracing::debug!("Ignoring unrecognized theme payload: {payload:?}");
                false
            }
        }
    }

    /// Resolve again from the slot and OS preference, e.g. after being reshown.
    pub fn reresolve(&self) -> ThemeMode {
        let mode = resolve_theme(self.inner.slot.as_ref(), self.inner.system.as_ref());
        self.apply(mode);
        mode
    }

    /// Start following `theme-changed` broadcasts and slot notifications.
    ///
    /// Listening stops when the returned guard is dropped or the surface is
    /// torn down.
    pub fn listen(&self) -> ThemeListener {
        let controller = self.clone();
        let subscription = self
            .inner
            .bus
            .subscribe(topics::THEME_CHANGED, move |event| {
                controller.apply_payload(event.payload.as_ref());
            });

        let watcher = self.inner.slot.watch().map(|receiver| self.spawn_slot_watcher(receiver));

        ThemeListener {
            _subscription: subscription,
            watcher,
        }
    }

    fn spawn_slot_watcher(&self, mut receiver: watch::Receiver<Option<String>>) -> JoinHandle<()> {
        let controller = self.clone();
        let closed = self.inner.bus.closed();
        tokio::spawn(async move {
            tokio::pin!(closed);
            loop {
                tokio::select! {
                    biased;
                    () = &mut closed => break,
                    changed = receiver.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let value = receiver.borrow_and_update().clone();
                        match value.as_deref().and_then(ThemeMode::recognize) {
                            Some(mode) => controller.apply(mode),
                            None => tracing::debug!("Ignoring unrecognized theme slot value: {value:?}"),
                        }
                    }
                }
            }
        })
    }

    fn apply(&self, mode: ThemeMode) {
        let changed = self.inner.mode.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            tracing::debug!("Surface '{}' applied {mode} theme", self.inner.bus.label());
        }
    }
}

/// Keeps a controller following remote theme changes.
pub struct ThemeListener {
    _subscription: Subscription,
    watcher: Option<JoinHandle<()>>,
}

impl Drop for ThemeListener {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

/// In-memory slot with change notifications, shared by cloning.
#[derive(Clone)]
pub struct MemoryThemeSlot {
    value: Arc<watch::Sender<Option<String>>>,
}

impl MemoryThemeSlot {
    pub fn new(initial: Option<&str>) -> Self {
        let (value, _) = watch::channel(initial.map(str::to_string));
        Self {
            value: Arc::new(value),
        }
    }

    /// Store an arbitrary raw value, as another process might.
    pub fn store_raw(&self, raw: impl Into<String>) {
        self.value.send_replace(Some(raw.into()));
    }
}

impl Default for MemoryThemeSlot {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ThemeSlot for MemoryThemeSlot {
    fn read(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn write(&self, mode: ThemeMode) -> Result<()> {
        self.value.send_replace(Some(mode.as_str().to_string()));
        Ok(())
    }

    fn watch(&self) -> Option<watch::Receiver<Option<String>>> {
        Some(self.value.subscribe())
    }
}

/// Fixed preference, for hosts that already know the answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPreference {
    pub dark: bool,
}

impl SystemPreference for FixedPreference {
    fn prefers_dark(&self) -> bool {
        self.dark
    }
}

/// First probe result, shared by every surface in the process.
static SYSTEM_DARK_MODE: OnceLock<bool> = OnceLock::new();

/// Preference probed from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsThemePreference;

impl SystemPreference for OsThemePreference {
    fn prefers_dark(&self) -> bool {
        *SYSTEM_DARK_MODE.get_or_init(|| {
            let detected = probe_dark_mode();
            match detected {
                Some(dark) => tracing::debug!(
                    "OS prefers {} surfaces",
                    if dark { ThemeMode::Dark } else { ThemeMode::Light }
                ),
                None => tracing::debug!("OS theme unknown; surfaces start light"),
            }
            detected.unwrap_or(false)
        })
    }
}

/// `reg query` prints `AppsUseLightTheme    REG_DWORD    0x0` when apps run dark.
#[cfg(any(target_os = "windows", test))]
fn reg_reports_dark(stdout: &str) -> Option<bool> {
    let value = stdout
        .lines()
        .find(|line| line.contains("AppsUseLightTheme"))?
        .split_whitespace()
        .last()?;
    Some(value == "0x0")
}

/// `defaults read -g AppleInterfaceStyle` prints `Dark` or fails when light.
#[cfg(any(target_os = "macos", test))]
fn interface_style_is_dark(stdout: &str) -> bool {
    stdout.trim().eq_ignore_ascii_case("dark")
}

#[cfg(any(target_os = "linux", test))]
fn gtk_theme_is_dark(theme: &str) -> bool {
    theme.to_lowercase().contains("dark")
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn run_probe(program: &str, args: &[&str]) -> Option<String> {
    match std::process::Command::new(program).args(args).output() {
        Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Err(error) => {
            tracing::warn!("Could not run {program} to read the OS theme: {error}");
            None
        }
    }
}

#[cfg(target_os = "windows")]
fn probe_dark_mode() -> Option<bool> {
    let stdout = run_probe(
        "reg",
        &[
            "query",
            r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Themes\Personalize",
            "/v",
            "AppsUseLightTheme",
        ],
    )?;
    reg_reports_dark(&stdout)
}

#[cfg(target_os = "macos")]
fn probe_dark_mode() -> Option<bool> {
    run_probe("defaults", &["read", "-g", "AppleInterfaceStyle"])
        .map(|stdout| interface_style_is_dark(&stdout))
}

#[cfg(target_os = "linux")]
fn probe_dark_mode() -> Option<bool> {
    std::env::var("GTK_THEME")
        .ok()
        .map(|theme| gtk_theme_is_dark(&theme))
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn probe_dark_mode() -> Option<bool> {
    None
}
