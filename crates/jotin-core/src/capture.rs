//! Quick-capture surface: a draft, a submit path and reliable input focus.
//!
//! The capture surface is hidden and reshown rather than recreated, so on
//! every `capture-opened` broadcast it re-resolves its theme and starts a new
//! focus sequence.

use std::sync::Arc;

use tokio::sync::watch;

use crate::bus::{topics, Subscription, SurfaceBus};
use crate::commands::StorageClient;
use crate::config::CoreConfig;
use crate::error::StorageFailure;
use crate::focus::{FocusCoordinator, FocusTarget, FocusTrigger};
use crate::models::Note;
use crate::theme::{ThemeController, ThemeListener};
use crate::util::normalize_text;

/// What the capture surface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub draft: String,
    pub submitting: bool,
    pub error: Option<String>,
}

/// Result of a submit attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Note),
    /// The draft was blank; the surface was closed as if cancelled.
    Cancelled,
    /// Another submit was already in flight.
    Ignored,
}

enum SubmitStart {
    InFlight,
    Blank,
    Ready(String),
}

pub struct CaptureSurface {
    bus: SurfaceBus,
    client: StorageClient,
    theme: ThemeController,
    focus: Arc<FocusCoordinator>,
    state: watch::Sender<CaptureState>,
    _capture_opened: Subscription,
    _theme_listener: ThemeListener,
}

impl CaptureSurface {
    /// Wire the surface to the bus and start focusing the input.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        bus: SurfaceBus,
        client: StorageClient,
        theme: ThemeController,
        input: Arc<dyn FocusTarget>,
        config: &CoreConfig,
    ) -> Self {
        let focus = Arc::new(FocusCoordinator::new(input, config.focus));

        let reopened_theme = theme.clone();
        let reopened_focus = Arc::clone(&focus);
        let capture_opened = bus.subscribe(topics::CAPTURE_OPENED, move |_| {
            let mode = reopened_theme.reresolve();
            tracing::debug!("Capture surface reopened with {mode} theme");
            reopened_focus.trigger(FocusTrigger::CaptureReopened);
        });
        let theme_listener = theme.listen();
        focus.trigger(FocusTrigger::InitialMount);

        let (state, _) = watch::channel(CaptureState::default());
        Self {
            bus,
            client,
            theme,
            focus,
            state,
            _capture_opened: capture_opened,
            _theme_listener: theme_listener,
        }
    }

    pub fn state(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub const fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn focus(&self) -> &FocusCoordinator {
        &self.focus
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if state.draft == text {
                return false;
            }
            state.draft = text;
            true
        });
    }

    /// The window regained OS focus; take the input focus again.
    pub fn on_window_focus_regained(&self) {
        self.focus.trigger(FocusTrigger::WindowFocusRegained);
    }

    /// Save the draft as a new note.
    ///
    /// A blank draft closes the surface like [`CaptureSurface::cancel`]. On
    /// success the draft is cleared and the surface hides; on failure the
    /// draft is kept and the error shown inline.
    pub async fn submit(&self) -> Result<SubmitOutcome, StorageFailure> {
        let mut start = SubmitStart::InFlight;
        self.state.send_if_modified(|state| {
            if state.submitting {
                return false;
            }
            match normalize_text(&state.draft) {
                Some(text) => {
                    state.submitting = true;
                    state.error = None;
                    start = SubmitStart::Ready(text);
                    true
                }
                None => {
                    start = SubmitStart::Blank;
                    false
                }
            }
        });

        let text = match start {
            SubmitStart::InFlight => {
                tracing::debug!("Submit already in flight");
                return Ok(SubmitOutcome::Ignored);
            }
            SubmitStart::Blank => {
                self.cancel().await;
                return Ok(SubmitOutcome::Cancelled);
            }
            SubmitStart::Ready(text) => text,
        };

        match self.client.create(&text).await {
            Ok(note) => {
                tracing::info!("Captured note {}", note.id);
                self.state.send_modify(|state| {
                    state.draft.clear();
                    state.submitting = false;
                });
                self.client.close_capture_surface().await;
                Ok(SubmitOutcome::Created(note))
            }
            Err(error) => {
                tracing::error!("Failed to save note: {error}");
                let message = error.message().to_string();
                self.state.send_modify(|state| {
                    state.submitting = false;
                    state.error = Some(message);
                });
                Err(error)
            }
        }
    }

    /// Discard the draft and hide the surface.
    pub async fn cancel(&self) {
        self.state.send_if_modified(|state| {
            let changed = !state.draft.is_empty() || state.error.is_some();
            state.draft.clear();
            state.error = None;
            changed
        });
        self.client.close_capture_surface().await;
    }

    pub fn teardown(&self) {
        self.bus.teardown();
        self.focus.shutdown();
    }
}

impl Drop for CaptureSurface {
    fn drop(&mut self) {
        self.teardown();
    }
}
