//! Window management seam.
//!
//! Hosts with real windows implement [`WindowManager`]; [`HeadlessWindows`]
//! tracks visibility for terminal hosts and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use jotin_core::bus::{CAPTURE_SURFACE, MAIN_SURFACE};

use crate::error::{Error, Result};

pub trait WindowManager: Send + Sync {
    fn show(&self, label: &str) -> Result<()>;
    fn hide(&self, label: &str) -> Result<()>;
    fn focus(&self, label: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowState {
    pub visible: bool,
    pub focused: bool,
}

/// In-memory windows for the `main` and `capture` surfaces.
#[derive(Debug)]
pub struct HeadlessWindows {
    windows: Mutex<BTreeMap<String, WindowState>>,
}

impl Default for HeadlessWindows {
    fn default() -> Self {
        let windows = [MAIN_SURFACE, CAPTURE_SURFACE]
            .into_iter()
            .map(|label| (label.to_string(), WindowState::default()))
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }
}

impl HeadlessWindows {
    pub fn state(&self, label: &str) -> Option<WindowState> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .copied()
    }

    fn update(&self, label: &str, apply: impl FnOnce(&mut WindowState)) -> Result<()> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows
            .get_mut(label)
            .ok_or_else(|| Error::UnknownSurface(label.to_string()))?;
        apply(window);
        Ok(())
    }
}

impl WindowManager for HeadlessWindows {
    fn show(&self, label: &str) -> Result<()> {
        self.update(label, |window| window.visible = true)
    }

    fn hide(&self, label: &str) -> Result<()> {
        self.update(label, |window| {
            window.visible = false;
            window.focused = false;
        })
    }

    fn focus(&self, label: &str) -> Result<()> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        if !windows.contains_key(label) {
            return Err(Error::UnknownSurface(label.to_string()));
        }
        for (name, window) in windows.iter_mut() {
            window.focused = name == label && window.visible;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn show_focus_hide_cycle() {
        let windows = HeadlessWindows::default();

        windows.show(CAPTURE_SURFACE).unwrap();
        windows.focus(CAPTURE_SURFACE).unwrap();
        assert_eq!(
            windows.state(CAPTURE_SURFACE),
            Some(WindowState {
                visible: true,
                focused: true
            })
        );

        windows.hide(CAPTURE_SURFACE).unwrap();
        assert_eq!(windows.state(CAPTURE_SURFACE), Some(WindowState::default()));
    }

    #[test]
    fn focusing_hidden_window_does_not_focus() {
        let windows = HeadlessWindows::default();

        windows.focus(MAIN_SURFACE).unwrap();

        assert!(!windows.state(MAIN_SURFACE).unwrap().focused);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let windows = HeadlessWindows::default();

        let error = windows.show("settings").unwrap_err();

        assert_eq!(error.to_string(), "Unknown surface 'settings'");
    }
}
