//! Runtime configuration for the coordination core.
//!
//! Timing constants for focus acquisition and copy feedback live here so call
//! sites never hardcode them. Values come from an optional JSON file and can be
//! overridden through environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of focus attempts per trigger.
pub const DEFAULT_FOCUS_ATTEMPTS: u32 = 8;
/// Delay before retrying when the input element is not mounted yet (one frame).
pub const DEFAULT_MISSING_ELEMENT_DELAY_MS: u64 = 16;
/// Delay before retrying when focus was requested but not acquired.
pub const DEFAULT_FOCUS_RETRY_DELAY_MS: u64 = 40;
/// Delay of the extra focus sequence started after a re-open broadcast.
pub const DEFAULT_REOPEN_FOLLOWUP_DELAY_MS: u64 = 120;
/// How long a note shows the "copied" indicator.
pub const DEFAULT_COPY_FEEDBACK_MS: u64 = 1500;
/// Buffered events per subscriber before the oldest are skipped.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

const ENV_FOCUS_ATTEMPTS: &str = "JOTIN_FOCUS_ATTEMPTS";
const ENV_FOCUS_MISSING_MS: &str = "JOTIN_FOCUS_MISSING_MS";
const ENV_FOCUS_RETRY_MS: &str = "JOTIN_FOCUS_RETRY_MS";
const ENV_FOCUS_FOLLOWUP_MS: &str = "JOTIN_FOCUS_FOLLOWUP_MS";
const ENV_COPY_FEEDBACK_MS: &str = "JOTIN_COPY_FEEDBACK_MS";

/// Focus-acquisition budget and delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FocusConfig {
    pub attempts: u32,
    pub missing_element_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub reopen_followup_delay_ms: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_FOCUS_ATTEMPTS,
            missing_element_delay_ms: DEFAULT_MISSING_ELEMENT_DELAY_MS,
            retry_delay_ms: DEFAULT_FOCUS_RETRY_DELAY_MS,
            reopen_followup_delay_ms: DEFAULT_REOPEN_FOLLOWUP_DELAY_MS,
        }
    }
}

impl FocusConfig {
    #[must_use]
    pub const fn missing_element_delay(&self) -> Duration {
        Duration::from_millis(self.missing_element_delay_ms)
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub const fn reopen_followup_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_followup_delay_ms)
    }
}

/// Configuration shared by every surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub focus: FocusConfig,
    pub copy_feedback_ms: u64,
    pub bus_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            focus: FocusConfig::default(),
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub const fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("failed to parse {}: {error}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = parse_override::<u32>(&lookup, ENV_FOCUS_ATTEMPTS)? {
            self.focus.attempts = value;
        }
        if let Some(value) = parse_override::<u64>(&lookup, ENV_FOCUS_MISSING_MS)? {
            self.focus.missing_element_delay_ms = value;
        }
        if let Some(value) = parse_override::<u64>(&lookup, ENV_FOCUS_RETRY_MS)? {
            self.focus.retry_delay_ms = value;
        }
        if let Some(value) = parse_override::<u64>(&lookup, ENV_FOCUS_FOLLOWUP_MS)? {
            self.focus.reopen_followup_delay_ms = value;
        }
        if let Some(value) = parse_override::<u64>(&lookup, ENV_COPY_FEEDBACK_MS)? {
            self.copy_feedback_ms = value;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.focus.attempts == 0 {
            return Err(Error::Config(
                "focus.attempts must be at least 1".to_string(),
            ));
        }
        if self.bus_capacity == 0 {
            return Err(Error::Config("bus_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}
