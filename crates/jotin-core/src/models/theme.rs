//! Theme mode shared by every surface

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The opposite mode
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Parse a persisted or broadcast value. Only the exact lowercase names
    /// are recognized; anything else yields `None`.
    #[must_use]
    pub fn recognize(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Recognize a bus payload, which must be a JSON string holding a mode name.
    #[must_use]
    pub fn from_payload(payload: Option<&serde_json::Value>) -> Option<Self> {
        payload.and_then(serde_json::Value::as_str).and_then(Self::recognize)
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::recognize(s.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| format!("unknown theme '{s}' (expected light or dark)"))
    }
}
