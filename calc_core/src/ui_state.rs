//! Active tab and angle unit.
//!
//! Two small state machines: `Basic ⇄ Scientific` (user tab clicks and
//! history replay) and `Deg ⇄ Rad`. Neither is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CalcError;
use crate::request::AngleMode;

/// Input panel shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Basic,
    Scientific,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Basic => write!(f, "basic"),
            Tab::Scientific => write!(f, "scientific"),
        }
    }
}

impl FromStr for Tab {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Tab::Basic),
            "scientific" | "sci" => Ok(Tab::Scientific),
            other => Err(CalcError::validation(format!(
                "Unknown tab: '{}'. Valid options: basic, scientific",
                other
            ))),
        }
    }
}

/// Transient UI state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiState {
    active_tab: Tab,
    angle_mode: AngleMode,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    /// Show `tab`. Returns whether the active tab changed.
    pub fn switch_tab(&mut self, tab: Tab) -> bool {
        let changed = self.active_tab != tab;
        if changed {
            debug!(from = %self.active_tab, to = %tab, "switching tab");
            self.active_tab = tab;
        }
        changed
    }

    /// Select an angle unit. Returns whether it changed.
    pub fn set_angle_mode(&mut self, mode: AngleMode) -> bool {
        let changed = self.angle_mode != mode;
        self.angle_mode = mode;
        changed
    }

    pub fn toggle_angle_mode(&mut self) -> AngleMode {
        self.angle_mode = self.angle_mode.toggled();
        self.angle_mode
    }
}
