//! Browser lifecycle signals delivered by the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::{Tab, TabId, WindowId};

/// A lifecycle signal, one per host callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// The user switched to another tab.
    TabActivated {
        tab_id: TabId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_id: Option<WindowId>,
    },
    /// A tab changed (navigation, reload, title update).
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        change_info: ChangeInfo,
        tab: Tab,
    },
    /// Window focus moved; [`WindowId::NONE`] when the browser lost focus.
    WindowFocusChanged { window_id: WindowId },
    /// The system idle detector changed state.
    IdleStateChanged { state: IdleState },
    /// The host process (re)started.
    Startup {
        #[serde(default)]
        reason: StartupReason,
    },
}

/// The changed properties of a tab update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoadStatus>,
}

/// Tab loading status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Why the host process started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupReason {
    #[default]
    Startup,
    Installed,
    Updated,
    Wake,
}

/// System idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl IdleState {
    /// Returns `true` when the user is away (idle or locked).
    #[must_use]
    pub const fn is_away(self) -> bool {
        matches!(self, Self::Idle | Self::Locked)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IdleState {
    type Err = UnknownIdleState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "idle" => Ok(Self::Idle),
            "locked" => Ok(Self::Locked),
            _ => Err(UnknownIdleState(s.to_string())),
        }
    }
}

impl Serialize for IdleState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdleState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown idle state strings.
#[derive(Debug, Clone)]
pub struct UnknownIdleState(String);

impl fmt::Display for UnknownIdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown idle state: {}", self.0)
    }
}

impl std::error::Error for UnknownIdleState {}
