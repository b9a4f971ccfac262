//! Tracked intervals and the persisted tracker state.
//!
//! The persisted state is a two-key blob: `currentEntry` (the open
//! interval, if any) and `history` (closed intervals, oldest first).
//! Field names follow the browser storage layout so a state written by
//! the host extension can be read back unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generates an integer ID newtype as handed out by the browser.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw browser-assigned value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_numeric_id!(
    /// A browser tab identifier.
    TabId
);

define_numeric_id!(
    /// A browser window identifier.
    ///
    /// [`WindowId::NONE`] is the sentinel the browser reports when no
    /// window has focus.
    WindowId
);

impl WindowId {
    /// "No window focused".
    pub const NONE: Self = Self(-1);

    /// Returns `true` for the no-focus sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// A browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    /// Absent when the host has no permission to read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// The open interval: tracking is active for this page since `start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEntry {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Stored as milliseconds since the Unix epoch.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
}

/// A closed interval appended to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Seconds the page was frontmost.
    pub duration: f64,
}

/// Everything the tracker persists between invocations.
///
/// Missing keys deserialize to their empty defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerState {
    pub current_entry: Option<OpenEntry>,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_entry_uses_millisecond_start_time() {
        let entry = OpenEntry {
            url: "https://b.com".to_string(),
            title: "B".to_string(),
            start_time: DateTime::from_timestamp_millis(5000).unwrap(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "https://b.com", "title": "B", "startTime": 5000})
        );
    }

    #[test]
    fn state_defaults_missing_keys() {
        let state: TrackerState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, TrackerState::default());

        let state: TrackerState =
            serde_json::from_str(r#"{"currentEntry":null,"history":[{"url":"https://a.com","duration":3.5}]}"#)
                .unwrap();
        assert!(state.current_entry.is_none());
        assert_eq!(state.history[0].title, "");
        assert!((state.history[0].duration - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn window_none_sentinel() {
        assert!(WindowId::NONE.is_none());
        assert!(!WindowId(3).is_none());
        let parsed: WindowId = serde_json::from_str("-1").unwrap();
        assert!(parsed.is_none());
    }
}
