//! Read-side views for the reporting consumer.
//!
//! The consumer reads history plus a tentative entry for the page that is
//! still open, hands the batch to the classifier, and on success returns a
//! [`Handoff`] so the tracker can drop what was reported.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{HistoryEntry, OpenEntry, TrackerState};
use crate::reconcile::close;

/// Label used for pages that reported no title.
const UNKNOWN_TITLE: &str = "Unknown";

/// A read-only view of the tracker state at `taken_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_entry: Option<OpenEntry>,
    /// The open entry closed at `taken_at`, if it would be recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tentative: Option<HistoryEntry>,
}

/// Acknowledges that the oldest `sent` history entries, and the open
/// entry's time up to `as_of`, have been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub sent: usize,
    pub as_of: DateTime<Utc>,
}

/// Total time spent on one page title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub title: String,
    /// Distinct urls seen under this title, sorted.
    pub urls: Vec<String>,
    /// Seconds.
    pub duration: f64,
}

impl Snapshot {
    /// Builds a snapshot without mutating `state`.
    pub fn new(state: TrackerState, taken_at: DateTime<Utc>) -> Self {
        let tentative = state
            .current_entry
            .as_ref()
            .and_then(|entry| close(entry, taken_at));
        Self {
            taken_at,
            history: state.history,
            current_entry: state.current_entry,
            tentative,
        }
    }

    /// History followed by the tentative entry.
    pub fn batch(&self) -> Vec<HistoryEntry> {
        self.history
            .iter()
            .chain(self.tentative.as_ref())
            .cloned()
            .collect()
    }

    /// The acknowledgement to send back once the batch was processed.
    pub fn handoff(&self) -> Handoff {
        Handoff {
            sent: self.history.len(),
            as_of: self.taken_at,
        }
    }

    /// Total recorded seconds, including the tentative entry.
    pub fn total_secs(&self) -> f64 {
        self.history
            .iter()
            .chain(self.tentative.as_ref())
            .map(|entry| entry.duration)
            .sum()
    }
}

impl Handoff {
    /// Applies the acknowledgement to `state`.
    ///
    /// History is append-only, so the reported entries are always the
    /// oldest ones; anything appended after the snapshot is kept.
    pub fn apply(&self, state: &mut TrackerState) {
        let sent = self.sent.min(state.history.len());
        state.history.drain(..sent);
        if let Some(entry) = state.current_entry.as_mut() {
            if entry.start_time < self.as_of {
                entry.start_time = self.as_of;
            }
        }
    }
}

/// Sums durations per title, longest first.
pub fn aggregate(entries: &[HistoryEntry]) -> Vec<TitleSummary> {
    let mut totals: BTreeMap<&str, (f64, BTreeSet<&str>)> = BTreeMap::new();
    for entry in entries {
        let title = entry.title.trim();
        let title = if title.is_empty() { UNKNOWN_TITLE } else { title };
        let (duration, urls) = totals.entry(title).or_default();
        *duration += entry.duration;
        urls.insert(entry.url.as_str());
    }

    let mut summaries: Vec<TitleSummary> = totals
        .into_iter()
        .map(|(title, (duration, urls))| TitleSummary {
            title: title.to_string(),
            urls: urls.into_iter().map(String::from).collect(),
            duration,
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.duration
            .total_cmp(&a.duration)
            .then_with(|| a.title.cmp(&b.title))
    });
    summaries
}
