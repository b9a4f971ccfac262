//! Interval reconciliation and the tracking starter.
//!
//! Both functions are pure: callers read the persisted state, call these,
//! and write the result back while still holding the tracker lock. A call
//! to [`reconcile`] must always be followed by clearing or replacing
//! `currentEntry` in the same step, otherwise the same span is counted
//! twice.

use chrono::{DateTime, Utc};

use crate::entry::{HistoryEntry, OpenEntry, Tab, TrackerState};

/// Intervals this short (in seconds) or shorter are dropped as tab flicker.
pub const MIN_RECORDED_SECS: f64 = 1.0;

/// Browser-internal pages that are never tracked.
pub const DEFAULT_IGNORED_PREFIXES: &[&str] = &["chrome://", "edge://", "about:"];

/// Seconds between `start` and `now`, with millisecond precision.
#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond spans stay far below 2^52"
)]
pub fn elapsed_secs(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - start).num_milliseconds() as f64 / 1000.0
}

/// Closes an open interval at `now`.
///
/// Returns `None` when the entry has no url or lasted `MIN_RECORDED_SECS`
/// or less (including negative spans from a clock that moved backwards).
pub fn close(entry: &OpenEntry, now: DateTime<Utc>) -> Option<HistoryEntry> {
    if entry.url.is_empty() {
        return None;
    }
    let duration = elapsed_secs(entry.start_time, now);
    if duration > MIN_RECORDED_SECS {
        Some(HistoryEntry {
            url: entry.url.clone(),
            title: entry.title.clone(),
            duration,
        })
    } else {
        None
    }
}

/// Folds the open interval of `state` into a copy of its history.
///
/// Does not clear `current_entry`; that is the caller's job.
pub fn reconcile(state: &TrackerState, now: DateTime<Utc>) -> Vec<HistoryEntry> {
    let mut history = state.history.clone();
    if let Some(closed) = state
        .current_entry
        .as_ref()
        .and_then(|entry| close(entry, now))
    {
        history.push(closed);
    }
    history
}

/// Returns `true` if `url` starts with one of the ignored prefixes.
pub fn is_ignored<P: AsRef<str>>(url: &str, ignored: &[P]) -> bool {
    ignored
        .iter()
        .any(|prefix| url.starts_with(prefix.as_ref()))
}

/// Builds the open interval for `tab`, or `None` if it must not be tracked.
pub fn start_tracking<P: AsRef<str>>(
    tab: Option<&Tab>,
    now: DateTime<Utc>,
    ignored: &[P],
) -> Option<OpenEntry> {
    let tab = tab?;
    let url = tab.url.as_deref().filter(|url| !url.is_empty())?;
    if is_ignored(url, ignored) {
        return None;
    }
    Some(OpenEntry {
        url: url.to_string(),
        title: tab.title.clone().unwrap_or_default(),
        start_time: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::TabId;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn open(url: &str, start_ms: i64) -> OpenEntry {
        OpenEntry {
            url: url.to_string(),
            title: "Title".to_string(),
            start_time: at(start_ms),
        }
    }

    fn tab(url: Option<&str>) -> Tab {
        Tab {
            id: TabId(1),
            window_id: None,
            url: url.map(String::from),
            title: Some("Title".to_string()),
            active: true,
        }
    }

    #[test]
    fn close_records_duration_in_seconds() {
        let closed = close(&open("https://a.com", 0), at(5000)).unwrap();
        assert_eq!(closed.url, "https://a.com");
        assert!((closed.duration - 5.0).abs() < 1e-9);

        let closed = close(&open("https://a.com", 1000), at(3250)).unwrap();
        assert!((closed.duration - 2.25).abs() < 1e-9);
    }

    #[test]
    fn close_discards_at_or_below_threshold() {
        assert!(close(&open("https://a.com", 0), at(500)).is_none());
        assert!(close(&open("https://a.com", 0), at(1000)).is_none());
        assert!(close(&open("https://a.com", 0), at(1001)).is_some());
    }

    #[test]
    fn close_discards_backwards_clock() {
        assert!(close(&open("https://a.com", 10_000), at(0)).is_none());
    }

    #[test]
    fn close_ignores_entry_without_url() {
        assert!(close(&open("", 0), at(60_000)).is_none());
    }

    #[test]
    fn reconcile_without_open_entry_keeps_history() {
        let state = TrackerState {
            current_entry: None,
            history: vec![HistoryEntry {
                url: "https://a.com".to_string(),
                title: "A".to_string(),
                duration: 4.0,
            }],
        };
        assert_eq!(reconcile(&state, at(10_000)), state.history);
    }

    #[test]
    fn reconcile_appends_after_existing_history() {
        let state = TrackerState {
            current_entry: Some(open("https://b.com", 2000)),
            history: vec![HistoryEntry {
                url: "https://a.com".to_string(),
                title: "A".to_string(),
                duration: 2.0,
            }],
        };
        let history = reconcile(&state, at(9000));
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].url, "https://b.com");
        assert!((history[1].duration - 7.0).abs() < 1e-9);
    }

    #[test]
    fn start_tracking_skips_ignored_schemes() {
        for url in ["chrome://settings", "edge://newtab", "about:blank"] {
            assert!(
                start_tracking(Some(&tab(Some(url))), at(0), DEFAULT_IGNORED_PREFIXES).is_none(),
                "{url} should not be tracked"
            );
        }
    }

    #[test]
    fn start_tracking_requires_tab_and_url() {
        assert!(start_tracking(None, at(0), DEFAULT_IGNORED_PREFIXES).is_none());
        assert!(start_tracking(Some(&tab(None)), at(0), DEFAULT_IGNORED_PREFIXES).is_none());
        assert!(start_tracking(Some(&tab(Some(""))), at(0), DEFAULT_IGNORED_PREFIXES).is_none());
    }

    #[test]
    fn start_tracking_opens_entry_at_now() {
        let entry = start_tracking(
            Some(&tab(Some("https://a.com/page"))),
            at(1234),
            DEFAULT_IGNORED_PREFIXES,
        )
        .unwrap();
        assert_eq!(entry, open("https://a.com/page", 1234));
    }

    #[test]
    fn start_tracking_uses_custom_prefixes() {
        let ignored = vec!["https://intranet.".to_string()];
        assert!(
            start_tracking(Some(&tab(Some("https://intranet.corp/x"))), at(0), &ignored).is_none()
        );
        assert!(start_tracking(Some(&tab(Some("about:blank"))), at(0), &ignored).is_some());
    }
}
