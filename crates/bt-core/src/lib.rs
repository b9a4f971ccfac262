//! Core domain logic for the browser time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Reconciliation: closing the open interval into history
//! - Dispatch: mapping browser lifecycle signals to transitions
//! - Tracking: the serialized [`Tracker`] that owns the persisted state
//! - Reporting: snapshots and per-title aggregates for the classifier

pub mod browser;
pub mod dispatch;
pub mod entry;
pub mod reconcile;
pub mod report;
pub mod signal;
pub mod store;
mod tracker;

pub use browser::{Browser, BrowserError, BrowserSnapshot};
pub use dispatch::{Next, Plan, Reconcile, Target, Transition};
pub use entry::{HistoryEntry, OpenEntry, Tab, TabId, TrackerState, WindowId};
pub use reconcile::{
    DEFAULT_IGNORED_PREFIXES, MIN_RECORDED_SECS, close, is_ignored, reconcile, start_tracking,
};
pub use report::{Handoff, Snapshot, TitleSummary, aggregate};
pub use signal::{ChangeInfo, IdleState, LoadStatus, Signal, StartupReason, UnknownIdleState};
pub use store::{MemoryStore, StateStore};
pub use tracker::{HandoffError, Outcome, Tracker, TrackerConfig};
