//! Bridge between the browser host and the tracker.
//!
//! The host (the browser extension's native-messaging side) writes one
//! JSON envelope per lifecycle signal. Each envelope carries the signal,
//! the time it fired, and the browser state the host saw at that moment,
//! which answers the tracker's tab and idle queries.
//!
//! ```json
//! {"at": 1700000000000, "signal": {"type": "tab_activated", "tab_id": 4},
//!  "tabs": [{"id": 4, "url": "https://a.com", "title": "A", "active": true}],
//!  "focused_window": 1, "idle": "active"}
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bt_core::{Browser, BrowserError, BrowserSnapshot, IdleState, Signal, Tab, TabId, WindowId};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One signal as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// When the signal fired, in milliseconds since the Unix epoch.
    /// Defaults to the time the envelope is read.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub at: Option<DateTime<Utc>>,
    pub signal: Signal,
    #[serde(flatten)]
    pub browser: BrowserSnapshot,
}

/// The browser as last described by the host.
#[derive(Debug, Default)]
pub struct HostBrowser {
    snapshot: RwLock<BrowserSnapshot>,
}

impl HostBrowser {
    /// Replaces the browser state with the one shipped in an envelope.
    pub async fn update(&self, snapshot: BrowserSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

impl Browser for HostBrowser {
    async fn tab(&self, id: TabId) -> Result<Tab, BrowserError> {
        self.snapshot.read().await.tab(id).await
    }

    async fn active_tab(&self, window: Option<WindowId>) -> Result<Option<Tab>, BrowserError> {
        self.snapshot.read().await.active_tab(window).await
    }

    async fn idle_state(&self, threshold: Duration) -> Result<IdleState, BrowserError> {
        self.snapshot.read().await.idle_state(threshold).await
    }
}

/// Returns the path of the lock file guarding `database_path`.
fn lock_path(database_path: &Path) -> PathBuf {
    database_path.with_extension("lock")
}

/// Acquires the cross-process lock on the tracker state.
///
/// Invocations of `bt` may overlap; the lock keeps each transition's
/// read-reconcile-write sequence from interleaving with another's. The
/// lock is released when the returned file is dropped.
pub fn lock_state(database_path: &Path) -> Result<File> {
    if let Some(parent) = database_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let lock_file =
        File::create(lock_path(database_path)).context("failed to create lock file")?;
    lock_file
        .lock_exclusive()
        .context("failed to acquire lock")?;
    Ok(lock_file)
}
