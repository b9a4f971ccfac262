//! The host browser capability surface.
//!
//! The tracker only ever asks three questions of the browser: what is tab
//! N, which tab is active, and is the user idle. Any of them may fail if
//! the tab or window vanished between the signal firing and the lookup.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::{Tab, TabId, WindowId};
use crate::signal::IdleState;

/// Browser lookup errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// The tab was closed before it could be queried.
    #[error("no tab with id {0}")]
    TabNotFound(TabId),
    /// The window was closed before it could be queried.
    #[error("no window with id {0}")]
    WindowNotFound(WindowId),
    /// The host could not answer at all.
    #[error("browser unavailable: {0}")]
    Unavailable(String),
}

/// Queries the tracker needs from the host browser.
pub trait Browser {
    /// Looks up a tab by id.
    fn tab(&self, id: TabId) -> impl Future<Output = Result<Tab, BrowserError>> + Send;

    /// Returns the active tab of `window`, or of the current window.
    fn active_tab(
        &self,
        window: Option<WindowId>,
    ) -> impl Future<Output = Result<Option<Tab>, BrowserError>> + Send;

    /// Queries the idle state using the given detection threshold.
    fn idle_state(
        &self,
        threshold: Duration,
    ) -> impl Future<Output = Result<IdleState, BrowserError>> + Send;
}

/// A point-in-time view of the browser, as shipped by the host alongside
/// each signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSnapshot {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    /// The focused window; `None` means "whatever window is current".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused_window: Option<WindowId>,
    /// Unknown idle state is treated as active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle: Option<IdleState>,
}

impl BrowserSnapshot {
    /// A tab the host shipped without a window id may sit in any window;
    /// tabs known to be in `window` win over those.
    fn find_active(&self, window: Option<WindowId>) -> Result<Option<Tab>, BrowserError> {
        let window = window.or(self.focused_window).filter(|w| !w.is_none());
        let Some(window) = window else {
            return Ok(self.tabs.iter().find(|tab| tab.active).cloned());
        };

        let in_window = |tab: &&Tab| tab.window_id == Some(window);
        let maybe_in_window = |tab: &&Tab| tab.window_id.is_none();
        if !self.tabs.iter().any(|tab| in_window(&tab) || maybe_in_window(&tab)) {
            return Err(BrowserError::WindowNotFound(window));
        }
        Ok(self
            .tabs
            .iter()
            .filter(|tab| tab.active)
            .find(in_window)
            .or_else(|| self.tabs.iter().filter(|tab| tab.active).find(maybe_in_window))
            .cloned())
    }
}

impl Browser for BrowserSnapshot {
    async fn tab(&self, id: TabId) -> Result<Tab, BrowserError> {
        self.tabs
            .iter()
            .find(|tab| tab.id == id)
            .cloned()
            .ok_or(BrowserError::TabNotFound(id))
    }

    async fn active_tab(&self, window: Option<WindowId>) -> Result<Option<Tab>, BrowserError> {
        self.find_active(window)
    }

    async fn idle_state(&self, _threshold: Duration) -> Result<IdleState, BrowserError> {
        Ok(self.idle.unwrap_or(IdleState::Active))
    }
}
