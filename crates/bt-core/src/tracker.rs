//! The serialized tracker: executes dispatch plans against the store.
//!
//! # Concurrency
//!
//! Hosts deliver signals one at a time, but a handler suspends while it
//! waits on browser lookups, so a second signal can start before the first
//! finishes. If the two interleave, a stale read can resurrect an interval
//! another handler already closed. The tracker therefore holds a single
//! async mutex over the store for the whole read-reconcile-write sequence
//! of each transition, browser lookups included.
//!
//! The same lock covers a consumer handoff from snapshot to
//! acknowledgement, so no interval can close while its span is in flight.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::browser::Browser;
use crate::dispatch::{Next, Plan, Reconcile, Target, Transition};
use crate::entry::{HistoryEntry, OpenEntry, Tab, TrackerState};
use crate::reconcile::{DEFAULT_IGNORED_PREFIXES, reconcile, start_tracking};
use crate::report::Snapshot;
use crate::signal::{IdleState, Signal};
use crate::store::StateStore;

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Url prefixes that are never tracked.
    /// Default: `chrome://`, `edge://`, `about:`.
    pub ignored_prefixes: Vec<String>,

    /// Idle detection threshold used when querying the idle state.
    /// Default: 15 seconds, the smallest the browser supports.
    pub idle_threshold: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ignored_prefixes: DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            idle_threshold: Duration::from_secs(15),
        }
    }
}

/// Result of handling one signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The signal did not trigger a transition.
    Ignored,
    /// The transition ran to completion.
    Applied {
        /// The interval closed into history, if it was long enough.
        recorded: Option<HistoryEntry>,
        /// The new open interval.
        current: Option<OpenEntry>,
    },
    /// The store failed mid-transition; tracking was paused.
    Degraded,
}

/// Why a consumer handoff did not complete. Nothing is dropped from the
/// state in either case.
#[derive(Debug, Error)]
pub enum HandoffError<S, C> {
    #[error("failed to access tracker state: {0}")]
    Store(#[source] S),
    #[error("consumer rejected the batch: {0}")]
    Consumer(#[source] C),
}

/// Owns the persisted state and applies signals to it one at a time.
#[derive(Debug)]
pub struct Tracker<S, B> {
    store: Mutex<S>,
    browser: B,
    config: TrackerConfig,
}

impl<S, B> Tracker<S, B>
where
    S: StateStore + Send,
    B: Browser + Sync,
{
    pub fn new(store: S, browser: B, config: TrackerConfig) -> Self {
        Self {
            store: Mutex::new(store),
            browser,
            config,
        }
    }

    pub const fn browser(&self) -> &B {
        &self.browser
    }

    /// Consumes the tracker, returning the store.
    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    /// Applies `signal`, observed at `now`.
    ///
    /// Never fails: store errors are logged and converted into "no open
    /// interval", and lookup failures pause tracking until the next signal.
    pub async fn handle(&self, signal: Signal, now: DateTime<Utc>) -> Outcome {
        let transition = Transition::from_signal(signal);
        let name = transition.name();
        let Some(plan) = transition.plan() else {
            tracing::trace!("signal does not change tracking");
            return Outcome::Ignored;
        };

        let mut store = self.store.lock().await;
        let result = self.apply(&mut store, plan, now).await;
        match result {
            Ok(outcome) => {
                tracing::debug!(transition = name, ?outcome, "transition applied");
                outcome
            }
            Err(err) => {
                tracing::warn!(transition = name, error = %err, "store failed; pausing tracking");
                if let Err(err) = store.set_current_entry(None) {
                    tracing::warn!(error = %err, "failed to clear open entry");
                }
                Outcome::Degraded
            }
        }
    }

    async fn apply(
        &self,
        store: &mut S,
        plan: Plan,
        now: DateTime<Utc>,
    ) -> Result<Outcome, S::Error> {
        let state = store.load()?;

        // Only set when the open interval was long enough to record.
        let history = match plan.reconcile {
            Reconcile::Close => Some(reconcile(&state, now)),
            Reconcile::Discard => {
                if let Some(entry) = &state.current_entry {
                    tracing::debug!(url = %entry.url, "discarding interval left open before restart");
                }
                // Cleared before the browser is asked anything.
                store.set_current_entry(None)?;
                None
            }
        }
        .filter(|history| history.len() > state.history.len());

        let current = match plan.next {
            Next::Clear => None,
            Next::Track(target) => {
                let tab = self.resolve(target).await;
                start_tracking(tab.as_ref(), now, &self.config.ignored_prefixes)
            }
        };

        let recorded = if let Some(history) = history {
            store.save(&history, current.as_ref())?;
            history.last().cloned()
        } else {
            store.set_current_entry(current.as_ref())?;
            None
        };
        Ok(Outcome::Applied { recorded, current })
    }

    /// Resolves the tab to track next; any lookup failure yields `None`.
    async fn resolve(&self, target: Target) -> Option<Tab> {
        let result = match target {
            Target::Given(tab) => Ok(Some(tab)),
            Target::Tab(id) => self.browser.tab(id).await.map(Some),
            Target::ActiveTab(window) => self.browser.active_tab(window).await,
            Target::ActiveTabIfUserActive => {
                match self.browser.idle_state(self.config.idle_threshold).await {
                    Ok(IdleState::Active) => self.browser.active_tab(None).await,
                    Ok(state) => {
                        tracing::debug!(%state, "user away at startup; not tracking");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
        };
        match result {
            Ok(tab) => tab,
            Err(err) => {
                tracing::debug!(error = %err, "could not resolve tab; tracking paused");
                None
            }
        }
    }

    /// Reads the persisted state.
    pub async fn state(&self) -> Result<TrackerState, S::Error> {
        self.store.lock().await.load()
    }

    /// Reads history plus a tentative entry for the open page, without
    /// modifying anything.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot, S::Error> {
        let state = self.store.lock().await.load()?;
        Ok(Snapshot::new(state, now))
    }

    /// Hands the batch recorded up to `now` to `consumer` and, once it
    /// succeeds, drops what was reported so it is never counted again.
    ///
    /// The store stays locked until the acknowledgement is written; signals
    /// arriving meanwhile wait and are applied at their own timestamps.
    /// Returns `Ok(None)` without calling `consumer` when there is nothing
    /// to report.
    pub async fn hand_off<F, Fut, T, E>(
        &self,
        now: DateTime<Utc>,
        consumer: F,
    ) -> Result<Option<T>, HandoffError<S::Error, E>>
    where
        F: FnOnce(Vec<HistoryEntry>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut store = self.store.lock().await;
        let snapshot = Snapshot::new(store.load().map_err(HandoffError::Store)?, now);
        let batch = snapshot.batch();
        if batch.is_empty() {
            return Ok(None);
        }

        let output = consumer(batch).await.map_err(HandoffError::Consumer)?;

        let handoff = snapshot.handoff();
        let mut state = store.load().map_err(HandoffError::Store)?;
        handoff.apply(&mut state);
        store
            .save(&state.history, state.current_entry.as_ref())
            .map_err(HandoffError::Store)?;
        tracing::debug!(
            sent = handoff.sent,
            remaining = state.history.len(),
            "acknowledged report"
        );
        Ok(Some(output))
    }

    /// Clears history and the open entry.
    pub async fn wipe(&self) -> Result<(), S::Error> {
        self.store.lock().await.save(&[], None)
    }
}
