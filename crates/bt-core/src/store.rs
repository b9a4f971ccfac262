//! The persisted state store abstraction.
//!
//! A store holds exactly two keys, `currentEntry` and `history`. It is the
//! only channel between tracker invocations, which may live in different
//! processes. Stores need no locking of their own; the [`Tracker`] owns
//! its store and serializes every access.
//!
//! [`Tracker`]: crate::Tracker

use std::convert::Infallible;

use crate::entry::{HistoryEntry, OpenEntry, TrackerState};

/// Key-value access to the persisted tracker state.
pub trait StateStore {
    /// Error raised when the backing storage cannot be read or written.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads `currentEntry`.
    fn current_entry(&self) -> Result<Option<OpenEntry>, Self::Error>;

    /// Reads `history`, oldest first.
    fn history(&self) -> Result<Vec<HistoryEntry>, Self::Error>;

    /// Writes `currentEntry`.
    fn set_current_entry(&mut self, entry: Option<&OpenEntry>) -> Result<(), Self::Error>;

    /// Replaces `history`.
    fn set_history(&mut self, history: &[HistoryEntry]) -> Result<(), Self::Error>;

    /// Reads both keys.
    fn load(&self) -> Result<TrackerState, Self::Error> {
        Ok(TrackerState {
            current_entry: self.current_entry()?,
            history: self.history()?,
        })
    }

    /// Writes both keys. Backends with transactions should override this
    /// so the pair lands atomically.
    fn save(
        &mut self,
        history: &[HistoryEntry],
        entry: Option<&OpenEntry>,
    ) -> Result<(), Self::Error> {
        self.set_history(history)?;
        self.set_current_entry(entry)
    }
}

/// An in-process store.
///
/// Useful for tests and for embedding the tracker where durability is
/// handled elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: TrackerState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `state`.
    pub const fn with_state(state: TrackerState) -> Self {
        Self { state }
    }
}

impl StateStore for MemoryStore {
    type Error = Infallible;

    fn current_entry(&self) -> Result<Option<OpenEntry>, Self::Error> {
        Ok(self.state.current_entry.clone())
    }

    fn history(&self) -> Result<Vec<HistoryEntry>, Self::Error> {
        Ok(self.state.history.clone())
    }

    fn set_current_entry(&mut self, entry: Option<&OpenEntry>) -> Result<(), Self::Error> {
        self.state.current_entry = entry.cloned();
        Ok(())
    }

    fn set_history(&mut self, history: &[HistoryEntry]) -> Result<(), Self::Error> {
        self.state.history = history.to_vec();
        Ok(())
    }
}
