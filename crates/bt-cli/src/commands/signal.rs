//! Signal command: apply host lifecycle signals to the tracker.
//!
//! Reads one [`Envelope`] per line. Lines are applied in order; each one
//! takes the state lock for the duration of its transition so other `bt`
//! invocations can run between signals.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use bt_core::{Outcome, Tracker};
use bt_db::Database;
use chrono::Utc;

use super::util::{open_tracker, runtime};
use crate::Config;
use crate::host::{Envelope, HostBrowser, lock_state};

/// Counts of what happened to each input line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: usize,
    pub ignored: usize,
    pub degraded: usize,
    pub malformed: usize,
}

/// Runs the signal command.
pub fn run<R: BufRead, W: Write>(reader: R, writer: &mut W, config: &Config) -> Result<()> {
    let tracker = open_tracker(config, HostBrowser::default())?;
    let stats = runtime()?.block_on(dispatch_all(&tracker, reader, config))?;

    writeln!(
        writer,
        "Applied {} signals ({} ignored, {} degraded, {} malformed)",
        stats.applied, stats.ignored, stats.degraded, stats.malformed
    )?;
    Ok(())
}

async fn dispatch_all<R: BufRead>(
    tracker: &Tracker<Database, HostBrowser>,
    reader: R,
    config: &Config,
) -> Result<DispatchStats> {
    let mut stats = DispatchStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read signal input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "skipping malformed signal");
                stats.malformed += 1;
                continue;
            }
        };

        let now = envelope.at.unwrap_or_else(Utc::now);
        let _lock = lock_state(&config.database_path)?;
        tracker.browser().update(envelope.browser).await;
        match tracker.handle(envelope.signal, now).await {
            Outcome::Ignored => stats.ignored += 1,
            Outcome::Applied { .. } => stats.applied += 1,
            Outcome::Degraded => stats.degraded += 1,
        }
    }

    Ok(stats)
}
