//! Status command for showing what is being tracked.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bt_classify::Client;
use bt_core::{BrowserSnapshot, Snapshot};
use chrono::{SecondsFormat, Utc};

use super::util::{format_duration, open_tracker, runtime};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let tracker = open_tracker(config, BrowserSnapshot::default())?;
    let rt = runtime()?;
    let snapshot = rt
        .block_on(tracker.snapshot(Utc::now()))
        .context("failed to read tracker state")?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &snapshot)?;
        writeln!(writer)?;
        return Ok(());
    }

    let client = Client::new(config.classifier_url.as_str())?;
    let backend = Backend {
        endpoint: client.endpoint(),
        up: rt.block_on(client.is_up()),
    };
    render(writer, &config.database_path, &backend, &snapshot)
}

/// Reachability of the classification backend.
struct Backend<'a> {
    endpoint: &'a str,
    up: bool,
}

fn render<W: Write>(
    writer: &mut W,
    database_path: &Path,
    backend: &Backend<'_>,
    snapshot: &Snapshot,
) -> Result<()> {
    writeln!(writer, "Browser time tracker status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    let reachability = if backend.up { "up" } else { "unreachable" };
    writeln!(writer, "Backend: {} ({reachability})", backend.endpoint)?;

    match &snapshot.current_entry {
        Some(entry) => {
            writeln!(writer, "Tracking: {} ({})", entry.title, entry.url)?;
            writeln!(
                writer,
                "Since: {}",
                entry.start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
        None => writeln!(writer, "Tracking: nothing")?,
    }

    writeln!(
        writer,
        "History: {} entries, {} recorded",
        snapshot.history.len(),
        format_duration(snapshot.history.iter().map(|entry| entry.duration).sum())
    )?;
    if let Some(tentative) = &snapshot.tentative {
        writeln!(writer, "Open page so far: {}", format_duration(tentative.duration))?;
    }

    Ok(())
}
