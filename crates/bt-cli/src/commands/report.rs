//! Report command: summarize recorded browsing time.
//!
//! The local report is read-only. `--classify` hands the batch to the
//! classification backend and, once the backend has accepted it, drops the
//! reported entries from local history. `--history` lists what the backend
//! stored from earlier batches.

use std::io::Write;

use anyhow::{Context, Result};
use bt_classify::{ClassificationReport, Client, ReportDetail};
use bt_core::{BrowserSnapshot, TitleSummary, aggregate};
use chrono::Utc;
use serde::Serialize;

use super::util::{format_duration, open_tracker, runtime};
use crate::Config;
use crate::host::lock_state;

const NOTHING_RECORDED: &str = "No browsing history recorded yet.";

/// What the report shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Per-title totals from local state.
    Local,
    /// Classify local state and drop what the backend accepted.
    Classify,
    /// Records the backend classified earlier.
    BackendHistory,
}

#[derive(Debug, Serialize)]
struct LocalReport {
    total_secs: f64,
    titles: Vec<TitleSummary>,
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool, mode: Mode) -> Result<()> {
    match mode {
        Mode::Local => run_local(writer, config, json),
        Mode::Classify => run_classify(writer, config, json),
        Mode::BackendHistory => run_backend_history(writer, config, json),
    }
}

fn run_local<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let tracker = open_tracker(config, BrowserSnapshot::default())?;
    let snapshot = {
        let _lock = lock_state(&config.database_path)?;
        runtime()?
            .block_on(tracker.snapshot(Utc::now()))
            .context("failed to read tracker state")?
    };
    let batch = snapshot.batch();

    if batch.is_empty() {
        return write_nothing_recorded(writer, json);
    }

    let report = LocalReport {
        total_secs: snapshot.total_secs(),
        titles: aggregate(&batch),
    };
    if json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }
    render_local(writer, &report)
}

/// Classifies the recorded batch and drops it locally once accepted. The
/// state lock is held until then, so signals from other `bt` processes
/// wait instead of closing an interval that is being reported.
fn run_classify<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let tracker = open_tracker(config, BrowserSnapshot::default())?;
    let client = Client::new(config.classifier_url.as_str())?;
    let rt = runtime()?;

    let report = {
        let _lock = lock_state(&config.database_path)?;
        let client = &client;
        rt.block_on(tracker.hand_off(Utc::now(), |batch| async move {
            client.classify(&batch).await
        }))
        .with_context(|| format!("classification via {} failed", client.endpoint()))?
    };

    let Some(report) = report else {
        return write_nothing_recorded(writer, json);
    };
    tracing::debug!(titles = report.details.len(), "reported history to classifier");

    if json {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }
    render_classified(writer, &report)
}

fn run_backend_history<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let client = Client::new(config.classifier_url.as_str())?;
    let records = runtime()?
        .block_on(client.history())
        .with_context(|| format!("failed to fetch history from {}", client.endpoint()))?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &records)?;
        writeln!(writer)?;
        return Ok(());
    }
    render_backend_history(writer, &records)
}

fn write_nothing_recorded<W: Write>(writer: &mut W, json: bool) -> Result<()> {
    if json {
        writeln!(writer, "null")?;
    } else {
        writeln!(writer, "{NOTHING_RECORDED}")?;
    }
    Ok(())
}

fn render_local<W: Write>(writer: &mut W, report: &LocalReport) -> Result<()> {
    writeln!(writer, "Total: {}", format_duration(report.total_secs))?;
    writeln!(writer)?;
    for summary in &report.titles {
        writeln!(
            writer,
            "{:>10}  {}",
            format_duration(summary.duration),
            summary.title
        )?;
    }
    Ok(())
}

fn render_classified<W: Write>(writer: &mut W, report: &ClassificationReport) -> Result<()> {
    writeln!(writer, "Classified:  {}", format_duration(report.total_time()))?;
    writeln!(writer, "Productive:  {}", format_duration(report.productive_time))?;
    writeln!(writer, "Distracting: {}", format_duration(report.distracting_time))?;
    if let Some(today) = &report.today_total {
        writeln!(
            writer,
            "Today:       {} productive, {} distracting",
            format_duration(today.productive_time),
            format_duration(today.distracting_time)
        )?;
    }
    writeln!(writer)?;
    render_details(writer, &report.details)
}

fn render_backend_history<W: Write>(writer: &mut W, records: &[ReportDetail]) -> Result<()> {
    if records.is_empty() {
        writeln!(writer, "The backend has no classified records.")?;
        return Ok(());
    }
    render_details(writer, records)
}

fn render_details<W: Write>(writer: &mut W, details: &[ReportDetail]) -> Result<()> {
    for detail in details {
        write!(
            writer,
            "{:>10}  {:<11}  {}",
            format_duration(detail.duration),
            detail.classification,
            detail.title
        )?;
        match &detail.timestamp {
            Some(timestamp) => writeln!(writer, "  ({timestamp})")?,
            None => writeln!(writer)?,
        }
    }
    Ok(())
}
