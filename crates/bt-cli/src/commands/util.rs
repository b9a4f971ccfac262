//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use bt_core::{Browser, Tracker};
use bt_db::Database;

use crate::Config;

/// Opens the configured database and wraps it in a tracker.
pub fn open_tracker<B>(config: &Config, browser: B) -> Result<Tracker<Database, B>>
where
    B: Browser + Sync,
{
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(Tracker::new(db, browser, config.tracker_config()))
}

/// Creates the runtime the async tracker API runs on.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")
}

/// Formats seconds as `42s` or `3m 7s`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "durations are non-negative and far below u64::MAX seconds"
)]
pub fn format_duration(secs: f64) -> String {
    let whole = secs.max(0.0).floor() as u64;
    if whole < 60 {
        return format!("{whole}s");
    }
    format!("{}m {}s", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_matches_popup_style() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(59.9), "59s");
        assert_eq!(format_duration(60.0), "1m 0s");
        assert_eq!(format_duration(187.4), "3m 7s");
        assert_eq!(format_duration(7260.0), "121m 0s");
    }
}
