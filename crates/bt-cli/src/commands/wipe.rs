//! Wipe command for clearing tracking data.

use std::io::Write;

use anyhow::{Context, Result};
use bt_classify::Client;
use bt_core::BrowserSnapshot;

use super::util::{open_tracker, runtime};
use crate::Config;
use crate::host::lock_state;

/// Clears local history and the open entry. With `server`, also asks the
/// classification backend to drop its logs; a backend failure is reported
/// but does not undo the local wipe.
pub fn run<W: Write>(writer: &mut W, config: &Config, server: bool) -> Result<()> {
    let tracker = open_tracker(config, BrowserSnapshot::default())?;
    let rt = runtime()?;

    {
        let _lock = lock_state(&config.database_path)?;
        rt.block_on(tracker.wipe())
            .context("failed to clear tracker state")?;
    }
    writeln!(writer, "Cleared local tracking data.")?;

    if server {
        let client = Client::new(config.classifier_url.as_str())?;
        match rt.block_on(client.clear()) {
            Ok(()) => writeln!(writer, "Cleared backend logs at {}.", client.endpoint())?,
            Err(err) => {
                tracing::warn!(error = %err, endpoint = client.endpoint(), "backend wipe failed");
                writeln!(writer, "Backend logs were not cleared: {err}")?;
            }
        }
    }

    Ok(())
}
