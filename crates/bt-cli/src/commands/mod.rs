//! CLI subcommand implementations.

pub mod report;
pub mod signal;
pub mod status;
pub mod util;
pub mod wipe;
