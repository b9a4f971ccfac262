//! Browser time tracker CLI library.
//!
//! This crate provides the CLI interface for the browser time tracker.

mod cli;
pub mod commands;
mod config;
pub mod host;

pub use cli::{Cli, Commands};
pub use config::Config;
