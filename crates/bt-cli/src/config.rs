//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bt_core::{DEFAULT_IGNORED_PREFIXES, TrackerConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Base url of the classification backend.
    pub classifier_url: String,

    /// Idle detection threshold in seconds.
    pub idle_threshold_secs: u64,

    /// Url prefixes that are never tracked.
    pub ignored_prefixes: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("classifier_url", &self.classifier_url)
            .field("idle_threshold_secs", &self.idle_threshold_secs)
            .field("ignored_prefixes", &self.ignored_prefixes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("bt.db"),
            classifier_url: bt_classify::DEFAULT_ENDPOINT.to_string(),
            idle_threshold_secs: 15,
            ignored_prefixes: DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BT_*)
        figment = figment.merge(Env::prefixed("BT_"));

        figment.extract()
    }

    /// Tracker settings derived from this configuration.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            ignored_prefixes: self.ignored_prefixes.clone(),
            idle_threshold: Duration::from_secs(self.idle_threshold_secs),
        }
    }
}

/// Returns the platform-specific config directory for bt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bt"))
}

/// Returns the platform-specific data directory for bt.
///
/// On Linux: `~/.local/share/bt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("bt"))
}
