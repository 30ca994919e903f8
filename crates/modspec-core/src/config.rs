//! Runtime configuration for the `modspec` binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Runtime configuration for the modspec CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Absolute working directory. Paths given on the command line are
    /// relative to it, and it is the default importing location.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config. A relative `cwd` is taken relative to the
    /// process working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        let cwd = if cwd.is_relative() {
            std::env::current_dir().map_or(cwd.clone(), |dir| dir.join(&cwd))
        } else {
            cwd
        };

        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// `path` relative to the working directory. Absolute paths pass through.
    #[must_use]
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.cwd.join(path)
    }

    /// The working directory as a directory URL (with a trailing slash).
    #[must_use]
    pub fn cwd_url(&self) -> Option<Url> {
        Url::from_directory_path(&self.cwd).ok()
    }
}
