use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::executor::DEFAULT_SCAN_TIMEOUT;

/// Adapter-layer configuration. Only `address` is required: the scan target
/// in nmap's own syntax (single IP, CIDR block, or hyphenated range), passed
/// through to the scanner unmodified.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_SCAN_TIMEOUT.as_secs()
}

impl Config {
    /// Parse a TOML configuration document.
    pub fn parse_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid configuration file")
    }

    /// Load the configuration from a file path. Errors if the file cannot be
    /// read, is not valid TOML, or is missing the `address` field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed to read config file: {}", path.as_ref().display())
        })?;
        Self::parse_str(&content)
            .with_context(|| format!("in config file: {}", path.as_ref().display()))
    }

    /// Default config location: `~/.config/nmap-inventory.toml`.
    ///
    /// Errors when `HOME` is unset rather than falling back to a cwd-relative
    /// path; callers can always pass an explicit path instead.
    pub fn default_path() -> Result<PathBuf> {
        let home = env::var_os("HOME")
            .context("HOME is not set; pass an explicit config path with --config")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("nmap-inventory.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
