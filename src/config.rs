//! Settings file parser for `podmix.toml`.
//!
//! The settings file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::output::ChannelMetadata;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level settings.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed list to read (`.json` or `.toml`).
    pub feeds_path: PathBuf,

    /// Where the combined feed is written.
    pub output_path: PathBuf,

    /// Per-request timeout for fetching a single feed.
    pub fetch_timeout_secs: u64,

    /// Largest feed document accepted, in bytes.
    pub max_feed_bytes: usize,

    /// Feeds fetched at once. 1 = strictly sequential.
    pub concurrency: usize,

    /// Channel metadata of the combined feed.
    pub channel: ChannelMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds_path: PathBuf::from("feeds.json"),
            output_path: PathBuf::from("customfeed.xml"),
            fetch_timeout_secs: 30,
            max_feed_bytes: 10 * 1024 * 1024,
            concurrency: 1,
            channel: ChannelMetadata::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "feeds_path",
        "output_path",
        "fetch_timeout_secs",
        "max_feed_bytes",
        "concurrency",
        "channel",
    ];

    /// Load settings from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_capped(path)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        Self::warn_unknown_keys(&content);

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = %config.feeds_path.display(),
            output = %config.output_path.display(),
            concurrency = config.concurrency,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reads the whole settings file, or `None` if it does not exist.
    ///
    /// Size is checked on the open handle and the read itself is capped, so a
    /// file swapped or grown after opening cannot exceed the limit.
    fn read_capped(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let too_large = |size: u64| {
            ConfigError::TooLarge(format!(
                "{} is {} bytes (max {} bytes)",
                path.display(),
                size,
                Self::MAX_FILE_SIZE
            ))
        };

        let size = file.metadata()?.len();
        if size > Self::MAX_FILE_SIZE {
            return Err(too_large(size));
        }

        let mut content = String::with_capacity(size as usize);
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(too_large(content.len() as u64));
        }
        Ok(Some(content))
    }

    fn warn_unknown_keys(content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else {
            return;
        };
        table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Unknown key in podmix.toml, ignoring"));
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
