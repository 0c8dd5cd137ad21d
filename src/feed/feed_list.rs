use std::path::Path;

use serde::de::IgnoredAny;
use serde::Deserialize;
use thiserror::Error;

const UNNAMED_FEED: &str = "Unnamed Feed";

/// Errors that can occur while loading the feed list.
#[derive(Debug, Error)]
pub enum FeedListError {
    #[error("Failed to read feed list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in feed list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML in feed list: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A configured source feed.
///
/// `url` is `None` when the entry had no usable URL; the aggregator
/// reports and skips such feeds instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: Option<String>,
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    pub fn without_url(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FeedListFile {
    #[serde(default)]
    feeds: Vec<FeedSlot>,
}

/// A list element: a well-formed descriptor, or anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedSlot {
    Descriptor(FeedDescriptor),
    Malformed(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct FeedDescriptor {
    #[serde(default)]
    name: Option<TextField>,
    #[serde(default)]
    url: Option<TextField>,
}

/// A descriptor field that should be a string; other values count as absent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    Text(String),
    Other(IgnoredAny),
}

impl TextField {
    fn into_text(field: Option<Self>) -> Option<String> {
        match field {
            Some(TextField::Text(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

impl From<FeedSlot> for FeedConfig {
    fn from(slot: FeedSlot) -> Self {
        match slot {
            FeedSlot::Descriptor(d) => FeedConfig {
                name: TextField::into_text(d.name).unwrap_or_else(|| UNNAMED_FEED.to_string()),
                url: TextField::into_text(d.url).map(|url| url.trim().to_string()),
            },
            FeedSlot::Malformed(_) => FeedConfig::without_url(UNNAMED_FEED),
        }
    }
}

/// The ordered list of feeds to combine.
pub struct FeedList;

impl FeedList {
    /// Loads the feed list from disk.
    ///
    /// Files ending in `.toml` are read as TOML, everything else as JSON.
    /// Both use the same shape: a top-level `feeds` array of `{ name, url }`.
    pub fn load(path: &Path) -> Result<Vec<FeedConfig>, FeedListError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let feeds = if is_toml {
            Self::from_toml(&content)?
        } else {
            Self::from_json(&content)?
        };
        tracing::info!(path = %path.display(), feeds = feeds.len(), "Loaded feed list");
        Ok(feeds)
    }

    pub fn from_json(content: &str) -> Result<Vec<FeedConfig>, FeedListError> {
        let file: FeedListFile = serde_json::from_str(content)?;
        Ok(file.feeds.into_iter().map(FeedConfig::from).collect())
    }

    pub fn from_toml(content: &str) -> Result<Vec<FeedConfig>, FeedListError> {
        let file: FeedListFile = toml::from_str(content)?;
        Ok(file.feeds.into_iter().map(FeedConfig::from).collect())
    }
}
