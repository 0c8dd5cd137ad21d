//! Drives fetch and selection across every configured feed.
//!
//! A feed that is misconfigured, unreachable, malformed or has no audio
//! contributes nothing; it never stops the remaining feeds from being processed.

use futures::stream::{self, StreamExt};

use crate::feed::{FeedConfig, FeedSource};
use crate::select::{scan_entries, SelectedItem};

/// What happened to one configured feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// An episode was selected
    Selected,
    /// The feed descriptor had no URL
    MissingUrl,
    /// Fetching or parsing failed; carries the cause
    FetchFailed(String),
    /// Every entry lacked playable audio (or there were none)
    NoAudio,
}

#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub name: String,
    pub status: FeedStatus,
    /// Titles of entries skipped for lacking audio
    pub skipped_entries: Vec<String>,
}

/// Everything a run produced, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub items: Vec<SelectedItem>,
    pub outcomes: Vec<FeedOutcome>,
}

impl RunSummary {
    /// Number of feeds that contributed nothing.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status != FeedStatus::Selected)
            .count()
    }
}

pub struct Aggregator<S> {
    source: S,
    concurrency: usize,
}

impl<S: FeedSource> Aggregator<S> {
    /// Creates an aggregator that processes one feed at a time.
    pub fn new(source: S) -> Self {
        Self {
            source,
            concurrency: 1,
        }
    }

    /// Number of feeds fetched at once. Results keep configuration order
    /// regardless; values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Processes every feed and collects at most one item per feed.
    pub async fn run(&self, feeds: &[FeedConfig]) -> RunSummary {
        let results: Vec<(FeedOutcome, Option<SelectedItem>)> = stream::iter(feeds)
            .map(|feed| self.process(feed))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut summary = RunSummary::default();
        for (outcome, item) in results {
            summary.items.extend(item);
            summary.outcomes.push(outcome);
        }

        tracing::info!(
            feeds = feeds.len(),
            selected = summary.items.len(),
            failed = summary.failed(),
            "Aggregation complete"
        );
        summary
    }

    async fn process(&self, feed: &FeedConfig) -> (FeedOutcome, Option<SelectedItem>) {
        let outcome = |status, skipped_entries| FeedOutcome {
            name: feed.name.clone(),
            status,
            skipped_entries,
        };

        let Some(url) = feed.url.as_deref() else {
            tracing::warn!(feed = %feed.name, "Skipping feed with no URL");
            return (outcome(FeedStatus::MissingUrl, Vec::new()), None);
        };

        let entries = match self.source.fetch(url).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(feed = %feed.name, url = %url, error = %e, "Problem fetching feed");
                return (outcome(FeedStatus::FetchFailed(e.to_string()), Vec::new()), None);
            }
        };

        let selection = scan_entries(&feed.name, url, &entries);
        match selection.item {
            Some(item) => (outcome(FeedStatus::Selected, selection.skipped), Some(item)),
            None => {
                tracing::info!(
                    feed = %feed.name,
                    entries = entries.len(),
                    "No entry with playable audio"
                );
                (outcome(FeedStatus::NoAudio, selection.skipped), None)
            }
        }
    }
}
