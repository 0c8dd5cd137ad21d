use chrono::{DateTime, SubsecRound, Utc};
use quick_xml::escape::escape;
use sha2::{Digest, Sha256};

use super::audio::resolve;
use crate::feed::RawEntry;

/// Enclosure type written for every selected episode.
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

const NO_TITLE: &str = "No Title";
const UNTITLED: &str = "untitled";

/// The episode picked for one source feed, ready for the combined feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    /// `"{feed name}: {escaped entry title}"`
    pub display_title: String,
    pub description: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub guid: String,
    pub audio_url: String,
    pub audio_mime_type: String,
}

/// Result of scanning one feed's entries.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub item: Option<SelectedItem>,
    /// Titles of entries passed over for lacking audio, in scan order.
    pub skipped: Vec<String>,
}

/// Picks the first entry, in feed order, that carries playable audio.
pub fn select_first_audio_entry(
    feed_name: &str,
    source_url: &str,
    entries: &[RawEntry],
) -> Option<SelectedItem> {
    scan_entries(feed_name, source_url, entries).item
}

/// Like [`select_first_audio_entry`], also reporting the entries skipped on the way.
///
/// Stops at the first match; later entries are never inspected even if newer.
pub fn scan_entries(feed_name: &str, source_url: &str, entries: &[RawEntry]) -> Selection {
    let mut skipped = Vec::new();

    for entry in entries {
        let Some(audio) = resolve(entry) else {
            let title = entry.title.as_deref().unwrap_or(UNTITLED);
            tracing::info!(feed = %feed_name, entry = %title, "Entry has no audio, skipping");
            skipped.push(title.to_string());
            continue;
        };

        if let Some(detected) = audio.mime_type.as_deref() {
            if !detected.eq_ignore_ascii_case(DEFAULT_AUDIO_MIME) {
                tracing::debug!(
                    feed = %feed_name,
                    detected = %detected,
                    declared = DEFAULT_AUDIO_MIME,
                    "Declaring default enclosure type over detected one"
                );
            }
        }

        let raw_title = entry.title.as_deref().unwrap_or(NO_TITLE);
        let pub_date = entry.timestamp().unwrap_or_else(Utc::now).trunc_subsecs(0);

        let item = SelectedItem {
            display_title: format!("{}: {}", feed_name, html_escape(raw_title)),
            description: html_escape(
                entry
                    .summary
                    .as_deref()
                    .or(entry.description.as_deref())
                    .unwrap_or(""),
            ),
            link: entry.permalink().unwrap_or(source_url).to_string(),
            pub_date,
            guid: episode_guid(source_url, raw_title, pub_date),
            audio_url: audio.url,
            audio_mime_type: DEFAULT_AUDIO_MIME.to_string(),
        };
        tracing::debug!(feed = %feed_name, guid = %item.guid, audio = %item.audio_url, "Selected episode");

        return Selection {
            item: Some(item),
            skipped,
        };
    }

    Selection {
        item: None,
        skipped,
    }
}

/// Escapes `& < > " '` for HTML. The apostrophe becomes `&#x27;`, since
/// `&apos;` is not an HTML 4 entity.
fn html_escape(raw: &str) -> String {
    escape(raw).replace("&apos;", "&#x27;")
}

/// Stable identity for an output item: SHA-256 over source URL, raw title and
/// second-precision ISO publication time.
pub fn episode_guid(source_url: &str, raw_title: &str, pub_date: DateTime<Utc>) -> String {
    let input = format!(
        "{}_{}_{}",
        source_url,
        raw_title,
        pub_date.format("%Y-%m-%dT%H:%M:%S")
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}
