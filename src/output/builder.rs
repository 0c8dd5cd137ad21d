use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::rss::{render_rss, Channel, Enclosure, Item};
use crate::select::SelectedItem;

/// Static channel metadata of the combined feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelMetadata {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub author: String,
    pub explicit: bool,
}

impl Default for ChannelMetadata {
    fn default() -> Self {
        Self {
            title: "Latest-Episode Combo Feed".to_string(),
            link: "http://localhost:8000/customfeed.xml".to_string(),
            description: "The newest episode from each of my favourite shows".to_string(),
            language: "en-us".to_string(),
            author: "CustomFeed".to_string(),
            explicit: false,
        }
    }
}

/// Builds the combined feed document, stamped with the current time.
pub fn build(items: Vec<SelectedItem>, meta: &ChannelMetadata) -> Result<String> {
    build_at(items, meta, Utc::now())
}

/// Builds the combined feed document with an explicit `lastBuildDate`.
///
/// Items are ordered newest first; items with equal dates keep their
/// collection order.
pub fn build_at(
    mut items: Vec<SelectedItem>,
    meta: &ChannelMetadata,
    built_at: DateTime<Utc>,
) -> Result<String> {
    items.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

    let channel = Channel {
        title: meta.title.clone(),
        link: meta.link.clone(),
        description: meta.description.clone(),
        language: meta.language.clone(),
        author: meta.author.clone(),
        explicit: meta.explicit,
        last_build_date: built_at,
        items: items.into_iter().map(Item::from).collect(),
    };
    render_rss(&channel)
}

impl From<SelectedItem> for Item {
    fn from(item: SelectedItem) -> Self {
        Item {
            title: item.display_title,
            link: item.link,
            description: item.description,
            guid: item.guid,
            pub_date: item.pub_date,
            enclosure: Enclosure {
                url: item.audio_url,
                length: 0,
                mime_type: item.audio_mime_type,
            },
        }
    }
}
