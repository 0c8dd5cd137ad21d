use anyhow::Result;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;

use super::entry::{LinkCandidate, RawEntry};

/// Parses an RSS, Atom or JSON feed document into entries, in document order.
///
/// Entries keep an id only when the document supplied one; feed-rs would
/// otherwise invent a random one, which must not leak into item links.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawEntry>> {
    let feed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(bytes)?;
    Ok(feed.entries.into_iter().map(to_raw_entry).collect())
}

fn to_raw_entry(entry: Entry) -> RawEntry {
    let link = select_entry_link(&entry.links);

    let enclosures = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .filter_map(|content| {
            let url = content.url.as_ref()?;
            let mime = content.content_type.as_ref().map(|m| m.to_string());
            Some(LinkCandidate::enclosure(url.as_str(), mime.as_deref()))
        })
        .collect();

    let links = entry
        .links
        .iter()
        .map(|l| LinkCandidate::link(l.href.as_str(), l.media_type.as_deref()))
        .collect();

    let id = if entry.id.trim().is_empty() {
        None
    } else {
        Some(entry.id)
    };

    RawEntry {
        title: entry.title.map(|t| t.content),
        summary: entry.summary.map(|s| s.content),
        description: entry.content.and_then(|c| c.body),
        link,
        id,
        published: entry.published,
        updated: entry.updated,
        enclosures,
        links,
    }
}

/// First alternate (or rel-less) link, else the first non-enclosure link.
fn select_entry_link(links: &[Link]) -> Option<String> {
    let usable = || {
        links.iter().filter(|l| {
            !l.href.trim().is_empty()
                && !l
                    .rel
                    .as_deref()
                    .is_some_and(|rel| rel.eq_ignore_ascii_case("enclosure"))
        })
    };

    usable()
        .find(|l| {
            l.rel
                .as_deref()
                .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| usable().next())
        .map(|l| l.href.clone())
}
