use chrono::{DateTime, Utc};

/// A link-like record attached to a feed entry.
///
/// Enclosures carry their location in `url`, generic links in `href`.
/// Either may be absent when the source document omitted it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCandidate {
    pub href: Option<String>,
    pub url: Option<String>,
    pub mime_type: Option<String>,
}

impl LinkCandidate {
    /// Candidate from a generic `<link>` element.
    pub fn link(href: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            href: Some(href.into()),
            url: None,
            mime_type: mime_type.map(str::to_string),
        }
    }

    /// Candidate from an `<enclosure>` or media content element.
    pub fn enclosure(url: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            href: None,
            url: Some(url.into()),
            mime_type: mime_type.map(str::to_string),
        }
    }

    /// The candidate's location: `href` first, then `url`. Blank values count as absent.
    pub fn location(&self) -> Option<&str> {
        [self.href.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// One parsed feed item, reduced to the fields episode selection reads.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub id: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub enclosures: Vec<LinkCandidate>,
    pub links: Vec<LinkCandidate>,
}

impl RawEntry {
    /// Enclosures followed by generic links, in document order.
    pub fn candidates(&self) -> impl Iterator<Item = &LinkCandidate> {
        self.enclosures.iter().chain(self.links.iter())
    }

    /// Publication time, falling back to the last-updated time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.published.or(self.updated)
    }

    /// Item link, falling back to the entry id.
    pub fn permalink(&self) -> Option<&str> {
        [self.link.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_prefers_href() {
        let candidate = LinkCandidate {
            href: Some("https://a.example/ep.mp3".into()),
            url: Some("https://b.example/ep.mp3".into()),
            mime_type: None,
        };
        assert_eq!(candidate.location(), Some("https://a.example/ep.mp3"));
    }

    #[test]
    fn test_location_falls_back_to_url() {
        let candidate = LinkCandidate {
            href: Some("   ".into()),
            url: Some("https://b.example/ep.mp3".into()),
            mime_type: None,
        };
        assert_eq!(candidate.location(), Some("https://b.example/ep.mp3"));
        assert_eq!(LinkCandidate::default().location(), None);
    }

    #[test]
    fn test_candidates_put_enclosures_first() {
        let entry = RawEntry {
            links: vec![LinkCandidate::link("https://x.example/page", None)],
            enclosures: vec![LinkCandidate::enclosure("https://x.example/ep.mp3", None)],
            ..Default::default()
        };
        let order: Vec<_> = entry.candidates().filter_map(|c| c.location()).collect();
        assert_eq!(order, ["https://x.example/ep.mp3", "https://x.example/page"]);
    }

    #[test]
    fn test_timestamp_falls_back_to_updated() {
        let updated = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = RawEntry {
            updated: Some(updated),
            ..Default::default()
        };
        assert_eq!(entry.timestamp(), Some(updated));
    }

    #[test]
    fn test_permalink_falls_back_to_id() {
        let entry = RawEntry {
            link: Some(String::new()),
            id: Some("tag:example.com,2024:1".into()),
            ..Default::default()
        };
        assert_eq!(entry.permalink(), Some("tag:example.com,2024:1"));
        assert_eq!(RawEntry::default().permalink(), None);
    }
}
