use crate::feed::{LinkCandidate, RawEntry};

/// File extensions treated as playable audio when no MIME type says so.
const AUDIO_EXTENSIONS: [&str; 6] = [".mp3", ".m4a", ".aac", ".ogg", ".opus", ".wav"];

/// A playable audio attachment found on an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLink {
    pub url: String,
    /// Declared MIME type of the winning candidate, if any.
    pub mime_type: Option<String>,
}

/// Finds the first playable audio attachment of an entry.
///
/// Enclosures are scanned before generic links. A candidate qualifies when its
/// MIME type starts with `audio/` or its URL (query string ignored) ends in a
/// known audio extension; both checks run per candidate, in scan order.
pub fn resolve(entry: &RawEntry) -> Option<AudioLink> {
    entry.candidates().find_map(|candidate| {
        let url = candidate.location()?;
        is_audio(candidate, url).then(|| AudioLink {
            url: url.to_string(),
            mime_type: candidate.mime_type.clone(),
        })
    })
}

fn is_audio(candidate: &LinkCandidate, url: &str) -> bool {
    has_audio_mime(candidate.mime_type.as_deref()) || has_audio_extension(url)
}

fn has_audio_mime(mime: Option<&str>) -> bool {
    mime.and_then(|m| m.get(..6))
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("audio/"))
}

fn has_audio_extension(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url).to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
