use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use url::Url;

use super::entry::RawEntry;
use super::parser::parse_feed;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
// Podcast hosts commonly chain tracking redirects before the real feed
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching and parsing one feed.
///
/// None of these abort a run; the aggregator reports them per feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Local feed file could not be read
    #[error("Failed to read feed file: {0}")]
    Io(#[from] std::io::Error),
    /// Feed document could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Builds the HTTP client used for feed fetches.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(redirect_policy())
        .user_agent(concat!("podmix/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
}

fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        let verdict = check_redirect(attempt.previous(), attempt.url());
        match verdict {
            Ok(()) => {
                tracing::debug!(
                    feed = %attempt.previous().first().map_or("", Url::as_str),
                    location = %attempt.url(),
                    hop = attempt.previous().len(),
                    "Feed moved, following redirect"
                );
                attempt.follow()
            }
            Err(reason) => attempt.error(reason),
        }
    })
}

/// Decides whether a feed request may hop from `chain` (the configured URL
/// first) to `next`.
fn check_redirect(chain: &[Url], next: &Url) -> Result<(), String> {
    if chain.contains(next) {
        return Err(format!("Feed redirects back to {}", next));
    }
    if chain.len() > MAX_REDIRECTS {
        return Err(format!(
            "Feed redirected more than {} times, last to {}",
            MAX_REDIRECTS, next
        ));
    }
    Ok(())
}

/// Something that turns a feed URL into parsed entries.
pub trait FeedSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<RawEntry>, FetchError>>;
}

/// Fetches feeds over HTTP(S), or from disk for paths and `file://` URLs.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    timeout: Duration,
    max_feed_size: usize,
}

impl Default for HttpFeedSource {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl HttpFeedSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
            max_feed_size: DEFAULT_MAX_FEED_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_feed_size(mut self, limit: usize) -> Self {
        self.max_feed_size = limit;
        self
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match Location::classify(url) {
            Location::Remote(url) => self.fetch_remote(url).await,
            Location::Local(path) => self.read_local(&path).await,
        }
    }

    async fn read_local(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let mut body = LimitedBody::new(self.max_feed_size, Some(size))?;

        // The file may grow after the size check
        let mut buf = Vec::with_capacity(body.bytes.capacity());
        file.take(self.max_feed_size as u64 + 1)
            .read_to_end(&mut buf)
            .await?;
        body.push(&buf)?;
        Ok(body.bytes)
    }

    async fn fetch_remote(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        tokio::time::timeout(
            self.timeout,
            read_limited_bytes(response, self.max_feed_size),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        let bytes = self.fetch_bytes(url).await?;
        parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// Where a configured feed URL points.
#[derive(Debug, PartialEq)]
enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    fn classify(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Location::Local(path),
                Err(()) => Location::Local(PathBuf::from(url.path())),
            },
            _ => Location::Local(PathBuf::from(raw)),
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let mut body = LimitedBody::new(limit, response.content_length())?;
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        body.push(&chunk?)?;
    }
    body.finish()
}

/// Feed body accumulated under a byte limit.
///
/// A declared length (Content-Length, or file size) over the limit is rejected
/// before any byte is read; a body shorter than its declared length is
/// reported as incomplete.
struct LimitedBody {
    bytes: Vec<u8>,
    limit: usize,
    declared: Option<u64>,
}

impl LimitedBody {
    fn new(limit: usize, declared: Option<u64>) -> Result<Self, FetchError> {
        let capacity = match declared {
            Some(len) if len > limit as u64 => return Err(FetchError::ResponseTooLarge),
            Some(len) => len as usize,
            None => 0,
        };
        Ok(Self {
            bytes: Vec::with_capacity(capacity),
            limit,
            declared,
        })
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        if chunk.len() > self.limit - self.bytes.len() {
            return Err(FetchError::ResponseTooLarge);
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, FetchError> {
        match self.declared {
            Some(expected) if (self.bytes.len() as u64) < expected => {
                Err(FetchError::IncompleteResponse {
                    expected,
                    received: self.bytes.len(),
                })
            }
            _ => Ok(self.bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><guid>1</guid><title>Test</title>
        <enclosure url="https://cdn.example/1.mp3" length="0" type="audio/mpeg"/>
    </item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default();
        let entries = source
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default();
        match source.fetch(&format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default();
        let result = source.fetch(&format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default();
        match source.fetch(&format!("{}/feed", mock_server.uri())).await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default().with_max_feed_size(16);
        let result = source.fetch(&format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::default().with_timeout(Duration::from_millis(100));
        let result = source.fetch(&format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_follows_redirect() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", format!("{}/feed", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::new(build_client().unwrap());
        let entries = source
            .fetch(&format!("{}/old", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_network_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/loop", mock_server.uri()).as_str()),
            )
            .mount(&mock_server)
            .await;

        let source = HttpFeedSource::new(build_client().unwrap());
        let result = source.fetch(&format!("{}/loop", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = std::env::temp_dir().join("podmix_fetch_test_local");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("feed.xml");
        std::fs::write(&file, VALID_RSS).unwrap();

        let source = HttpFeedSource::default();
        let entries = source.fetch(file.to_str().unwrap()).await.unwrap();
        assert_eq!(entries.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_oversized_local_file_rejected() {
        let dir = std::env::temp_dir().join("podmix_fetch_test_local_large");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("feed.xml");
        std::fs::write(&file, VALID_RSS).unwrap();

        let source = HttpFeedSource::default().with_max_feed_size(16);
        let result = source.fetch(file.to_str().unwrap()).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));

        let exact = HttpFeedSource::default().with_max_feed_size(VALID_RSS.len());
        assert_eq!(exact.fetch(file.to_str().unwrap()).await.unwrap().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_limited_body_rejects_declared_oversize_up_front() {
        assert!(matches!(
            LimitedBody::new(10, Some(11)),
            Err(FetchError::ResponseTooLarge)
        ));

        let mut body = LimitedBody::new(10, None).unwrap();
        body.push(b"12345").unwrap();
        body.push(b"67890").unwrap();
        assert!(matches!(body.push(b"x"), Err(FetchError::ResponseTooLarge)));
    }

    #[test]
    fn test_limited_body_short_of_declared_length_is_incomplete() {
        let mut body = LimitedBody::new(100, Some(8)).unwrap();
        body.push(b"1234").unwrap();
        match body.finish() {
            Err(FetchError::IncompleteResponse { expected, received }) => {
                assert_eq!((expected, received), (8, 4));
            }
            other => panic!("Expected IncompleteResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_check_redirect_limits() {
        let feed = Url::parse("https://host.example/feed").unwrap();
        let cdn = Url::parse("https://cdn.example/feed").unwrap();
        assert!(check_redirect(&[feed.clone()], &cdn).is_ok());
        assert!(check_redirect(&[feed.clone(), cdn.clone()], &feed).is_err());

        let chain: Vec<Url> = (0..=MAX_REDIRECTS)
            .map(|i| Url::parse(&format!("https://hop{}.example/feed", i)).unwrap())
            .collect();
        assert!(check_redirect(&chain[..MAX_REDIRECTS], &cdn).is_ok());
        assert!(check_redirect(&chain, &cdn).is_err());
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let source = HttpFeedSource::default();
        let result = source.fetch("/tmp/podmix_definitely_missing_feed.xml").await;
        assert!(matches!(result, Err(FetchError::Io(_))));
    }

    #[test]
    fn test_classify_locations() {
        assert!(matches!(
            Location::classify("https://example.com/feed.xml"),
            Location::Remote(_)
        ));
        assert_eq!(
            Location::classify("feeds/local.xml"),
            Location::Local(PathBuf::from("feeds/local.xml"))
        );
        assert_eq!(
            Location::classify("file:///tmp/feed.xml"),
            Location::Local(PathBuf::from("/tmp/feed.xml"))
        );
    }
}
