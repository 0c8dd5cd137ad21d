//! Source feed handling: the configured feed list, fetching, and parsing.
//!
//! - [`feed_list`] - Loads the `{ name, url }` feed descriptors to combine
//! - [`fetcher`] - Retrieves a feed over HTTP(S) or from disk
//! - [`parser`] - Converts RSS/Atom/JSON Feed documents into [`RawEntry`] values
//!   using the `feed-rs` crate
//!
//! # Example
//!
//! ```ignore
//! use podmix::feed::{FeedList, FeedSource, HttpFeedSource};
//!
//! let feeds = FeedList::load(Path::new("feeds.json"))?;
//! let entries = HttpFeedSource::default().fetch("https://example.com/rss").await?;
//! ```

mod entry;
mod feed_list;
mod fetcher;
mod parser;

pub use entry::{LinkCandidate, RawEntry};
pub use feed_list::{FeedConfig, FeedList, FeedListError};
pub use fetcher::{build_client, FeedSource, FetchError, HttpFeedSource};
pub use parser::parse_feed;
