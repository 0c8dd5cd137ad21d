//! Combined feed output.
//!
//! - [`builder`] orders the selected episodes and wraps them in channel metadata
//! - [`rss`] serializes the channel as RSS 2.0 with `quick-xml`
//! - [`writer`] persists the document atomically

mod builder;
mod rss;
mod writer;

pub use builder::{build, build_at, ChannelMetadata};
pub use rss::{render_rss, rfc822, Channel, Enclosure, Item};
pub use writer::write_atomic;
