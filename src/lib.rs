//! Combines the latest playable episode of several podcast feeds into a
//! single RSS 2.0 feed.
//!
//! The pipeline is [`aggregate::Aggregator::run`] (fetch, then select one
//! episode per feed) followed by [`output::build`] and [`output::write_atomic`].

pub mod aggregate;
pub mod config;
pub mod feed;
pub mod output;
pub mod select;
