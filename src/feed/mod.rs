//! RSS feed retrieval and parsing.
//!
//! The module is organized into two submodules:
//!
//! - [`fetcher`] - single-attempt HTTP retrieval with a per-call deadline
//! - [`parser`] - RSS 2.0 document decoding with HTML entity cleanup
//!
//! Fetching and parsing are deliberately independent: the aggregator
//! records a fetch as complete before it ever looks at the payload, so
//! neither half may depend on the other succeeding.

mod fetcher;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, USER_AGENT};
pub use parser::{parse_feed, ParseError, RssChannel, RssItem};
