//! Feed digest: fetch an RSS/Atom feed and keep the entries that mention one
//! of a set of products.

mod error;
mod fetch;
mod matcher;
mod parse;

pub use error::FeedError;
pub use fetch::{fetch_feed, normalize_feed_url};
pub use matcher::{FeedRow, ProductMatcher, DEFAULT_PATTERNS};
pub use parse::{parse_feed, FeedEntry};

use tracing::info;

pub const DEFAULT_FEED_URL: &str = "feed://developer.apple.com/news/releases/rss/releases.rss";

pub const HEADERS: [&str; 4] = ["Product", "Title", "Link", "Date"];

/// Parse `xml` and keep the entries `matcher` recognises.
pub fn digest(xml: &str, matcher: &ProductMatcher) -> Result<Vec<FeedRow>, FeedError> {
    let entries = parse_feed(xml)?;
    let rows = matcher.rows(&entries);
    info!(entries = entries.len(), matched = rows.len(), "feed digested");
    Ok(rows)
}
