use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unsupported feed scheme: {0}")]
    UnsupportedScheme(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed feed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid product pattern: {0}")]
    Pattern(#[from] regex::Error),
}
