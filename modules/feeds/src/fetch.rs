use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::FeedError;

/// Turn a subscription link into something an HTTP client can fetch.
/// `feed://host/path` and `feed:https://host/path` become plain https/http URLs.
pub fn normalize_feed_url(raw: &str) -> Result<Url, FeedError> {
    let raw = raw.trim();
    let candidate = match raw.get(..5) {
        Some(p) if p.eq_ignore_ascii_case("feed:") => {
            let rest = &raw[5..];
            match rest.strip_prefix("//") {
                Some(hier) => format!("https://{}", hier),
                None => rest.to_string(),
            }
        }
        _ => raw.to_string(),
    };
    let url = Url::parse(&candidate)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FeedError::UnsupportedScheme(other.to_string())),
    }
}

/// Blocking GET of the feed document.
pub fn fetch_feed(raw_url: &str, timeout: Duration, user_agent: &str) -> Result<String, FeedError> {
    let url = normalize_feed_url(raw_url)?;
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()?;
    debug!(%url, "fetching feed");
    let resp = client.get(url.clone()).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status { url: url.to_string(), status: status.as_u16() });
    }
    Ok(resp.text()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a loopback port, returning the base URL.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            stream.write_all(response.as_bytes()).unwrap();
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (base, server) = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let err = fetch_feed(&format!("{base}/rss"), Duration::from_secs(5), "netkit-test").unwrap_err();
        server.join().unwrap();
        match err {
            FeedError::Status { url, status } => {
                assert_eq!(status, 404);
                assert_eq!(url, format!("{base}/rss"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn success_returns_body() {
        let (base, server) = serve_once("HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: 7\r\nConnection: close\r\n\r\n<rss/>\n");
        let body = fetch_feed(&format!("feed:{base}/rss"), Duration::from_secs(5), "netkit-test").unwrap();
        server.join().unwrap();
        assert_eq!(body, "<rss/>\n");
    }

    #[test]
    fn feed_scheme_becomes_https() {
        let u = normalize_feed_url("feed://developer.apple.com/news/releases/rss/releases.rss").unwrap();
        assert_eq!(u.as_str(), "https://developer.apple.com/news/releases/rss/releases.rss");
    }

    #[test]
    fn feed_prefix_wrapping_http_url() {
        let u = normalize_feed_url("feed:http://example.org/rss.xml").unwrap();
        assert_eq!(u.as_str(), "http://example.org/rss.xml");
    }

    #[test]
    fn http_urls_pass_through() {
        let u = normalize_feed_url(" https://example.org/atom ").unwrap();
        assert_eq!(u.scheme(), "https");
        assert_eq!(u.host_str(), Some("example.org"));
    }

    #[test]
    fn reject_other_schemes() {
        assert!(matches!(normalize_feed_url("ftp://example.org/rss"), Err(FeedError::UnsupportedScheme(s)) if s == "ftp"));
        assert!(matches!(normalize_feed_url("not a url"), Err(FeedError::Url(_))));
    }
}
