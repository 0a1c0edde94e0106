//! Loopback URLs handed to the content consumer.

use url::Url;

pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Builds `http://127.0.0.1:<port><path>?<query>`.
///
/// `query` is produced elsewhere and is treated as opaque; it is left out
/// entirely when empty. Separators and existing escapes pass through
/// unchanged, but characters a URL query cannot carry literally (space,
/// `#`, quotes, angle brackets, control characters) are percent-encoded.
///
/// # Example
///
/// ```
/// # use localserve::launch_url;
/// let url = launch_url(8123, "/index.html", "speed=2&font=mono").unwrap();
/// assert_eq!(url.as_str(), "http://127.0.0.1:8123/index.html?speed=2&font=mono");
/// ```
pub fn launch_url(port: u16, path: &str, query: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("http://{LOOPBACK_HOST}:{port}/"))?;
    url.set_path(path);
    if !query.is_empty() {
        url.set_query(Some(query.trim_start_matches('?')));
    }
    Ok(url)
}
