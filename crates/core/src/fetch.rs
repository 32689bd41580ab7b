//! Loading page sources from URLs, files and stdin.
//!
//! Only URL fetching needs the `fetch` feature; files and stdin are always
//! available so snapshots and saved pages work in minimal builds.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
#[cfg(feature = "fetch")]
use std::time::Duration;

use url::Url;

use crate::{ClipError, Result};

/// HTTP client configuration for fetching pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Clipblock/0.3; +https://github.com/stormlightlabs/clipblock)"
                .to_string(),
        }
    }
}

/// Parses and checks a page URL. Only `http` and `https` are accepted.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| ClipError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ClipError::InvalidUrl(format!("unsupported scheme `{}` in {}", scheme, url))),
    }
}

/// Fetches a page body over HTTP(S).
///
/// Follows redirects and honors the configured timeout and user agent.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = validate_url(url)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(ClipError::HttpError)?;

    tracing::debug!(url = %parsed_url, timeout = config.timeout, "fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| if e.is_timeout() { ClipError::Timeout { timeout: config.timeout } } else { ClipError::HttpError(e) })?
        .error_for_status()?;

    Ok(response.text().await?)
}

/// Reads a local file as UTF-8 text.
pub fn fetch_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ClipError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Reads standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
