//! Plain HTTP page fetcher.
//!
//! Used when `fetch_mode = "http"`: no scripts run, so the snapshot is the
//! server-sent HTML. Redirects are followed and the final URL recorded.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Per-request timeout taken from [`FetchOptions`], mapped to `FETCH_TIMEOUT`

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::{Duration, Instant};

pub use url::{UrlError, bare_host, canonicalize, host_matches, host_of};

use crate::page::{FetchOptions, PageFetcher, PageSnapshot};
use dossier_core::Error;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Client-wide timeout; individual fetches may lower it.
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: dossier_core::AppConfig::default().user_agent,
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(30_000),
            max_redirects: 5,
        }
    }
}

/// reqwest-backed [`PageFetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::HttpError(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }
        Ok(())
    }
}

fn map_reqwest(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("request exceeded {}ms", timeout.as_millis()))
    } else {
        Error::HttpError(format!("network error: {err}"))
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch_page(&self, url_str: &str, opts: &FetchOptions) -> Result<PageSnapshot, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .timeout(opts.timeout)
            .send()
            .await
            .map_err(|e| map_reqwest(e, opts.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        let final_url = response.url().clone();
        let bytes: Bytes = response.bytes().await.map_err(|e| map_reqwest(e, opts.timeout))?;
        self.check_size(bytes.len())?;

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(%url, %final_url, fetch_ms, bytes = bytes.len(), "fetched page over http");

        Ok(PageSnapshot {
            url: url_str.to_string(),
            final_url,
            html: String::from_utf8_lossy(&bytes).into_owned(),
            fetch_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert!(config.user_agent.contains("Mozilla/5.0"));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        assert!(FetchClient::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_network() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let err = client.fetch_page("ftp://example.com/x", &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(err.is_navigation());
    }

    #[test]
    fn test_size_guard() {
        let client = FetchClient::new(FetchConfig { max_bytes: 10, ..FetchConfig::default() }).unwrap();
        assert!(client.check_size(10).is_ok());
        assert!(matches!(client.check_size(11), Err(Error::HttpError(_))));
    }
}
