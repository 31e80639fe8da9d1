//! The page fetcher boundary.
//!
//! A fetcher turns a URL into a [`PageSnapshot`]: the document HTML as the
//! page presented it and the URL it finally resolved to. Extraction works on
//! snapshots only and never touches the network.

use std::time::Duration;

use async_trait::async_trait;
use dossier_core::Error;
use url::Url;

/// Options applied to a single fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Navigation ceiling; exceeding it is a `FETCH_TIMEOUT`.
    pub timeout: Duration,

    /// Wait for the page's own network activity to finish after load.
    pub wait_until_network_idle: bool,

    /// Extra wait after load for script-rendered content.
    pub settle: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(30_000),
            wait_until_network_idle: true,
            settle: Duration::from_millis(3_000),
        }
    }
}

/// A fetched page, ready for extraction.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// The URL as requested.
    pub url: String,
    /// The URL after redirects / client-side navigation.
    pub final_url: Url,
    pub html: String,
    pub fetch_ms: u64,
}

/// Something that can load a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, opts: &FetchOptions) -> Result<PageSnapshot, Error>;
}
