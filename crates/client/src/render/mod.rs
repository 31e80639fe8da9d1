//! Headless browser page fetcher.
//!
//! One Chromium instance is launched per run and reused for every URL; each
//! URL gets a fresh tab that is closed again whatever the outcome. Profile
//! pages build most of their content with scripts, so after the load event
//! the tab is left to settle before the HTML is read.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::canonicalize;
use crate::page::{FetchOptions, PageFetcher, PageSnapshot};

/// Errors that can occur while driving the browser.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    #[error("navigation exceeded {0}ms")]
    Timeout(u64),
}

impl From<RenderError> for dossier_core::Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Timeout(_) => dossier_core::Error::FetchTimeout(err.to_string()),
            other => dossier_core::Error::RenderFailed(other.to_string()),
        }
    }
}

/// Owns an open tab until it is closed.
///
/// Dropping the guard without calling [`TabGuard::close`], which happens
/// when the caller times out the fetch, hands the close to a background
/// task so the tab never outlives its URL.
struct TabGuard<T, F, Fut>
where
    T: Clone,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    tab: T,
    close: Option<F>,
}

impl<T, F, Fut> TabGuard<T, F, Fut>
where
    T: Clone,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn new(tab: T, close: F) -> Self {
        Self { tab, close: Some(close) }
    }

    fn tab(&self) -> &T {
        &self.tab
    }

    async fn close(mut self) {
        if let Some(close) = self.close.take() {
            close(self.tab.clone()).await;
        }
    }
}

impl<T, F, Fut> Drop for TabGuard<T, F, Fut>
where
    T: Clone,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn drop(&mut self) {
        let Some(close) = self.close.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close(self.tab.clone()));
            }
            Err(_) => tracing::warn!("no runtime to close an abandoned tab"),
        }
    }
}

async fn close_tab(page: Page) {
    if let Err(e) = page.close().await {
        tracing::debug!("tab close failed: {e}");
    }
}

/// Headless Chrome/Chromium renderer using chromiumoxide.
pub struct HeadlessRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: String,
}

impl HeadlessRenderer {
    /// Launch a headless browser.
    ///
    /// A background task drains Chrome DevTools Protocol events for as long
    /// as the browser lives.
    pub async fn launch(user_agent: impl Into<String>) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(RenderError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::info!("headless browser launched");
        Ok(Self { browser, handler, user_agent: user_agent.into() })
    }

    /// Shut the browser down. Errors are logged, not returned; the run is
    /// already over by the time this is called.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("browser wait failed: {e}");
        }
        self.handler.abort();
    }

    async fn load(&self, page: &Page, url: &Url, opts: &FetchOptions) -> Result<(String, Url), RenderError> {
        page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let budget_ms = opts.timeout.as_millis() as u64;
        tokio::time::timeout(opts.timeout, async {
            page.goto(url.as_str())
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            if opts.wait_until_network_idle {
                page.wait_for_navigation()
                    .await
                    .map_err(|e| RenderError::Navigation(e.to_string()))?;
            }
            Ok::<(), RenderError>(())
        })
        .await
        .map_err(|_| RenderError::Timeout(budget_ms))??;

        if !opts.settle.is_zero() {
            tokio::time::sleep(opts.settle).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;

        let final_url = match page.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            Ok(None) => url.clone(),
            Err(e) => return Err(RenderError::ContentRetrieval(e.to_string())),
        };

        Ok((html, final_url))
    }
}

#[async_trait]
impl PageFetcher for HeadlessRenderer {
    async fn fetch_page(&self, url_str: &str, opts: &FetchOptions) -> Result<PageSnapshot, dossier_core::Error> {
        let url = canonicalize(url_str).map_err(|e| dossier_core::Error::InvalidUrl(e.to_string()))?;
        let start = Instant::now();

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let tab = TabGuard::new(page, close_tab);
        let loaded = self.load(tab.tab(), &url, opts).await;
        tab.close().await;

        let (html, final_url) = loaded?;
        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(%url, %final_url, fetch_ms, bytes = html.len(), "rendered page");

        Ok(PageSnapshot { url: url_str.to_string(), final_url, html, fetch_ms })
    }
}
