//! HTTP client for Flipkart pages using wreq.

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::flipkart::models::{ProductLink, Query};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;
use wreq_util::Emulation;

/// Trait for fetching Flipkart pages - enables mocking for tests.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetches the search results page for a query.
    async fn search(&self, query: &Query) -> Result<String>;

    /// Fetches a page by absolute URL.
    async fn fetch(&self, link: &ProductLink) -> Result<String>;

    /// Base URL that relative links are joined to.
    fn base_url(&self) -> &str;
}

/// Flipkart HTTP client. One plain GET per call, no retries.
pub struct FlipkartClient {
    client: Client,
    base_url: String,
    emulate_browser: bool,
}

impl FlipkartClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a new client with an optional base URL override (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy =
                wreq::Proxy::all(proxy_url).map_err(|e| ScrapeError::network(proxy_url, e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| ScrapeError::network("<client>", e))?;

        let base_url = base_url.unwrap_or_else(|| config.base_url.clone());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            emulate_browser: config.emulate_browser,
        })
    }

    /// Performs a GET request and returns the body text.
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if self.emulate_browser {
            request = request.emulation(Emulation::Chrome131);
        }

        let response = request.send().await.map_err(|e| ScrapeError::network(url, e))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(ScrapeError::network(url, format!("request failed with status {}", status)));
        }

        response.text().await.map_err(|e| ScrapeError::network(url, e))
    }
}

#[async_trait]
impl ReviewSource for FlipkartClient {
    async fn search(&self, query: &Query) -> Result<String> {
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(query.as_str()));

        info!("Opening search page: {}", url);
        self.get(&url).await
    }

    async fn fetch(&self, link: &ProductLink) -> Result<String> {
        info!("Fetching page: {}", link);
        self.get(link.as_str()).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
