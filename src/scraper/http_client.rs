use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::PageFetcher;

/// reqwest-backed fetcher. One GET per call: no retries, no pacing (the
/// caller's [`super::ScrapeContext`] owns the inter-request delay).
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let resp = self.inner.get(url).send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ScrapeError::UpstreamFetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            warn!("HTTP {} from {}", status, url);
            return Err(ScrapeError::UpstreamFetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        resp.text().await.map_err(|e| ScrapeError::UpstreamFetch {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })
    }
}
