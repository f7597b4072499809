pub mod cleaner;
pub mod http_client;
pub mod parsers;

#[cfg(test)]
pub mod testing;

use crate::config::{AppConfig, LeaguesEmptyPolicy};
use crate::error::Result;
use crate::registry::{AdvStatsRegistry, ColumnMapConfig, LeagueInfo};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use self::parsers::{RawTable, tables_from_html};

// ── Fetch trait ───────────────────────────────────────────────────────────────

/// Swappable page source. Returns the raw HTML body; parsing happens after
/// the await point so no DOM is held across it.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// ── Scrape context ────────────────────────────────────────────────────────────

/// Everything an endpoint scraper needs, passed explicitly.
#[derive(Clone)]
pub struct ScrapeContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub base_url: Url,
    /// Minimum pause between two fetches of one sequential scrape.
    pub request_delay: Duration,
    pub adv_stats: Arc<AdvStatsRegistry>,
    pub column_map: Arc<ColumnMapConfig>,
    pub leagues_empty_policy: LeaguesEmptyPolicy,
}

impl ScrapeContext {
    pub fn new(
        config: &AppConfig,
        fetcher: Arc<dyn PageFetcher>,
        adv_stats: Arc<AdvStatsRegistry>,
        column_map: Arc<ColumnMapConfig>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            base_url: base_url(&config.scraper.base_url)?,
            request_delay: Duration::from_millis(config.scraper.request_delay_ms),
            adv_stats,
            column_map,
            leagues_empty_policy: config.policy.leagues_empty_policy,
        })
    }

    /// Absolute URL for a site-relative path such as `comps/9/history/`.
    pub fn url(&self, path: &str) -> Result<String> {
        Ok(self.base_url.join(path)?.to_string())
    }

    pub fn league_info(&self, league_id: &str) -> Option<LeagueInfo> {
        let info = self.adv_stats.lookup(league_id).copied();
        if info.is_none() {
            warn!("League {} is not in the advanced-stats registry", league_id);
        }
        info
    }

    pub async fn fetch_page(&self, path: &str) -> Result<String> {
        let url = self.url(path)?;
        debug!("Fetching {}", url);
        self.fetcher.fetch(&url).await
    }

    /// Fetch one page and snapshot every table on it (comment-embedded included).
    pub async fn fetch_tables(&self, path: &str) -> Result<Vec<RawTable>> {
        let html = self.fetch_page(path).await?;
        Ok(tables_from_html(&html))
    }

    /// Fetch pages strictly one after another, pausing `request_delay`
    /// between them. Stops at the first failure.
    pub async fn fetch_sequential(&self, paths: &[String]) -> Result<Vec<Vec<RawTable>>> {
        let mut pages = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            self.pace(i).await;
            info!("Fetching page {}/{}: {}", i + 1, paths.len(), path);
            pages.push(self.fetch_tables(path).await?);
        }
        Ok(pages)
    }

    /// Same pacing as [`Self::fetch_sequential`], but a failed page is
    /// logged and reported as `None` instead of aborting the scrape.
    pub async fn fetch_sequential_lenient(&self, paths: &[String]) -> Vec<Option<Vec<RawTable>>> {
        let mut pages = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            self.pace(i).await;
            info!("Fetching page {}/{}: {}", i + 1, paths.len(), path);
            match self.fetch_tables(path).await {
                Ok(tables) => pages.push(Some(tables)),
                Err(e) => {
                    warn!("Skipping {}: {}", path, e);
                    pages.push(None);
                }
            }
        }
        pages
    }

    async fn pace(&self, i: usize) {
        if i > 0 && !self.request_delay.is_zero() {
            sleep(self.request_delay).await;
        }
    }
}

fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Ok(Url::parse(&raw)?)
}

/// `"{prefix}{season}/"` when a season is given, otherwise just `prefix`.
pub fn with_season(prefix: &str, season_id: Option<&str>) -> String {
    match season_id {
        Some(season) => format!("{}{}/", prefix, season),
        None => prefix.to_string(),
    }
}
