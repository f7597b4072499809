//! In-memory fetcher and context builders shared by scraper tests.

use super::{PageFetcher, ScrapeContext};
use crate::config::AppConfig;
use crate::error::{Result, ScrapeError};
use crate::registry::{AdvStatsRegistry, ColumnMapConfig, CompType, HasAdvStats, LeagueInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Serves canned pages by absolute URL and records every request.
#[derive(Clone, Default)]
pub struct RecordingFetcher {
    pages: Arc<HashMap<String, String>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), html.into());
        self
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl PageFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push((url.to_string(), Instant::now()));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::NotFound(url.to_string()))
    }
}

pub fn shipped_column_map() -> ColumnMapConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/column_map.json");
    ColumnMapConfig::load(&path).unwrap()
}

pub fn registry(entries: &[(&str, HasAdvStats, CompType)]) -> AdvStatsRegistry {
    entries
        .iter()
        .map(|(id, has_adv_stats, comp_type)| {
            (
                id.to_string(),
                LeagueInfo {
                    has_adv_stats: *has_adv_stats,
                    comp_type: *comp_type,
                },
            )
        })
        .collect()
}

/// Context against `https://fbref.com/en/` with no inter-request delay.
pub fn context(fetcher: RecordingFetcher, adv_stats: AdvStatsRegistry) -> ScrapeContext {
    let mut ctx = ScrapeContext::new(
        &AppConfig::default(),
        Arc::new(fetcher),
        Arc::new(adv_stats),
        Arc::new(shipped_column_map()),
    )
    .unwrap();
    ctx.request_delay = Duration::ZERO;
    ctx
}

/// `<table>` markup with a caption, one header row and the given body rows.
pub fn table_html(caption: &str, header: &[&str], rows: &[String]) -> String {
    let header: String = header.iter().map(|h| format!("<th>{h}</th>")).collect();
    format!(
        "<table><caption>{caption}</caption><tr>{header}</tr>{}</table>",
        rows.concat()
    )
}

pub fn page(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}
