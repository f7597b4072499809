use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum pause between sequential per-category fetches. fbref blocks
    /// clients that go faster than roughly one request every 3 seconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// REST server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Locations of the static JSON registries
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_adv_stats_path")]
    pub adv_stats_path: PathBuf,

    #[serde(default = "default_column_map_path")]
    pub column_map_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub leagues_empty_policy: LeaguesEmptyPolicy,
}

/// When the leagues-by-country endpoint reports an invalid country code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaguesEmptyPolicy {
    /// Only when every league category came back empty.
    #[default]
    AllEmpty,
    /// As soon as any single category is empty.
    AnyEmpty,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://fbref.com/en/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    3000
}
fn default_user_agent() -> String {
    "fbref-api/0.1 (football statistics research)".to_string()
}
fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_adv_stats_path() -> PathBuf {
    PathBuf::from("data/adv_stats.json")
}
fn default_column_map_path() -> PathBuf {
    PathBuf::from("data/column_map.json")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            adv_stats_path: default_adv_stats_path(),
            column_map_path: default_column_map_path(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("FBREF").separator("__"))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}
