use crate::error::{Result, ScrapeError};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

// ── Advanced-stats registry ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasAdvStats {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompType {
    League,
    Cup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LeagueInfo {
    pub has_adv_stats: HasAdvStats,
    pub comp_type: CompType,
}

impl LeagueInfo {
    pub fn is_advanced(&self) -> bool {
        self.has_adv_stats == HasAdvStats::Yes
    }
}

impl HasAdvStats {
    pub fn as_str(&self) -> &'static str {
        match self {
            HasAdvStats::Yes => "yes",
            HasAdvStats::No => "no",
        }
    }
}

impl CompType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompType::League => "league",
            CompType::Cup => "cup",
        }
    }
}

/// League id → advanced-stat availability and competition type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AdvStatsRegistry {
    leagues: HashMap<String, LeagueInfo>,
}

impl AdvStatsRegistry {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read advanced-stats registry {:?}", path))?;
        let registry: Self = serde_json::from_str(&text)
            .with_context(|| format!("Malformed advanced-stats registry {:?}", path))?;
        info!("Loaded advanced-stats registry: {} competitions", registry.leagues.len());
        Ok(registry)
    }

    /// `None` for competitions the registry does not track.
    pub fn lookup(&self, league_id: &str) -> Option<&LeagueInfo> {
        self.leagues.get(league_id.trim())
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }
}

impl FromIterator<(String, LeagueInfo)> for AdvStatsRegistry {
    fn from_iter<I: IntoIterator<Item = (String, LeagueInfo)>>(iter: I) -> Self {
        Self { leagues: iter.into_iter().collect() }
    }
}

// ── Column map ────────────────────────────────────────────────────────────────

/// Cleaning instructions for one statistic category in one mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub drop_columns: Vec<String>,
    /// Raw header → output name.
    #[serde(default)]
    pub name_mapping: HashMap<String, String>,
    /// Output keys, in order. Anything not listed is dropped.
    #[serde(default)]
    pub final_order: Vec<String>,
    #[serde(default)]
    pub int_columns: Vec<String>,
    #[serde(default)]
    pub float_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatMode {
    Advanced,
    NonAdvanced,
}

impl StatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatMode::Advanced => "advanced",
            StatMode::NonAdvanced => "non_advanced",
        }
    }
}

/// Column map for one unit of observation (e.g. `team_season_stats`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityColumnMap {
    /// Identity/context fields hoisted into `meta_data` during reassembly.
    #[serde(default)]
    pub meta_data: Vec<String>,
    #[serde(default)]
    pub advanced: HashMap<String, CategoryConfig>,
    #[serde(default)]
    pub non_advanced: HashMap<String, CategoryConfig>,
}

impl EntityColumnMap {
    pub fn mode(&self, mode: StatMode) -> &HashMap<String, CategoryConfig> {
        match mode {
            StatMode::Advanced => &self.advanced,
            StatMode::NonAdvanced => &self.non_advanced,
        }
    }

    pub fn category(&self, mode: StatMode, category: &str) -> Result<&CategoryConfig> {
        self.mode(mode).get(category).ok_or_else(|| {
            ScrapeError::Configuration(format!(
                "no {} column map for category `{}`",
                mode.as_str(),
                category
            ))
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapConfig {
    entities: HashMap<String, EntityColumnMap>,
}

impl ColumnMapConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read column map {:?}", path))?;
        let map: Self =
            serde_json::from_str(&text).with_context(|| format!("Malformed column map {:?}", path))?;
        info!("Loaded column map: {} entity types", map.entities.len());
        Ok(map)
    }

    pub fn entity(&self, name: &str) -> Result<&EntityColumnMap> {
        self.entities
            .get(name)
            .ok_or_else(|| ScrapeError::Configuration(format!("no column map for `{}`", name)))
    }

    pub fn insert(&mut self, name: impl Into<String>, map: EntityColumnMap) {
        self.entities.insert(name.into(), map);
    }
}
