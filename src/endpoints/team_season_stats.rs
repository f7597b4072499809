use super::{TEAM_ID, with_ids};
use crate::error::Result;
use crate::models::{ColumnMapping, DataResponse, EntityRecord};
use crate::registry::{CompType, StatMode};
use crate::scraper::parsers::{ParseOptions, RawTable, parse_stat_table};
use crate::scraper::{ScrapeContext, with_season};
use crate::stats::{StatCategoryMap, build_records, locate_categories, select_mode};
use tracing::{debug, info, warn};

const ADVANCED: &[(&str, &str)] = &[
    ("stats", r"^Squad\sStandard"),
    ("keepers", r"^Squad\sGoalkeeping"),
    ("keepersadv", r"^Squad\sAdvanced\sGoalkeeping"),
    ("shooting", r"^Squad\sShooting"),
    ("passing", r"^Squad\sPassing"),
    ("passing_types", r"^Squad\sPass\sTypes"),
    ("gca", r"^Squad\sGoal\sand\sShot\sCreation"),
    ("defense", r"^Squad\sDefensive\sActions"),
    ("possession", r"^Squad\sPossession"),
    ("playingtime", r"^Squad\sPlaying\sTime"),
    ("misc", r"^Squad\sMiscellaneous"),
];

/// More categories than this means the advanced layout.
const THRESHOLD: usize = 5;

const NON_ADVANCED: &[(&str, &str)] = &[
    ("stats", r"^Squad\sStandard"),
    ("keepers", r"^Squad\sGoalkeeping"),
    ("shooting", r"^Squad\sShooting"),
    ("playingtime", r"^Squad\sPlaying\sTime"),
    ("misc", r"^Squad\sMiscellaneous"),
];

/// One record per team in a league-season, all squad stat categories merged.
///
/// Leagues publish every squad table on the season overview page; cups only
/// publish one category per page, so those are fetched one by one.
pub async fn scrape(
    ctx: &ScrapeContext,
    league_id: &str,
    season_id: Option<&str>,
) -> Result<DataResponse<Vec<EntityRecord>>> {
    let Some(league) = ctx.league_info(league_id) else {
        return Ok(DataResponse::new(Vec::new()));
    };
    let categories = if league.is_advanced() { ADVANCED } else { NON_ADVANCED };
    let base = with_season(&format!("comps/{}/", league_id), season_id);

    let mut raw = match league.comp_type {
        CompType::League => from_league(ctx, &base, categories).await?,
        CompType::Cup => from_cup(ctx, &base, categories).await,
    };
    // A sparse page is cleaned with the basic layout, which has no map for
    // the advanced-only categories.
    if select_mode(raw.len(), THRESHOLD) == StatMode::NonAdvanced {
        raw.retain(|(category, _)| {
            let keep = NON_ADVANCED.iter().any(|(name, _)| name == category);
            if !keep {
                debug!("Dropping {} from a basic-layout page", category);
            }
            keep
        });
    }

    let entity = ctx.column_map.entity("team_season_stats")?;
    let records = build_records(entity, raw, THRESHOLD, ("stats", "team_id"))?;
    info!("League {}: {} team season records", league_id, records.len());
    Ok(DataResponse::new(records))
}

async fn from_league(ctx: &ScrapeContext, base: &str, categories: &[(&str, &str)]) -> Result<StatCategoryMap> {
    let tables = ctx.fetch_tables(base).await?;
    Ok(locate_categories(&tables, categories)?
        .into_iter()
        .map(|(category, table)| (category, squad_table(table)))
        .collect())
}

/// A category page that cannot be fetched, or has no table, is kept as an
/// empty category.
async fn from_cup(ctx: &ScrapeContext, base: &str, categories: &[(&str, &str)]) -> StatCategoryMap {
    let paths: Vec<String> = categories.iter().map(|(cat, _)| format!("{}{}/", base, cat)).collect();
    let pages = ctx.fetch_sequential_lenient(&paths).await;

    categories
        .iter()
        .zip(pages)
        .map(|((category, _), page)| {
            let mapping = match page.as_deref().and_then(<[RawTable]>::first) {
                Some(table) => squad_table(table),
                None => {
                    warn!("No {} table for {}", category, base);
                    ColumnMapping::new()
                }
            };
            (category.to_string(), mapping)
        })
        .collect()
}

fn squad_table(table: &RawTable) -> ColumnMapping {
    let parsed = parse_stat_table(table, ParseOptions::skip_header());
    with_ids(&parsed, &[("team_id", TEAM_ID.as_slice())])
}
