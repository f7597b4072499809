use super::{MATCH_ID, TEAM_ID, with_ids};
use crate::error::Result;
use crate::models::{ColumnMapping, DataResponse, EntityRecord};
use crate::scraper::ScrapeContext;
use crate::scraper::parsers::{ParseOptions, RawTable, parse_stat_table};
use crate::stats::{StatCategoryMap, build_records};
use tracing::info;

const ADVANCED: &[&str] = &["summary", "passing", "passing_types", "gca", "defense", "possession", "misc"];
const NON_ADVANCED: &[&str] = &["summary"];

/// One record per match a player appeared in, for one competition-season.
/// Category pages are fetched strictly in order with the configured pause
/// between them.
pub async fn scrape(
    ctx: &ScrapeContext,
    player_id: &str,
    league_id: &str,
    season_id: &str,
) -> Result<DataResponse<Vec<EntityRecord>>> {
    let Some(league) = ctx.league_info(league_id) else {
        return Ok(DataResponse::new(Vec::new()));
    };
    let categories = if league.is_advanced() { ADVANCED } else { NON_ADVANCED };

    let paths: Vec<String> = categories
        .iter()
        .map(|cat| format!("players/{}/matchlogs/{}/c{}/{}/", player_id, season_id, league_id, cat))
        .collect();
    let pages = ctx.fetch_sequential(&paths).await?;

    let raw: StatCategoryMap = categories
        .iter()
        .zip(&pages)
        .map(|(category, tables)| (category.to_string(), tables.first().map(match_log).unwrap_or_default()))
        .collect();

    let entity = ctx.column_map.entity("player_match_stats")?;
    let records = build_records(entity, raw, 1, ("summary", "match_id"))?;
    info!("Player {} in league {}: {} match records", player_id, league_id, records.len());
    Ok(DataResponse::new(records))
}

fn match_log(table: &RawTable) -> ColumnMapping {
    let parsed = parse_stat_table(table, ParseOptions { skip_row: true, drop_rows: 1, ..Default::default() });
    let mut mapping = with_ids(&parsed, &[("match_id", MATCH_ID.as_slice())]);
    let (team, opponent) = parsed.extract_id_pairs(&TEAM_ID);
    mapping.insert_opt_strings("team_id", team);
    mapping.insert_opt_strings("opponent_id", opponent);
    mapping
}
