use crate::error::{Result, ScrapeError};
use crate::models::{DataResponse, LeagueSeasonDetails};
use crate::scraper::cleaner::parse_date;
use crate::scraper::parsers::{ParseOptions, compile_patterns, find_by_caption, parse_table};
use crate::scraper::{ScrapeContext, with_season};
use serde_json::Value;
use tracing::info;

/// Date span, rounds and registry metadata for one league-season, derived
/// from its fixtures table.
pub async fn scrape(
    ctx: &ScrapeContext,
    league_id: &str,
    season_id: Option<&str>,
) -> Result<DataResponse<LeagueSeasonDetails>> {
    let lg_id: u32 = league_id
        .trim()
        .parse()
        .map_err(|_| ScrapeError::InvalidParameters(format!("league_id `{}` is not numeric", league_id)))?;

    let path = format!("{}schedule/", with_season(&format!("comps/{}/", lg_id), season_id));
    let tables = ctx.fetch_tables(&path).await?;
    let patterns = compile_patterns(&[r"^Scores\s"])?;
    let table = find_by_caption(&tables, &patterns)
        .first()
        .copied()
        .ok_or_else(|| ScrapeError::NotFound(format!("fixtures for league {}", lg_id)))?;

    let mapping = parse_table(table, ParseOptions::default()).to_column_mapping();

    // Repeated header rows and unscheduled fixtures carry no parseable date.
    let dates: Vec<String> = mapping
        .values("date")
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_str().and_then(parse_date))
        .collect();

    let rounds = mapping.values("round").map(|values| {
        let mut distinct: Vec<String> = Vec::new();
        for round in values.iter().filter_map(Value::as_str) {
            if !round.is_empty() && round != "Round" && !distinct.iter().any(|r| r == round) {
                distinct.push(round.to_string());
            }
        }
        distinct
    });

    let info = ctx.league_info(&lg_id.to_string());
    let details = LeagueSeasonDetails {
        lg_id,
        season_id: season_id.unwrap_or("most_recent_season").to_string(),
        league_start: dates.iter().min().cloned(),
        league_end: dates.iter().max().cloned(),
        league_type: info.map(|i| i.comp_type.as_str().to_string()),
        has_adv_stats: info.map(|i| i.has_adv_stats.as_str().to_string()),
        rounds,
    };
    info!(
        "League {} season {}: {:?} → {:?}",
        lg_id, details.season_id, details.league_start, details.league_end
    );
    Ok(DataResponse::new(details))
}
