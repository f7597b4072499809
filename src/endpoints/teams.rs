use super::{LEAGUE_ID, MATCH_ID, PLAYER_ID, TEAM_ID, with_ids};
use crate::error::Result;
use crate::models::{DataResponse, Record, TeamResponse};
use crate::scraper::cleaner::{clean_column, clean_gf_ga, clean_team_name, convert, delete_keys, rename, reorder, reorient};
use crate::scraper::parsers::{ParseOptions, RawTable, compile_patterns, find_by_caption, parse_table};
use crate::scraper::{ScrapeContext, with_season};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::info;

static AGE_YEARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2})").expect("age pattern"));

const ROSTER_DROP: &[&str] = &[
    "min", "90s", "gls", "ast", "g+a", "g-pk", "pk", "pkatt", "crdy", "crdr", "xg", "npxg", "xag",
    "npxg+xag", "prgc", "prgp", "prgr", "g+a-pk", "xg+xag", "matches", "nation",
];
const ROSTER_ORDER: &[&str] = &["player", "player_id", "nationality", "position", "age", "mp", "starts"];

const SCHEDULE_DROP: &[&str] = &["xg", "xga", "poss", "match_report", "notes", "day"];
const SCHEDULE_ORDER: &[&str] = &[
    "date",
    "time",
    "match_id",
    "league_name",
    "league_id",
    "round",
    "opponent",
    "opponent_id",
    "home_away",
    "result",
    "gf",
    "ga",
    "attendance",
    "captain",
    "formation",
    "referee",
];

/// Roster and fixtures of one team-season.
pub async fn scrape(ctx: &ScrapeContext, team_id: &str, season_id: Option<&str>) -> Result<TeamResponse> {
    let tables = ctx
        .fetch_tables(&with_season(&format!("squads/{}/", team_id), season_id))
        .await?;

    let roster = match first_captioned(&tables, r"^Standard\sStats")? {
        Some(table) => roster(table)?,
        None => Vec::new(),
    };
    let schedule = match first_captioned(&tables, r"^Scores\s&\sFixtures")? {
        Some(table) => schedule(table)?,
        None => Vec::new(),
    };

    info!("Team {}: {} players, {} fixtures", team_id, roster.len(), schedule.len());
    Ok(TeamResponse {
        team_roster: DataResponse::new(roster),
        team_schedule: DataResponse::new(schedule),
    })
}

fn first_captioned<'a>(tables: &'a [RawTable], caption: &str) -> Result<Option<&'a RawTable>> {
    let patterns = compile_patterns(&[caption])?;
    Ok(find_by_caption(tables, &patterns).first().copied())
}

fn roster(table: &RawTable) -> Result<Vec<Record>> {
    let opts = ParseOptions {
        skip_row: true,
        exclude_totals: true,
        ..Default::default()
    };
    let parsed = parse_table(table, opts);
    let mut mapping = with_ids(&parsed, &[("player_id", PLAYER_ID.as_slice())]);

    if let Some(nations) = mapping.values("nation").map(<[Value]>::to_vec) {
        mapping.insert_values("nationality", nations);
        clean_column(&mut mapping, "nationality", clean_team_name);
    }
    mapping.map_column("age", |v| {
        v.as_str()
            .and_then(|s| AGE_YEARS.captures(s))
            .map(|caps| Value::String(caps[1].to_string()))
            .unwrap_or(Value::Null)
    });

    let mapping = rename(delete_keys(mapping, ROSTER_DROP), "pos", "position");
    let mapping = reorder(convert(mapping, &["age", "mp", "starts"], &[])?, ROSTER_ORDER);
    Ok(reorient(&mapping, "player"))
}

fn schedule(table: &RawTable) -> Result<Vec<Record>> {
    let parsed = parse_table(table, ParseOptions::default());
    let mut mapping = with_ids(
        &parsed,
        &[
            ("match_id", MATCH_ID.as_slice()),
            ("league_id", LEAGUE_ID.as_slice()),
            ("opponent_id", TEAM_ID.as_slice()),
        ],
    );
    clean_column(&mut mapping, "opponent", clean_team_name);
    clean_column(&mut mapping, "gf", clean_gf_ga);
    clean_column(&mut mapping, "ga", clean_gf_ga);

    let mapping = rename(rename(mapping, "venue", "home_away"), "comp", "league_name");
    let mapping = delete_keys(mapping, SCHEDULE_DROP);
    let mapping = reorder(convert(mapping, &["gf", "ga", "league_id"], &[])?, SCHEDULE_ORDER);
    Ok(reorient(&mapping, "date"))
}
