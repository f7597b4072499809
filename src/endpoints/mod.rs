//! One scraper per REST endpoint. Each composes the table locator, row
//! parser, id extractor and key-shaping helpers with its own URL layout,
//! caption patterns and output order.

pub mod all_players_match_stats;
pub mod countries;
pub mod league_season_details;
pub mod league_seasons;
pub mod league_standings;
pub mod leagues;
pub mod matches;
pub mod player_match_stats;
pub mod player_season_stats;
pub mod players;
pub mod team_match_stats;
pub mod team_season_stats;
pub mod teams;

use crate::models::ColumnMapping;
use crate::scraper::parsers::ParsedTable;
use regex::Regex;
use std::sync::LazyLock;

// ── Id patterns ───────────────────────────────────────────────────────────────

fn pattern(p: &str) -> Vec<Regex> {
    vec![Regex::new(p).expect("id pattern")]
}

pub(crate) static PLAYER_ID: LazyLock<Vec<Regex>> = LazyLock::new(|| pattern(r"players/(\w{8})/"));
pub(crate) static TEAM_ID: LazyLock<Vec<Regex>> = LazyLock::new(|| pattern(r"squads/(\w{8})/"));
pub(crate) static MATCH_ID: LazyLock<Vec<Regex>> = LazyLock::new(|| pattern(r"matches/(\w{8})/"));
pub(crate) static LEAGUE_ID: LazyLock<Vec<Regex>> = LazyLock::new(|| pattern(r"comps/(\d+)/"));
pub(crate) static COUNTRY_CODE: LazyLock<Vec<Regex>> = LazyLock::new(|| pattern(r"country/([A-Z]{3})/"));

/// Column mapping of `parsed` plus one id column per `(name, patterns)`,
/// each aligned with the parsed rows.
pub(crate) fn with_ids(parsed: &ParsedTable, ids: &[(&str, &[Regex])]) -> ColumnMapping {
    let mut mapping = parsed.to_column_mapping();
    for (name, patterns) in ids {
        mapping.insert_opt_strings(*name, parsed.extract_ids(patterns));
    }
    mapping
}
