use super::{LEAGUE_ID, with_ids};
use crate::config::LeaguesEmptyPolicy;
use crate::error::{Result, ScrapeError};
use crate::models::{ColumnMapping, DataResponse, LeagueGroup, Record};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::{convert, reorder, reorient};
use crate::scraper::parsers::{ParseOptions, RawTable, compile_patterns, find_by_caption, parse_table};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;
use tracing::{debug, info};

const ORDER: &[&str] = &[
    "league_id",
    "competition_name",
    "gender",
    "first_season",
    "last_season",
    "tier",
];

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\d{4}-([a-zA-Z-]+)-Stats").expect("season name pattern"),
        Regex::new(r"comps/\d{1,3}/([a-zA-Z-]+)-Stats").expect("comp name pattern"),
    ]
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Every competition associated with a country, grouped by league type.
pub async fn scrape(ctx: &ScrapeContext, country_code: &str) -> Result<DataResponse<Vec<LeagueGroup>>> {
    let tables = ctx.fetch_tables(&format!("country/{}/", country_code)).await?;

    let categories = [
        ("domestic_leagues", captioned(&tables, r"Domestic\sLeagues")?),
        ("domestic_cups", captioned(&tables, r"Domestic\sCups")?),
        ("international_competitions", international(&tables)),
        ("national_team_competitions", national_teams(&tables)?),
    ];

    let empty = categories.iter().filter(|(_, m)| m.is_none()).count();
    let invalid = match ctx.leagues_empty_policy {
        LeaguesEmptyPolicy::AllEmpty => empty == categories.len(),
        LeaguesEmptyPolicy::AnyEmpty => empty > 0,
    };
    if invalid {
        return Err(ScrapeError::InvalidCountry {
            country_code: country_code.to_string(),
        });
    }

    let mut groups = Vec::new();
    for (league_type, mapping) in categories {
        let Some(mapping) = mapping else {
            debug!("{}: no {} table", country_code, league_type);
            continue;
        };
        groups.push(LeagueGroup {
            league_type: league_type.to_string(),
            leagues: clean(mapping)?,
        });
    }
    info!("{}: {} league groups", country_code, groups.len());
    Ok(DataResponse::new(groups))
}

fn clean(mapping: ColumnMapping) -> Result<Vec<Record>> {
    let mapping = convert(mapping, &["league_id"], &[])?;
    let mapping = reorder(mapping, ORDER);
    Ok(reorient(&mapping, "league_id"))
}

fn captioned(tables: &[RawTable], caption: &str) -> Result<Option<ColumnMapping>> {
    let patterns = compile_patterns(&[caption])?;
    Ok(find_by_caption(tables, &patterns)
        .first()
        .map(|table| league_table(table, false)))
}

/// Parsed league table with `league_id` (and, for tables that lack a plain
/// name column, `competition_name`) recovered from hrefs.
fn league_table(table: &RawTable, with_names: bool) -> ColumnMapping {
    let parsed = parse_table(table, ParseOptions::default());
    let mut mapping = with_ids(&parsed, &[("league_id", LEAGUE_ID.as_slice())]);
    if with_names {
        let names = parsed
            .extract_ids(&NAME_PATTERNS)
            .into_iter()
            .map(|name| name.map(|n| WHITESPACE.replace_all(&n.replace('-', " "), " ").trim().to_string()))
            .collect();
        mapping.insert_opt_strings("competition_name", names);
    }
    mapping
}

/// Every "Qualifiers" table, merged and deduplicated by competition name.
fn international(tables: &[RawTable]) -> Option<ColumnMapping> {
    let parts: Vec<ColumnMapping> = tables
        .iter()
        .filter(|t| t.name().is_some_and(|n| n.contains("Qualifiers")))
        .map(|t| league_table(t, true))
        .collect();
    merge_unique(parts.iter().map(|m| (m, None)))
}

/// Men's and women's national-team competition tables, tagged `M` / `F`.
fn national_teams(tables: &[RawTable]) -> Result<Option<ColumnMapping>> {
    let mut parts = Vec::new();
    for (caption, gender) in [(r"\smen's\snational\steam", "M"), (r"\swomen's\snational\steam", "F")] {
        let patterns = compile_patterns(&[caption])?;
        if let Some(table) = find_by_caption(tables, &patterns).first() {
            parts.push((league_table(table, true), gender));
        }
    }
    Ok(merge_unique(parts.iter().map(|(m, g)| (m, Some(*g)))))
}

/// Concatenate `competition_name` / `league_id` / `gender` across tables,
/// keeping the first row seen for each competition name. A fixed `gender`
/// overrides the table's own column.
fn merge_unique<'a>(parts: impl Iterator<Item = (&'a ColumnMapping, Option<&'a str>)>) -> Option<ColumnMapping> {
    let mut names: Vec<Value> = Vec::new();
    let mut ids = Vec::new();
    let mut genders = Vec::new();

    for (mapping, gender) in parts {
        let (Some(part_names), Some(part_ids)) = (mapping.values("competition_name"), mapping.values("league_id")) else {
            continue;
        };
        for (i, name) in part_names.iter().enumerate() {
            if name.is_null() || names.contains(name) {
                continue;
            }
            names.push(name.clone());
            ids.push(part_ids.get(i).cloned().unwrap_or(Value::Null));
            genders.push(match gender {
                Some(g) => json!(g),
                None => mapping
                    .values("gender")
                    .and_then(|g| g.get(i).cloned())
                    .unwrap_or(Value::Null),
            });
        }
    }

    if names.is_empty() {
        return None;
    }
    let mut merged = ColumnMapping::new();
    merged.insert_values("competition_name", names);
    merged.insert_values("league_id", ids);
    merged.insert_values("gender", genders);
    Some(merged)
}
