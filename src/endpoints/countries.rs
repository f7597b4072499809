use super::{COUNTRY_CODE, with_ids};
use crate::error::{Result, ScrapeError};
use crate::models::{ColumnMapping, CountriesResponse, DataResponse, Record};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::{clean_national_teams, convert, delete_keys, reorder, reorient};
use crate::scraper::parsers::{ParseOptions, parse_table};
use serde_json::{Value, json};
use tracing::{debug, info};

const ORDER: &[&str] = &[
    "country",
    "country_code",
    "governing_body",
    "#_clubs",
    "#_players",
    "national_teams",
    "competitions",
];

/// Every country fbref tracks, or the single record named `country`.
pub async fn scrape(ctx: &ScrapeContext, country: Option<&str>) -> Result<CountriesResponse> {
    let tables = ctx.fetch_tables("countries/").await?;
    let records = match tables.first() {
        Some(table) => {
            let parsed = parse_table(table, ParseOptions::default());
            clean(with_ids(&parsed, &[("country_code", COUNTRY_CODE.as_slice())]))?
        }
        None => Vec::new(),
    };
    info!("Scraped {} countries", records.len());

    match country {
        None => Ok(CountriesResponse::All(DataResponse::new(records))),
        Some(name) => records
            .into_iter()
            .find(|r| r.get("country").and_then(Value::as_str) == Some(name))
            .map(CountriesResponse::Single)
            .ok_or_else(|| ScrapeError::NotFound(format!("country `{}`", name))),
    }
}

fn clean(mut mapping: ColumnMapping) -> Result<Vec<Record>> {
    mapping.map_column("national_teams", |v| clean_national_teams(v.as_str().unwrap_or_default()));
    mapping.map_column("competitions", |v| match v.as_str() {
        Some(s) if !s.is_empty() => json!(s.split(',').map(str::trim).collect::<Vec<_>>()),
        _ => Value::Null,
    });
    let mapping = delete_keys(mapping, &["flag"]);
    let mapping = convert(mapping, &["#_clubs", "#_players"], &[])?;
    let mapping = reorder(mapping, ORDER);

    let records: Vec<Record> = reorient(&mapping, "country_code")
        .into_iter()
        .filter(|r| r.get("country_code").is_some_and(|c| !c.is_null()))
        .collect();
    debug!("{} rows kept after country-code filter", records.len());
    Ok(records)
}
