use super::{MATCH_ID, TEAM_ID, with_ids};
use crate::error::Result;
use crate::models::{ColumnMapping, DataResponse, EntityRecord};
use crate::scraper::ScrapeContext;
use crate::scraper::parsers::{ParseOptions, RawTable, parse_stat_table};
use crate::stats::{StatCategoryMap, build_records};
use tracing::info;

const ADVANCED: &[&str] = &[
    "schedule",
    "keeper",
    "shooting",
    "passing",
    "passing_types",
    "gca",
    "defense",
    "possession",
    "misc",
];
const NON_ADVANCED: &[&str] = &["schedule", "keeper", "shooting", "misc"];

/// One record per match a team played in one competition-season. Every
/// category lives on its own match-log page.
pub async fn scrape(
    ctx: &ScrapeContext,
    team_id: &str,
    league_id: &str,
    season_id: &str,
) -> Result<DataResponse<Vec<EntityRecord>>> {
    let Some(league) = ctx.league_info(league_id) else {
        return Ok(DataResponse::new(Vec::new()));
    };
    let categories = if league.is_advanced() { ADVANCED } else { NON_ADVANCED };

    let paths: Vec<String> = categories
        .iter()
        .map(|cat| format!("squads/{}/{}/matchlogs/c{}/{}/", team_id, season_id, league_id, cat))
        .collect();
    let pages = ctx.fetch_sequential(&paths).await?;

    let raw: StatCategoryMap = categories
        .iter()
        .zip(&pages)
        .map(|(category, tables)| {
            let mapping = tables
                .first()
                .map(|table| match_log(table, category))
                .unwrap_or_default();
            (category.to_string(), mapping)
        })
        .collect();

    let entity = ctx.column_map.entity("team_match_stats")?;
    let records = build_records(entity, raw, 5, ("schedule", "match_id"))?;
    info!("Team {} in league {}: {} match records", team_id, league_id, records.len());
    Ok(DataResponse::new(records))
}

/// Stat match logs have a grouping header row and a closing totals row;
/// the schedule has neither.
fn match_log(table: &RawTable, category: &str) -> ColumnMapping {
    let opts = if category == "schedule" {
        ParseOptions::default()
    } else {
        ParseOptions { skip_row: true, drop_rows: 1, ..Default::default() }
    };
    let parsed = parse_stat_table(table, opts);
    with_ids(&parsed, &[("match_id", MATCH_ID.as_slice()), ("opponent_id", TEAM_ID.as_slice())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CompType, HasAdvStats};
    use crate::scraper::testing::{RecordingFetcher, context, page, registry};
    use serde_json::json;

    const BASE: &str = "https://fbref.com/en/squads/18bb7c10/2023-2024/matchlogs/c9";

    fn row(date: &str, id: &str, gf: &str, tail: &str) -> String {
        format!(
            "<tr><th>{date}</th><td>Premier League</td><td>Home</td><td>W</td><td>{gf}</td><td>0</td>\
             <td><a href=\"/en/squads/8602292d/Aston-Villa-Stats\">Aston Villa</a></td>{tail}\
             <td><a href=\"/en/matches/{id}/x\">Match Report</a></td></tr>"
        )
    }

    fn schedule() -> String {
        page(&format!(
            "<table><caption>Scores &amp; Fixtures Table</caption>\
             <tr><th>Date</th><th>Comp</th><th>Venue</th><th>Result</th><th>GF</th><th>GA</th><th>Opponent</th><th>Attendance</th><th>Match Report</th></tr>\
             {}{}</table>",
            row("2023-08-12", "aaaaaaaa", "2", "<td>60,123</td>"),
            row("2023-08-21", "bbbbbbbb", "1 (4)", "<td></td>"),
        ))
    }

    fn stat_log(extra_header: &str, values: [&str; 2]) -> String {
        page(&format!(
            "<table><caption>Match Log Table</caption>\
             <tr><th></th><th>Performance</th></tr>\
             <tr><th>Date</th><th>Comp</th><th>Venue</th><th>Result</th><th>GF</th><th>GA</th><th>Opponent</th><th>{extra_header}</th><th>Match Report</th></tr>\
             {}{}\
             <tr><th>2 Matches</th><td></td><td></td><td></td><td>3</td><td>0</td><td></td><td>99</td><td></td></tr>\
             </table>",
            row("2023-08-12", "aaaaaaaa", "2", &format!("<td>{}</td>", values[0])),
            row("2023-08-21", "bbbbbbbb", "1", &format!("<td>{}</td>", values[1])),
        ))
    }

    #[tokio::test]
    async fn test_non_advanced_match_logs() {
        let fetcher = RecordingFetcher::new()
            .with_page(&format!("{BASE}/schedule/"), schedule())
            .with_page(&format!("{BASE}/keeper/"), stat_log("Saves", ["3", "5"]))
            .with_page(&format!("{BASE}/shooting/"), stat_log("Sh", ["14", "9"]))
            .with_page(&format!("{BASE}/misc/"), stat_log("CrdY", ["1", "2"]));
        let ctx = context(fetcher.clone(), registry(&[("9", HasAdvStats::No, CompType::League)]));

        let resp = scrape(&ctx, "18bb7c10", "9", "2023-2024").await.unwrap();
        assert_eq!(fetcher.urls().len(), 4);
        assert_eq!(resp.data.len(), 2);

        let first = &resp.data[0];
        assert_eq!(
            first.meta_data.keys().collect::<Vec<_>>(),
            vec!["match_id", "date", "league_name", "home_away", "result", "gf", "ga", "opponent", "opponent_id"]
        );
        assert_eq!(first.meta_data["match_id"], json!("aaaaaaaa"));
        assert_eq!(first.meta_data["opponent_id"], json!("8602292d"));
        assert_eq!(first.stats["schedule"], json!({"attendance": 60123}));
        assert_eq!(first.stats["keeper"], json!({"saves": 3}));
        assert_eq!(first.stats["shooting"], json!({"sh": 14}));
        assert_eq!(resp.data[1].meta_data["gf"], json!(1));
        assert_eq!(resp.data[1].stats["misc"], json!({"crdy": 2}));
    }

    #[tokio::test]
    async fn test_missing_page_fails_the_request() {
        let fetcher = RecordingFetcher::new().with_page(&format!("{BASE}/schedule/"), schedule());
        let ctx = context(fetcher, registry(&[("9", HasAdvStats::No, CompType::League)]));
        tokio_test::assert_err!(scrape(&ctx, "18bb7c10", "9", "2023-2024").await);
    }
}
