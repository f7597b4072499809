use crate::error::Result;
use crate::models::{DataResponse, Record};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::{
    clean_column, clean_team_name, convert, delete_keys, nest_top_scorer, rename, reorder, reorient,
};
use crate::scraper::parsers::{ParseOptions, compile_patterns, find_by_caption, parse_table};
use tracing::info;

const ORDER: &[&str] = &[
    "season_id",
    "competition_name",
    "host_country",
    "#_squads",
    "champion",
    "runner-up",
    "top_scorer",
];

/// Season history of one competition (leagues list "Seasons", cups "Tournaments").
pub async fn scrape(ctx: &ScrapeContext, league_id: &str) -> Result<DataResponse<Vec<Record>>> {
    let tables = ctx.fetch_tables(&format!("comps/{}/history/", league_id)).await?;
    let patterns = compile_patterns(&[r"Seasons", r"Tournaments"])?;

    let Some(table) = find_by_caption(&tables, &patterns).first().copied() else {
        info!("League {}: no season history table", league_id);
        return Ok(DataResponse::new(Vec::new()));
    };

    let mut mapping = parse_table(table, ParseOptions::default()).to_column_mapping();
    for key in ["champion", "runner-up"] {
        clean_column(&mut mapping, key, clean_team_name);
    }
    let mut mapping = nest_top_scorer(delete_keys(mapping, &["final"]), "top_scorer")?;
    for key in ["season", "year"] {
        mapping = rename(mapping, key, "season_id");
    }
    let mapping = reorder(convert(mapping, &["#_squads"], &[])?, ORDER);

    let records = reorient(&mapping, "season_id");
    info!("League {}: {} seasons", league_id, records.len());
    Ok(DataResponse::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{RecordingFetcher, context, page, table_html};
    use serde_json::json;

    #[tokio::test]
    async fn test_history_is_cleaned_and_nested() {
        let html = page(&table_html(
            "Competition History Seasons Table",
            &["Season", "Competition Name", "# Squads", "Champion", "Runner-Up", "Top Scorer", "Final"],
            &[
                "<tr><th>2022-2023</th><td>Premier League</td><td>20</td><td>engManchester City</td><td>Arsenal</td><td>Erling Haaland - 36</td><td></td></tr>".to_string(),
                "<tr><th>2021-2022</th><td>Premier League</td><td>20</td><td>Manchester City</td><td>Liverpool</td><td>Mohamed Salah, Son Heung-min - 23</td><td></td></tr>".to_string(),
            ],
        ));
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/comps/9/history/", html);
        let resp = scrape(&context(fetcher, Default::default()), "9").await.unwrap();

        assert_eq!(resp.data.len(), 2);
        let first = &resp.data[0];
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec!["season_id", "competition_name", "#_squads", "champion", "runner-up", "top_scorer"]
        );
        assert_eq!(first["champion"], json!("Manchester City"));
        assert_eq!(first["#_squads"], json!(20));
        assert_eq!(first["top_scorer"], json!({"player": "Erling Haaland", "goals_scored": 36}));
        assert_eq!(
            resp.data[1]["top_scorer"],
            json!({"player": ["Mohamed Salah", "Son Heung-min"], "goals_scored": 23})
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/comps/9/history/", page(""));
        let resp = scrape(&context(fetcher, Default::default()), "9").await.unwrap();
        assert!(resp.data.is_empty());
    }
}
