use super::{TEAM_ID, with_ids};
use crate::error::Result;
use crate::models::{DataResponse, StandingsTable};
use crate::scraper::cleaner::{clean_column, clean_team_name, convert, delete_keys, nest_top_scorer, rename, reorder, reorient};
use crate::scraper::parsers::{ParseOptions, compile_patterns, find_by_caption, parse_table};
use crate::scraper::{ScrapeContext, with_season};
use tracing::{debug, info};

const CAPTIONS: &[&str] = &[
    r"Group\s.+",
    r"Regular\sseason",
    r"Matchup\s.+",
    r"Ranking\sof",
    r"Conference",
    r"Relegation",
    r"Championship\sround",
    r"play-offs",
    r"Championship\sgroup",
    r"Apertura\s",
];

const ORDER: &[&str] = &[
    "rk",
    "team_name",
    "team_id",
    "mp",
    "w",
    "d",
    "l",
    "gf",
    "ga",
    "gd",
    "pts",
    "pts/mp",
    "xg",
    "xga",
    "xgd",
    "xgd/90",
    "attendance",
    "goalkeeper",
    "top_team_scorer",
];

/// Every standings block on a league-season overview page: one per caption
/// (regular season, groups, play-offs, ...).
pub async fn scrape(
    ctx: &ScrapeContext,
    league_id: &str,
    season_id: Option<&str>,
) -> Result<DataResponse<Vec<StandingsTable>>> {
    let tables = ctx
        .fetch_tables(&with_season(&format!("comps/{}/", league_id), season_id))
        .await?;
    let patterns = compile_patterns(CAPTIONS)?;

    let mut blocks: Vec<StandingsTable> = Vec::new();
    for table in find_by_caption(&tables, &patterns) {
        let standings_type = table.caption_text(false).unwrap_or_default();
        if blocks.iter().any(|b| b.standings_type == standings_type) {
            debug!("Skipping repeated standings table {:?}", standings_type);
            continue;
        }

        let parsed = parse_table(table, ParseOptions::default());
        let mapping = with_ids(&parsed, &[("team_id", TEAM_ID.as_slice())]);
        let mapping = convert(mapping, &["rk", "mp", "w", "d", "l", "gf", "ga", "pts"], &["pts/mp", "xg", "xga"])?;
        let mut mapping = rename(delete_keys(mapping, &["notes"]), "squad", "team_name");
        clean_column(&mut mapping, "team_name", clean_team_name);
        let mapping = reorder(nest_top_scorer(mapping, "top_team_scorer")?, ORDER);

        blocks.push(StandingsTable {
            standings_type,
            standings: reorient(&mapping, "team_name"),
        });
    }

    info!("League {}: {} standings tables", league_id, blocks.len());
    Ok(DataResponse::new(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{RecordingFetcher, context, page, table_html};
    use serde_json::json;

    fn team_row(rk: &str, id: &str, name: &str, scorer: &str) -> String {
        format!(
            "<tr><th>{rk}</th><td><a href=\"/en/squads/{id}/{name}-Stats\">{name}</a></td><td>38</td><td>28</td>\
             <td>5</td><td>5</td><td>96</td><td>34</td><td>+62</td><td>89</td><td>2.34</td><td>{scorer}</td><td>Champions</td></tr>"
        )
    }

    fn standings_page() -> String {
        let header = ["Rk", "Squad", "MP", "W", "D", "L", "GF", "GA", "GD", "Pts", "Pts/MP", "Top Team Scorer", "Notes"];
        page(&[
            table_html(
                "Regular season Table",
                &header,
                &[
                    team_row("1", "b8fd03ef", "Barcelona", "Messi-20"),
                    team_row("2", "53a2f082", "Real Madrid", "Messi,Ronaldo-10"),
                ],
            ),
            format!(
                "<!-- {} -->",
                table_html("Regular season Table", &header, &[team_row("9", "aaaaaaaa", "Ghost", "X-1")])
            ),
            table_html("Group A Table", &header, &[team_row("1", "cccccccc", "Atletico", "")]),
        ]
        .concat())
    }

    #[tokio::test]
    async fn test_top_scorer_is_nested() {
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/comps/12/2010-2011/", standings_page());
        let resp = scrape(&context(fetcher, Default::default()), "12", Some("2010-2011")).await.unwrap();

        assert_eq!(resp.data.len(), 2);
        let regular = &resp.data[0];
        assert_eq!(regular.standings_type, "Regular season Table");
        assert_eq!(regular.standings.len(), 2);
        assert_eq!(regular.standings[0]["top_team_scorer"], json!({"player": "Messi", "goals_scored": 20}));
        assert_eq!(
            regular.standings[1]["top_team_scorer"],
            json!({"player": ["Messi", "Ronaldo"], "goals_scored": 10})
        );

        let first = &regular.standings[0];
        assert_eq!(first["team_id"], json!("b8fd03ef"));
        assert_eq!(first["pts/mp"], json!(2.34));
        assert!(!first.contains_key("notes"));
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec!["rk", "team_name", "team_id", "mp", "w", "d", "l", "gf", "ga", "gd", "pts", "pts/mp", "top_team_scorer"]
        );

        assert_eq!(resp.data[1].standings_type, "Group A Table");
        assert_eq!(resp.data[1].standings[0]["top_team_scorer"], json!({"player": null, "goals_scored": null}));
    }
}
