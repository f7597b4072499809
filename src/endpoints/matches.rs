use super::{LEAGUE_ID, MATCH_ID, TEAM_ID, with_ids};
use crate::error::{Result, ScrapeError};
use crate::models::{ColumnMapping, DataResponse, Record};
use crate::scraper::cleaner::{clean_column, clean_gf_ga, clean_team_name, convert, delete_keys, rename, reorder, reorient};
use crate::scraper::parsers::{ParseOptions, ParsedTable, compile_patterns, find_by_caption, parse_table};
use crate::scraper::{ScrapeContext, with_season};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::info;

static SCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*[–-]\s*(\d+)").expect("score pattern"));

const DROP: &[&str] = &["day", "xg", "score", "match_report", "notes", "xga", "poss"];
const ORDER: &[&str] = &[
    "match_id",
    "date",
    "time",
    "round",
    "wk",
    "league_id",
    "home",
    "home_team_id",
    "away",
    "away_team_id",
    "home_team_score",
    "away_team_score",
    "home_away",
    "opponent",
    "opponent_id",
    "result",
    "gf",
    "ga",
    "formation",
    "venue",
    "attendance",
    "captain",
    "referee",
];

/// Which fixture list a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule<'a> {
    Team { team_id: &'a str, league_id: Option<&'a str> },
    League { league_id: &'a str },
}

impl Schedule<'_> {
    fn path(&self, season_id: Option<&str>) -> String {
        match self {
            Schedule::Team { team_id, league_id } => {
                let base = with_season(&format!("squads/{}/", team_id), season_id);
                match league_id {
                    Some(lg) => format!("{}matchlogs/c{}/schedule/", base, lg),
                    None => format!("{}matchlogs/schedule/", base),
                }
            }
            Schedule::League { league_id } => {
                format!("{}schedule/", with_season(&format!("comps/{}/", league_id), season_id))
            }
        }
    }
}

/// Fixture list of a team (optionally restricted to one competition) or of
/// a whole league-season.
pub async fn scrape(
    ctx: &ScrapeContext,
    team_id: Option<&str>,
    league_id: Option<&str>,
    season_id: Option<&str>,
) -> Result<DataResponse<Vec<Record>>> {
    let schedule = match (team_id, league_id) {
        (Some(team_id), league_id) => Schedule::Team { team_id, league_id },
        (None, Some(league_id)) => Schedule::League { league_id },
        (None, None) => {
            return Err(ScrapeError::InvalidParameters(
                "matches need a team_id, a league_id or both".into(),
            ));
        }
    };

    let tables = ctx.fetch_tables(&schedule.path(season_id)).await?;
    let patterns = compile_patterns(&[r"^Scores\s&\sFixtures"])?;
    let Some(table) = find_by_caption(&tables, &patterns).first().copied() else {
        info!("{:?}: no fixtures table", schedule);
        return Ok(DataResponse::new(Vec::new()));
    };

    let parsed = parse_table(table, ParseOptions::default());
    let mut mapping = match schedule {
        Schedule::League { .. } => league_matches(&parsed),
        Schedule::Team { .. } => team_matches(&parsed),
    };
    for key in ["home", "away", "opponent"] {
        clean_column(&mut mapping, key, clean_team_name);
    }
    let mapping = delete_keys(mapping, DROP);
    let mapping = convert(mapping, &["home_team_score", "away_team_score", "gf", "ga", "league_id"], &[])?;
    let records = reorient(&reorder(mapping, ORDER), "date");

    info!("{:?}: {} matches", schedule, records.len());
    Ok(DataResponse::new(records))
}

fn league_matches(parsed: &ParsedTable) -> ColumnMapping {
    let mut mapping = with_ids(parsed, &[("match_id", MATCH_ID.as_slice())]);
    let (home, away) = parsed.extract_id_pairs(&TEAM_ID);
    mapping.insert_opt_strings("home_team_id", home);
    mapping.insert_opt_strings("away_team_id", away);

    if let Some(scores) = mapping.values("score") {
        let (home, away): (Vec<Value>, Vec<Value>) = scores
            .iter()
            .map(|s| match s.as_str().and_then(|s| SCORE.captures(s)) {
                Some(caps) => (Value::from(&caps[1]), Value::from(&caps[2])),
                None => (Value::Null, Value::Null),
            })
            .unzip();
        mapping.insert_values("home_team_score", home);
        mapping.insert_values("away_team_score", away);
    }
    mapping
}

fn team_matches(parsed: &ParsedTable) -> ColumnMapping {
    let mut mapping = with_ids(
        parsed,
        &[
            ("match_id", MATCH_ID.as_slice()),
            ("league_id", LEAGUE_ID.as_slice()),
            ("opponent_id", TEAM_ID.as_slice()),
        ],
    );
    clean_column(&mut mapping, "gf", clean_gf_ga);
    clean_column(&mut mapping, "ga", clean_gf_ga);
    rename(mapping, "venue", "home_away")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{RecordingFetcher, context, page, table_html};
    use serde_json::json;

    fn league_page() -> String {
        page(&table_html(
            "Scores & Fixtures 2023-2024 Premier League Table",
            &["Wk", "Day", "Date", "Time", "Home", "xG", "Score", "xG", "Away", "Attendance", "Venue", "Referee", "Match Report", "Notes"],
            &[
                "<tr><th>1</th><td>Fri</td><td>2023-08-11</td><td>20:00</td>\
                 <td><a href=\"/en/squads/943e8050/Burnley-Stats\">Burnley</a></td><td>0.3</td><td>0–3</td><td>1.9</td>\
                 <td><a href=\"/en/squads/b8fd03ef/Manchester-City-Stats\">Manchester City</a></td>\
                 <td>21,572</td><td>Turf Moor</td><td>Craig Pawson</td>\
                 <td><a href=\"/en/matches/3a6836b4/Burnley-Manchester-City\">Match Report</a></td><td></td></tr>"
                    .to_string(),
                "<tr><th>38</th><td>Sun</td><td>2024-05-19</td><td>16:00</td>\
                 <td><a href=\"/en/squads/18bb7c10/Arsenal-Stats\">Arsenal</a></td><td></td><td></td><td></td>\
                 <td><a href=\"/en/squads/d07537b9/Brighton-Stats\">Brighton</a></td>\
                 <td></td><td>Emirates Stadium</td><td></td><td>Head-to-Head</td><td></td></tr>"
                    .to_string(),
            ],
        ))
    }

    #[tokio::test]
    async fn test_league_schedule() {
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/comps/9/2023-2024/schedule/", league_page());
        let resp = scrape(&context(fetcher, Default::default()), None, Some("9"), Some("2023-2024"))
            .await
            .unwrap();

        assert_eq!(resp.data.len(), 2);
        let first = &resp.data[0];
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec![
                "match_id", "date", "time", "wk", "home", "home_team_id", "away", "away_team_id",
                "home_team_score", "away_team_score", "venue", "attendance", "referee"
            ]
        );
        assert_eq!(first["match_id"], json!("3a6836b4"));
        assert_eq!(first["home_team_id"], json!("943e8050"));
        assert_eq!(first["away_team_id"], json!("b8fd03ef"));
        assert_eq!(first["home_team_score"], json!(0));
        assert_eq!(first["away_team_score"], json!(3));

        let unplayed = &resp.data[1];
        assert_eq!(unplayed["match_id"], Value::Null);
        assert_eq!(unplayed["home_team_score"], Value::Null);
        assert_eq!(unplayed["away_team_id"], json!("d07537b9"));
    }

    #[tokio::test]
    async fn test_team_schedule_url_and_ids() {
        let html = page(&table_html(
            "Scores & Fixtures Table",
            &["Date", "Time", "Comp", "Round", "Day", "Venue", "Result", "GF", "GA", "Opponent", "Match Report"],
            &["<tr><th>2024-02-18</th><td>15:00</td><td><a href=\"/en/comps/514/FA-Cup-Stats\">FA Cup</a></td>\
               <td>Fourth round</td><td>Sun</td><td>Away</td><td>W</td><td>1 (4)</td><td>1 (2)</td>\
               <td><a href=\"/en/squads/b8fd03ef/Manchester-City-Stats\">engManchester City</a></td>\
               <td><a href=\"/en/matches/aaaabbbb/x\">Match Report</a></td></tr>"
                .to_string()],
        ));
        let fetcher = RecordingFetcher::new()
            .with_page("https://fbref.com/en/squads/18bb7c10/matchlogs/c514/schedule/", html);
        let resp = scrape(&context(fetcher.clone(), Default::default()), Some("18bb7c10"), Some("514"), None)
            .await
            .unwrap();

        let m = &resp.data[0];
        assert_eq!(m["league_id"], json!(514));
        assert_eq!(m["opponent"], json!("Manchester City"));
        assert_eq!(m["opponent_id"], json!("b8fd03ef"));
        assert_eq!(m["home_away"], json!("Away"));
        assert_eq!(m["gf"], json!(1));
        assert_eq!(m["ga"], json!(1));
        assert!(!m.contains_key("day"));
        assert_eq!(fetcher.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_requires_team_or_league() {
        let ctx = context(RecordingFetcher::new(), Default::default());
        assert!(matches!(
            scrape(&ctx, None, None, Some("2023-2024")).await,
            Err(ScrapeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_paths() {
        let team = Schedule::Team { team_id: "18bb7c10", league_id: None };
        assert_eq!(team.path(Some("2022-2023")), "squads/18bb7c10/2022-2023/matchlogs/schedule/");
        let league = Schedule::League { league_id: "9" };
        assert_eq!(league.path(None), "comps/9/schedule/");
    }
}
