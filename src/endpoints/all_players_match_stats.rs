use super::{COUNTRY_CODE, PLAYER_ID, with_ids};
use crate::error::Result;
use crate::models::{ColumnMapping, DataResponse, MatchTeamStats};
use crate::scraper::ScrapeContext;
use crate::scraper::cleaner::reorient;
use crate::scraper::parsers::{ParseOptions, RawTable, parse_stat_table};
use crate::stats::{StatCategoryMap, clean_categories, reassemble, select_mode};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static TEAM_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*)\s(?:Player|Goalkeeper)\sStats\sTable").expect("team caption pattern"));

/// Outfield tables appear in this order for each team.
const OUTFIELD: &[&str] = &["summary", "passing", "passing_types", "defense", "possession", "misc"];

struct TeamTables<'a> {
    team_name: String,
    home_away: &'static str,
    outfield: Vec<&'a RawTable>,
    keeper: Option<&'a RawTable>,
}

/// Per-team player and goalkeeper stats for one match. The first team named
/// on the page is the home side.
pub async fn scrape(ctx: &ScrapeContext, match_id: &str) -> Result<DataResponse<Vec<MatchTeamStats>>> {
    let tables = ctx.fetch_tables(&format!("matches/{}/", match_id)).await?;
    let teams = split_by_team(&tables);
    let entity = ctx.column_map.entity("all_players_match_stats")?;

    let mut data = Vec::with_capacity(teams.len());
    for team in teams {
        let mut raw: StatCategoryMap = team
            .outfield
            .iter()
            .zip(OUTFIELD)
            .map(|(table, category)| (category.to_string(), player_table(table, 1)))
            .collect();
        if let Some(keeper) = team.keeper {
            raw.push(("keeper".to_string(), player_table(keeper, 0)));
        }

        let mode = select_mode(raw.len(), 2);
        let cleaned = clean_categories(raw, entity, mode)?;
        let (keepers, players): (StatCategoryMap, StatCategoryMap) =
            cleaned.into_iter().partition(|(category, _)| category == "keeper");

        data.push(MatchTeamStats {
            team_name: team.team_name,
            home_away: team.home_away.to_string(),
            players: reassemble(&players, "summary", "player_id", &entity.meta_data),
            keepers: keepers
                .first()
                .map(|(_, mapping)| reorient(mapping, "player_id"))
                .unwrap_or_default(),
        });
    }

    info!("Match {}: {} teams", match_id, data.len());
    Ok(DataResponse::new(data))
}

/// Group player/goalkeeper tables by the team named in their caption. Only
/// the first two teams are kept.
fn split_by_team(tables: &[RawTable]) -> Vec<TeamTables<'_>> {
    let mut teams: Vec<TeamTables> = Vec::new();
    for table in tables {
        let Some(caption) = table.caption_text(false) else { continue };
        let Some(name) = TEAM_CAPTION.captures(&caption).and_then(|c| c.get(1)) else {
            continue;
        };
        let name = name.as_str().trim();

        let idx = match teams.iter().position(|t| t.team_name == name) {
            Some(idx) => idx,
            None if teams.len() < 2 => {
                let home_away = if teams.is_empty() { "home" } else { "away" };
                teams.push(TeamTables {
                    team_name: name.to_string(),
                    home_away,
                    outfield: Vec::new(),
                    keeper: None,
                });
                teams.len() - 1
            }
            None => {
                debug!("Ignoring table for third team {:?}", name);
                continue;
            }
        };

        let team = &mut teams[idx];
        if caption.contains("Goalkeeper Stats") {
            if team.keeper.is_none() {
                team.keeper = Some(table);
            }
        } else if team.outfield.len() < OUTFIELD.len() {
            team.outfield.push(table);
        }
    }
    teams
}

/// Outfield tables end with a team totals row; goalkeeper tables do not.
fn player_table(table: &RawTable, drop_rows: usize) -> ColumnMapping {
    let parsed = parse_stat_table(table, ParseOptions { skip_row: true, drop_rows, ..Default::default() });
    with_ids(
        &parsed,
        &[("player_id", PLAYER_ID.as_slice()), ("player_country_code", COUNTRY_CODE.as_slice())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{RecordingFetcher, context, page};
    use serde_json::json;

    fn outfield(team: &str, players: &[(&str, &str, &str)]) -> String {
        let rows: String = players
            .iter()
            .map(|(id, name, gls)| {
                format!(
                    "<tr><th><a href=\"/en/players/{id}/{name}\">{name}</a></th><td>7</td>\
                     <td><a href=\"/en/country/ENG/England-Football\">eng ENG</a></td><td>FW,MF</td><td>22-120</td><td>90</td><td>{gls}</td></tr>"
                )
            })
            .collect();
        format!(
            "<table><caption>{team} Player Stats Table</caption>\
             <tr><th></th><th>Performance</th></tr>\
             <tr><th>Player</th><th>#</th><th>Nation</th><th>Pos</th><th>Age</th><th>Min</th><th>Gls</th></tr>\
             {rows}<tr><th>11 Players</th><td></td><td></td><td></td><td></td><td>990</td><td>2</td></tr></table>"
        )
    }

    fn keeper(team: &str, id: &str, name: &str) -> String {
        format!(
            "<table><caption>{team} Goalkeeper Stats Table</caption>\
             <tr><th></th><th>Shot Stopping</th></tr>\
             <tr><th>Player</th><th>Nation</th><th>Age</th><th>Min</th><th>SoTA</th><th>Saves</th></tr>\
             <tr><th><a href=\"/en/players/{id}/{name}\">{name}</a></th><td><a href=\"/en/country/ESP/Spain-Football\">es ESP</a></td>\
             <td>28-051</td><td>90</td><td>4</td><td>3</td></tr></table>"
        )
    }

    #[tokio::test]
    async fn test_home_and_away_split() {
        let html = page(
            &[
                outfield("Arsenal", &[("e342ad68", "Bukayo Saka", "1"), ("bc7dc64d", "Bukayo Two", "0")]),
                outfield("Chelsea", &[("aaaaaaaa", "Cole Palmer", "2")]),
                keeper("Arsenal", "98ea5115", "David Raya"),
                keeper("Chelsea", "bbbbbbbb", "Robert Sanchez"),
            ]
            .concat(),
        );
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/matches/3a6836b4/", html);
        let resp = scrape(&context(fetcher, Default::default()), "3a6836b4").await.unwrap();

        assert_eq!(resp.data.len(), 2);
        let home = &resp.data[0];
        assert_eq!(home.team_name, "Arsenal");
        assert_eq!(home.home_away, "home");
        assert_eq!(home.players.len(), 2);
        assert_eq!(
            serde_json::to_value(&home.players[0].meta_data).unwrap(),
            json!({
                "player": "Bukayo Saka",
                "player_id": "e342ad68",
                "player_country_code": "ENG",
                "shirt_number": 7,
                "position": ["FW", "MF"],
                "age": 22,
                "min": 90
            })
        );
        assert_eq!(home.players[0].stats["summary"], json!({"gls": 1}));
        assert!(!home.players[0].stats.contains_key("keeper"));

        assert_eq!(home.keepers.len(), 1);
        assert_eq!(home.keepers[0]["player_id"], json!("98ea5115"));
        assert_eq!(home.keepers[0]["player_country_code"], json!("ESP"));
        assert_eq!(home.keepers[0]["saves"], json!(3));
        assert_eq!(home.keepers[0]["age"], json!(28));

        let away = &resp.data[1];
        assert_eq!(away.team_name, "Chelsea");
        assert_eq!(away.home_away, "away");
        assert_eq!(away.players[0].meta_data["player_id"], json!("aaaaaaaa"));
        assert_eq!(away.keepers[0]["player"], json!("Robert Sanchez"));
    }

    #[tokio::test]
    async fn test_match_without_player_tables() {
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/matches/3a6836b4/", page(""));
        let resp = scrape(&context(fetcher, Default::default()), "3a6836b4").await.unwrap();
        assert!(resp.data.is_empty());
    }
}
