use super::{COUNTRY_CODE, PLAYER_ID, with_ids};
use crate::error::Result;
use crate::models::{DataResponse, PlayerSeasonStats};
use crate::scraper::ScrapeContext;
use crate::scraper::parsers::{ParseOptions, parse_stat_table};
use crate::stats::{StatCategoryMap, clean_categories, locate_categories, reassemble, select_mode};
use tracing::info;

const CATEGORIES: &[(&str, &str)] = &[
    ("stats", r"^Standard\sStats"),
    ("keepers", r"^Goalkeeping"),
    ("keepersadv", r"^Advanced\sGoalkeeping"),
    ("shooting", r"^Shooting"),
    ("passing", r"^Passing"),
    ("passing_types", r"^Pass\sTypes"),
    ("gca", r"^Goal\sand\sShot\sCreation"),
    ("defense", r"^Defensive\sActions"),
    ("possession", r"^Possession"),
    ("playingtime", r"^Playing\sTime"),
    ("misc", r"^Miscellaneous"),
];

const KEEPER_CATEGORIES: &[&str] = &["keepers", "keepersadv"];

/// Season stats for every player of a squad, in one competition or across
/// all of them. Goalkeeping categories are reported separately.
pub async fn scrape(
    ctx: &ScrapeContext,
    team_id: &str,
    league_id: Option<&str>,
    season_id: Option<&str>,
) -> Result<DataResponse<PlayerSeasonStats>> {
    let mut path = format!("squads/{}/", team_id);
    if let Some(season) = season_id {
        path.push_str(&format!("{}/", season));
    }
    match league_id {
        Some(league) => path.push_str(&format!("c{}/", league)),
        None => path.push_str("all_comps/"),
    }

    let tables = ctx.fetch_tables(&path).await?;
    let raw: StatCategoryMap = locate_categories(&tables, CATEGORIES)?
        .into_iter()
        .map(|(category, table)| {
            let opts = ParseOptions { skip_row: true, exclude_totals: true, ..Default::default() };
            let parsed = parse_stat_table(table, opts);
            let mapping = with_ids(
                &parsed,
                &[("player_id", PLAYER_ID.as_slice()), ("player_country_code", COUNTRY_CODE.as_slice())],
            );
            (category, mapping)
        })
        .collect();

    let entity = ctx.column_map.entity("player_season_stats")?;
    let mode = select_mode(raw.len(), 5);
    let cleaned = clean_categories(raw, entity, mode)?;
    let (keepers, players): (StatCategoryMap, StatCategoryMap) = cleaned
        .into_iter()
        .partition(|(category, _)| KEEPER_CATEGORIES.contains(&category.as_str()));

    let response = PlayerSeasonStats {
        players: reassemble(&players, "stats", "player_id", &entity.meta_data),
        keepers: reassemble(&keepers, "keepers", "player_id", &entity.meta_data),
    };
    info!(
        "Team {}: {} players, {} keepers",
        team_id,
        response.players.len(),
        response.keepers.len()
    );
    Ok(DataResponse::new(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::testing::{RecordingFetcher, context, page};
    use serde_json::json;

    fn player_row(id: &str, name: &str, pos: &str, age: &str, last: &str) -> String {
        format!(
            "<tr><th><a href=\"/en/players/{id}/{name}\">{name}</a></th>\
             <td><a href=\"/en/country/ENG/England-Football\"><span>eng</span> ENG</a></td>\
             <td>{pos}</td><td>{age}</td><td>{last}</td><td><a href=\"/en/players/{id}/matchlogs/\">Matches</a></td></tr>"
        )
    }

    fn table(caption: &str, last_header: &str, rows: &[String]) -> String {
        format!(
            "<table><caption>{caption} 2023-2024 Premier League Table</caption>\
             <tr><th></th><th>Playing Time</th></tr>\
             <tr><th>Player</th><th>Nation</th><th>Pos</th><th>Age</th><th>{last_header}</th><th>Matches</th></tr>\
             {}\
             <tr><th>Squad Total</th><td></td><td></td><td>27.1</td><td>38</td><td></td></tr>\
             <tr><th>Opponent Total</th><td></td><td></td><td>27.4</td><td>38</td><td></td></tr>\
             </table>",
            rows.concat()
        )
    }

    #[tokio::test]
    async fn test_players_and_keepers_split() {
        let outfield = [
            player_row("e342ad68", "Bukayo Saka", "FW,MF", "22-120", "35"),
            player_row("98ea5115", "David Raya", "GK", "28-051", "32"),
        ];
        let keeper = [player_row("98ea5115", "David Raya", "GK", "28-051", "32")];
        let html = page(
            &[
                table("Standard Stats", "MP", &outfield),
                table("Goalkeeping", "MP", &keeper),
                table("Shooting", "Sh", &outfield),
            ]
            .concat(),
        );
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/squads/18bb7c10/all_comps/", html);
        let resp = scrape(&context(fetcher, Default::default()), "18bb7c10", None, None).await.unwrap();

        let players = &resp.data.players;
        assert_eq!(players.len(), 2);
        assert_eq!(
            serde_json::to_value(&players[0].meta_data).unwrap(),
            json!({
                "player": "Bukayo Saka",
                "player_id": "e342ad68",
                "player_country_code": "ENG",
                "position": ["FW", "MF"],
                "age": 22
            })
        );
        assert_eq!(players[0].stats["stats"], json!({"mp": 35}));
        assert_eq!(players[1].stats["shooting"], json!({"sh": 32}));
        assert!(!players[0].stats.contains_key("keepers"));

        let keepers = &resp.data.keepers;
        assert_eq!(keepers.len(), 1);
        assert_eq!(keepers[0].meta_data["player_id"], json!("98ea5115"));
        assert_eq!(keepers[0].stats["keepers"], json!({"mp": 32}));
    }

    #[tokio::test]
    async fn test_competition_path() {
        let fetcher = RecordingFetcher::new().with_page("https://fbref.com/en/squads/18bb7c10/2022-2023/c9/", page(""));
        let resp = scrape(&context(fetcher, Default::default()), "18bb7c10", Some("9"), Some("2022-2023"))
            .await
            .unwrap();
        assert!(resp.data.players.is_empty());
        assert!(resp.data.keepers.is_empty());
    }
}
