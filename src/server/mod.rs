//! HTTP REST façade.
//!
//! Every route is a GET that deserialises its query string, runs one
//! endpoint scraper against the shared [`ScrapeContext`] and returns the
//! response as JSON. Key order in the body is whatever the scraper built.

use crate::config::ServerConfig;
use crate::endpoints;
use crate::error::{Result, ScrapeError};
use crate::scraper::ScrapeContext;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

type AppState = Arc<ScrapeContext>;

/// Build the axum Router with every endpoint.
pub fn router(ctx: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/countries/", get(countries))
        .route("/leagues/", get(leagues))
        .route("/league-seasons/", get(league_seasons))
        .route("/league-season-details/", get(league_season_details))
        .route("/league-standings/", get(league_standings))
        .route("/teams/", get(teams))
        .route("/players/", get(players))
        .route("/matches/", get(matches))
        .route("/team-season-stats/", get(team_season_stats))
        .route("/team-match-stats/", get(team_match_stats))
        .route("/player-season-stats/", get(player_season_stats))
        .route("/player-match-stats/", get(player_match_stats))
        .route("/all-players-match-stats/", get(all_players_match_stats))
        .with_state(ctx)
}

pub async fn start(config: &ServerConfig, ctx: AppState) -> anyhow::Result<()> {
    let app = router(ctx);
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Errors ────────────────────────────────────────────────────────────────────

impl ScrapeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScrapeError::NotFound(_) | ScrapeError::InvalidCountry { .. } => StatusCode::NOT_FOUND,
            ScrapeError::UpstreamFetch { .. } => StatusCode::BAD_GATEWAY,
            ScrapeError::ShapeMismatch(_) | ScrapeError::Coercion { .. } | ScrapeError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ScrapeError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn reply<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CountryParams {
    country: Option<String>,
}

#[derive(Deserialize)]
struct CountryCodeParams {
    country_code: String,
}

#[derive(Deserialize)]
struct LeagueParams {
    league_id: String,
}

#[derive(Deserialize)]
struct LeagueSeasonParams {
    league_id: String,
    season_id: Option<String>,
}

#[derive(Deserialize)]
struct TeamParams {
    team_id: String,
    season_id: Option<String>,
}

#[derive(Deserialize)]
struct PlayerParams {
    player_id: String,
}

#[derive(Deserialize)]
struct MatchesParams {
    team_id: Option<String>,
    league_id: Option<String>,
    season_id: Option<String>,
}

#[derive(Deserialize)]
struct TeamMatchStatsParams {
    team_id: String,
    league_id: String,
    season_id: String,
}

#[derive(Deserialize)]
struct PlayerSeasonStatsParams {
    team_id: String,
    league_id: Option<String>,
    season_id: Option<String>,
}

#[derive(Deserialize)]
struct PlayerMatchStatsParams {
    player_id: String,
    league_id: String,
    season_id: String,
}

#[derive(Deserialize)]
struct MatchParams {
    match_id: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn countries(State(ctx): State<AppState>, Query(p): Query<CountryParams>) -> Response {
    reply(endpoints::countries::scrape(&ctx, p.country.as_deref()).await)
}

async fn leagues(State(ctx): State<AppState>, Query(p): Query<CountryCodeParams>) -> Response {
    reply(endpoints::leagues::scrape(&ctx, &p.country_code).await)
}

async fn league_seasons(State(ctx): State<AppState>, Query(p): Query<LeagueParams>) -> Response {
    reply(endpoints::league_seasons::scrape(&ctx, &p.league_id).await)
}

async fn league_season_details(State(ctx): State<AppState>, Query(p): Query<LeagueSeasonParams>) -> Response {
    reply(endpoints::league_season_details::scrape(&ctx, &p.league_id, p.season_id.as_deref()).await)
}

async fn league_standings(State(ctx): State<AppState>, Query(p): Query<LeagueSeasonParams>) -> Response {
    reply(endpoints::league_standings::scrape(&ctx, &p.league_id, p.season_id.as_deref()).await)
}

async fn teams(State(ctx): State<AppState>, Query(p): Query<TeamParams>) -> Response {
    reply(endpoints::teams::scrape(&ctx, &p.team_id, p.season_id.as_deref()).await)
}

async fn players(State(ctx): State<AppState>, Query(p): Query<PlayerParams>) -> Response {
    reply(endpoints::players::scrape(&ctx, &p.player_id).await)
}

async fn matches(State(ctx): State<AppState>, Query(p): Query<MatchesParams>) -> Response {
    let result = endpoints::matches::scrape(
        &ctx,
        p.team_id.as_deref(),
        p.league_id.as_deref(),
        p.season_id.as_deref(),
    )
    .await;
    reply(result)
}

async fn team_season_stats(State(ctx): State<AppState>, Query(p): Query<LeagueSeasonParams>) -> Response {
    reply(endpoints::team_season_stats::scrape(&ctx, &p.league_id, p.season_id.as_deref()).await)
}

async fn team_match_stats(State(ctx): State<AppState>, Query(p): Query<TeamMatchStatsParams>) -> Response {
    reply(endpoints::team_match_stats::scrape(&ctx, &p.team_id, &p.league_id, &p.season_id).await)
}

async fn player_season_stats(State(ctx): State<AppState>, Query(p): Query<PlayerSeasonStatsParams>) -> Response {
    let result = endpoints::player_season_stats::scrape(
        &ctx,
        &p.team_id,
        p.league_id.as_deref(),
        p.season_id.as_deref(),
    )
    .await;
    reply(result)
}

async fn player_match_stats(State(ctx): State<AppState>, Query(p): Query<PlayerMatchStatsParams>) -> Response {
    reply(endpoints::player_match_stats::scrape(&ctx, &p.player_id, &p.league_id, &p.season_id).await)
}

async fn all_players_match_stats(State(ctx): State<AppState>, Query(p): Query<MatchParams>) -> Response {
    reply(endpoints::all_players_match_stats::scrape(&ctx, &p.match_id).await)
}
