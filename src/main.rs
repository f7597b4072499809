mod config;
mod endpoints;
mod error;
mod models;
mod registry;
mod scraper;
mod server;
mod stats;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::registry::{AdvStatsRegistry, ColumnMapConfig};
use crate::scraper::ScrapeContext;
use crate::scraper::http_client::HttpClient;

#[derive(Parser)]
#[command(name = "fbref-api", about = "fbref.com statistics scraper and REST API", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST API
    Serve,

    /// Run one scraper and print its JSON response
    Scrape {
        endpoint: Endpoint,

        #[command(flatten)]
        params: ScrapeParams,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Endpoint {
    Countries,
    Leagues,
    LeagueSeasons,
    LeagueSeasonDetails,
    LeagueStandings,
    Teams,
    Players,
    Matches,
    TeamSeasonStats,
    TeamMatchStats,
    PlayerSeasonStats,
    PlayerMatchStats,
    AllPlayersMatchStats,
}

#[derive(clap::Args)]
struct ScrapeParams {
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    country_code: Option<String>,
    #[arg(long)]
    league_id: Option<String>,
    #[arg(long)]
    season_id: Option<String>,
    #[arg(long)]
    team_id: Option<String>,
    #[arg(long)]
    player_id: Option<String>,
    #[arg(long)]
    match_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "fbref_api=info,warn",
        1 => "fbref_api=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let ctx = build_context(&config)?;

    match cli.command {
        Command::Serve => server::start(&config.server, Arc::new(ctx)).await?,
        Command::Scrape { endpoint, params } => {
            let _t = utils::Timer::start(format!("scrape {}", endpoint.name()));
            let json = scrape(&ctx, endpoint, &params).await?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_context(config: &AppConfig) -> Result<ScrapeContext> {
    let adv_stats = AdvStatsRegistry::load(&config.data.adv_stats_path)?;
    let column_map = ColumnMapConfig::load(&config.data.column_map_path)?;

    let fetcher = HttpClient::new(&config.scraper)?;
    Ok(ScrapeContext::new(
        config,
        Arc::new(fetcher),
        Arc::new(adv_stats),
        Arc::new(column_map),
    )?)
}

impl Endpoint {
    fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }
}

impl ScrapeParams {
    fn require<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
        value.as_deref().with_context(|| format!("--{} is required for this endpoint", flag))
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn scrape(ctx: &ScrapeContext, endpoint: Endpoint, p: &ScrapeParams) -> Result<String> {
    let req = ScrapeParams::require;
    let season = p.season_id.as_deref();

    let json = match endpoint {
        Endpoint::Countries => pretty(&endpoints::countries::scrape(ctx, p.country.as_deref()).await?)?,
        Endpoint::Leagues => {
            pretty(&endpoints::leagues::scrape(ctx, req(&p.country_code, "country-code")?).await?)?
        }
        Endpoint::LeagueSeasons => {
            pretty(&endpoints::league_seasons::scrape(ctx, req(&p.league_id, "league-id")?).await?)?
        }
        Endpoint::LeagueSeasonDetails => pretty(
            &endpoints::league_season_details::scrape(ctx, req(&p.league_id, "league-id")?, season).await?,
        )?,
        Endpoint::LeagueStandings => {
            pretty(&endpoints::league_standings::scrape(ctx, req(&p.league_id, "league-id")?, season).await?)?
        }
        Endpoint::Teams => pretty(&endpoints::teams::scrape(ctx, req(&p.team_id, "team-id")?, season).await?)?,
        Endpoint::Players => pretty(&endpoints::players::scrape(ctx, req(&p.player_id, "player-id")?).await?)?,
        Endpoint::Matches => {
            pretty(&endpoints::matches::scrape(ctx, p.team_id.as_deref(), p.league_id.as_deref(), season).await?)?
        }
        Endpoint::TeamSeasonStats => {
            pretty(&endpoints::team_season_stats::scrape(ctx, req(&p.league_id, "league-id")?, season).await?)?
        }
        Endpoint::TeamMatchStats => pretty(
            &endpoints::team_match_stats::scrape(
                ctx,
                req(&p.team_id, "team-id")?,
                req(&p.league_id, "league-id")?,
                req(&p.season_id, "season-id")?,
            )
            .await?,
        )?,
        Endpoint::PlayerSeasonStats => pretty(
            &endpoints::player_season_stats::scrape(ctx, req(&p.team_id, "team-id")?, p.league_id.as_deref(), season)
                .await?,
        )?,
        Endpoint::PlayerMatchStats => pretty(
            &endpoints::player_match_stats::scrape(
                ctx,
                req(&p.player_id, "player-id")?,
                req(&p.league_id, "league-id")?,
                req(&p.season_id, "season-id")?,
            )
            .await?,
        )?,
        Endpoint::AllPlayersMatchStats => {
            pretty(&endpoints::all_players_match_stats::scrape(ctx, req(&p.match_id, "match-id")?).await?)?
        }
    };
    Ok(json)
}
