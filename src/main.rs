use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod config;
mod db;
mod eval;
mod export;
mod providers;
mod server;

use config::Config;
use db::models::Sport;
use db::Database;
use eval::MetricTable;
use providers::{BallDontLie, BoxScoreProvider, MlbStatsApi};
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Metric-key tables: built-in defaults, overridable per provider so a
    // provider swap never touches evaluation logic.
    let mlb_table = config
        .mlb_metric_map
        .as_deref()
        .map(MetricTable::load_from_file)
        .transpose()?;
    let nba_table = config
        .nba_metric_map
        .as_deref()
        .map(MetricTable::load_from_file)
        .transpose()?;

    // Build box-score providers, one per sport
    let mlb = MlbStatsApi::new(
        Some(&config.mlb_api_url),
        config.mlb_match_policy,
        mlb_table,
    )?;
    let nba = BallDontLie::new(
        Some(&config.nba_api_url),
        config.nba_api_key.as_deref(),
        config.nba_match_policy,
        nba_table,
    )?;

    let mut providers: HashMap<Sport, Arc<dyn BoxScoreProvider>> = HashMap::new();
    providers.insert(Sport::Baseball, Arc::new(mlb));
    providers.insert(Sport::Basketball, Arc::new(nba));
    info!(
        "Configured {} box-score provider(s); results are re-fetched on every check",
        providers.len()
    );

    // Serve the dashboard + API (blocks until shutdown)
    let app = server::router(AppState { db, providers });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
