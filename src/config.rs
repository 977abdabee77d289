use std::path::PathBuf;

use clap::Parser;

use crate::eval::MatchPolicy;

/// Player projection checker: record projections, fetch live box scores,
/// check whether each one was met.
#[derive(Parser, Debug, Clone)]
#[command(name = "propcheck", version, about)]
pub struct Config {
    /// HTTP listen address for the dashboard and API
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "propcheck.db")]
    pub database_path: String,

    /// MLB Stats API base URL
    #[arg(
        long,
        env = "MLB_API_URL",
        default_value = "https://statsapi.mlb.com/api/v1"
    )]
    pub mlb_api_url: String,

    /// balldontlie API base URL
    #[arg(
        long,
        env = "NBA_API_URL",
        default_value = "https://www.balldontlie.io/api/v1"
    )]
    pub nba_api_url: String,

    /// balldontlie API key (sent as Authorization header when set)
    #[arg(long, env = "NBA_API_KEY")]
    pub nba_api_key: Option<String>,

    /// Name-match policy for MLB box scores (the Stats API name list is
    /// clean, so exact match is the default)
    #[arg(long, env = "MLB_MATCH_POLICY", value_enum, default_value = "exact")]
    pub mlb_match_policy: MatchPolicy,

    /// Name-match policy for NBA box scores (balldontlie name formatting is
    /// inconsistent, so substring match is the default)
    #[arg(long, env = "NBA_MATCH_POLICY", value_enum, default_value = "substring")]
    pub nba_match_policy: MatchPolicy,

    /// Optional JSON file overriding the MLB metric -> field-key map
    #[arg(long, env = "MLB_METRIC_MAP")]
    pub mlb_metric_map: Option<PathBuf>,

    /// Optional JSON file overriding the NBA metric -> field-key map
    #[arg(long, env = "NBA_METRIC_MAP")]
    pub nba_metric_map: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("listen_addr '{}' is not a valid socket address", self.listen_addr);
        }
        for path in [&self.mlb_metric_map, &self.nba_metric_map].into_iter().flatten() {
            if !path.is_file() {
                anyhow::bail!("metric map file not found: {}", path.display());
            }
        }
        Ok(())
    }
}
