use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};

use super::BoxScoreProvider;
use crate::db::models::{BoxScore, PlayerLine, Sport};
use crate::eval::{EvalConfig, MatchPolicy, MetricTable};

/// Box-score provider backed by the public MLB Stats API.
/// Docs: <https://statsapi.mlb.com/docs/>
pub struct MlbStatsApi {
    http: Client,
    /// Base URL, overridable for tests.
    base_url: String,
    config: EvalConfig,
}

impl MlbStatsApi {
    pub fn new(base_url: Option<&str>, policy: MatchPolicy, table: Option<MetricTable>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(MlbStatsApi {
            http,
            base_url: base_url
                .unwrap_or("https://statsapi.mlb.com/api/v1")
                .to_string(),
            config: EvalConfig {
                table: table.unwrap_or_else(MetricTable::mlb_statsapi),
                policy,
            },
        })
    }

    /// Game ids for the date whose state makes their box score meaningful
    /// (live games are included so a check against an in-progress slate
    /// reflects partial stats; previews are not).
    async fn fetch_game_ids(&self, date: NaiveDate) -> Result<Vec<String>> {
        let url = format!("{}/schedule?sportId=1&date={}", self.base_url, date);
        debug!("Fetching MLB schedule from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("MLB schedule request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("MLB schedule error: {}", resp.status());
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse MLB schedule response")?;
        Ok(parse_schedule(&raw))
    }

    async fn fetch_one_box_score(&self, game_id: &str) -> Option<BoxScore> {
        let url = format!("{}/game/{}/boxscore", self.base_url, game_id);
        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("MLB boxscore request failed for game {}: {}", game_id, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("MLB boxscore error for game {}: {}", game_id, resp.status());
            return None;
        }
        let raw: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse MLB boxscore for game {}: {}", game_id, e);
                return None;
            }
        };
        Some(parse_box_score(game_id, &raw))
    }
}

#[async_trait]
impl BoxScoreProvider for MlbStatsApi {
    fn sport(&self) -> Sport {
        Sport::Baseball
    }

    fn eval_config(&self) -> &EvalConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "MLB-StatsAPI"
    }

    async fn fetch_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>> {
        let game_ids = self.fetch_game_ids(date).await?;
        debug!("MLB schedule for {}: {} game(s)", date, game_ids.len());

        // One request per game, concurrently; schedule order is preserved
        // because join_all yields results in input order.
        let fetches = game_ids.iter().map(|id| self.fetch_one_box_score(id));
        let box_scores = join_all(fetches).await.into_iter().flatten().collect();
        Ok(box_scores)
    }
}

fn parse_schedule(raw: &serde_json::Value) -> Vec<String> {
    let included_states = ["Final", "Live", "In Progress"];
    let dates = match raw["dates"].as_array() {
        Some(a) => a,
        None => return vec![],
    };
    dates
        .iter()
        .flat_map(|d| d["games"].as_array().map(Vec::as_slice).unwrap_or(&[]))
        .filter(|g| {
            g["status"]["abstractGameState"]
                .as_str()
                .map(|s| included_states.contains(&s))
                .unwrap_or(false)
        })
        .filter_map(|g| g["gamePk"].as_i64().map(|pk| pk.to_string()))
        .collect()
}

/// Normalize one box-score response: all batting lines, home team first.
/// Missing or malformed nested fields drop the affected entry, never fail.
fn parse_box_score(game_id: &str, raw: &serde_json::Value) -> BoxScore {
    let mut lines = Vec::new();
    for side in ["home", "away"] {
        let players = match raw["teams"][side]["players"].as_object() {
            Some(p) => p,
            None => continue,
        };
        for pdata in players.values() {
            let name = match pdata["person"]["fullName"].as_str() {
                Some(n) => n.to_string(),
                None => continue,
            };
            let stats = pdata["stats"]["batting"]
                .as_object()
                .map(|batting| {
                    batting
                        .iter()
                        .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                        .collect()
                })
                .unwrap_or_default();
            lines.push(PlayerLine { name, stats });
        }
    }
    BoxScore {
        game_id: game_id.to_string(),
        lines,
    }
}
