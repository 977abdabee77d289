use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;

use super::BoxScoreProvider;
use crate::db::models::{BoxScore, PlayerLine, Sport};
use crate::eval::{EvalConfig, MatchPolicy, MetricTable};

/// Box-score provider backed by the balldontlie stats API.
/// Docs: <https://www.balldontlie.io>
pub struct BallDontLie {
    http: Client,
    /// Base URL, overridable for tests.
    base_url: String,
    api_key: Option<String>,
    config: EvalConfig,
}

impl BallDontLie {
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<&str>,
        policy: MatchPolicy,
        table: Option<MetricTable>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(BallDontLie {
            http,
            base_url: base_url
                .unwrap_or("https://www.balldontlie.io/api/v1")
                .to_string(),
            api_key: api_key.map(str::to_string),
            config: EvalConfig {
                table: table.unwrap_or_else(MetricTable::balldontlie),
                policy,
            },
        })
    }

    async fn fetch_stats_page(&self, date: NaiveDate, page: u32) -> Result<serde_json::Value> {
        let url = format!(
            "{}/stats?start_date={date}&end_date={date}&per_page=100&page={page}",
            self.base_url
        );
        debug!("Fetching NBA stats from {}", url);

        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", key);
        }
        let resp = req.send().await.context("balldontlie request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("balldontlie error: {}", resp.status());
        }
        resp.json()
            .await
            .context("Failed to parse balldontlie response")
    }
}

#[async_trait]
impl BoxScoreProvider for BallDontLie {
    fn sport(&self) -> Sport {
        Sport::Basketball
    }

    fn eval_config(&self) -> &EvalConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "balldontlie"
    }

    async fn fetch_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>> {
        let mut rows = Vec::new();
        let mut page = 1u32;
        loop {
            let raw = self.fetch_stats_page(date, page).await?;
            if let Some(data) = raw["data"].as_array() {
                rows.extend(data.iter().cloned());
            }
            match raw["meta"]["next_page"].as_u64() {
                Some(next) => page = next as u32,
                None => break,
            }
        }
        debug!("balldontlie returned {} stat rows for {}", rows.len(), date);
        Ok(group_stat_rows(&rows))
    }
}

/// Group flat stat rows into one box score per game, games in first-seen
/// order. Rows missing the player name are dropped; a missing game id falls
/// back to a single catch-all group.
fn group_stat_rows(rows: &[serde_json::Value]) -> Vec<BoxScore> {
    let mut box_scores: Vec<BoxScore> = Vec::new();
    for row in rows {
        let line = match parse_stat_row(row) {
            Some(l) => l,
            None => continue,
        };
        let game_id = row["game"]["id"]
            .as_i64()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        match box_scores.iter_mut().find(|b| b.game_id == game_id) {
            Some(b) => b.lines.push(line),
            None => box_scores.push(BoxScore {
                game_id,
                lines: vec![line],
            }),
        }
    }
    box_scores
}

fn parse_stat_row(row: &serde_json::Value) -> Option<PlayerLine> {
    let first = row["player"]["first_name"].as_str()?;
    let last = row["player"]["last_name"].as_str()?;

    // The stat fields live at the top level of the row, alongside the nested
    // player/game/team objects; keep only the numeric ones.
    let stats = row
        .as_object()?
        .iter()
        .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
        .collect();

    Some(PlayerLine {
        name: format!("{first} {last}"),
        stats,
    })
}
