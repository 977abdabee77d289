pub mod mlb;
pub mod nba;

pub use mlb::MlbStatsApi;
pub use nba::BallDontLie;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::models::{BoxScore, Sport};
use crate::eval::EvalConfig;

/// Trait that every box-score provider must implement.
///
/// A provider is the only I/O boundary in the pipeline: it fetches and
/// normalizes one sport's statistics for a date. The evaluator consumes the
/// normalized output and is paired with the provider's [`EvalConfig`]
/// (metric-key vocabulary + name-match policy).
#[async_trait]
pub trait BoxScoreProvider: Send + Sync {
    /// Fetch and normalize all box scores for the given date. Individual
    /// unavailable games contribute nothing rather than failing the fetch.
    async fn fetch_box_scores(&self, date: NaiveDate) -> Result<Vec<BoxScore>>;

    fn sport(&self) -> Sport;

    /// Evaluation settings matched to this provider's data.
    fn eval_config(&self) -> &EvalConfig;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
