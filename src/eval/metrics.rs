use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::models::{Metric, PlayerLine};

/// Per-provider translation from canonical metric to the field key the
/// provider uses in its statistics mapping.
///
/// This is configuration, not logic: swapping a provider means supplying a
/// different table, never touching the evaluator. Built-in defaults exist for
/// the two bundled providers and can be overridden from a JSON file
/// (`{"rebounds": "reb", ...}`) at startup.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    keys: HashMap<Metric, String>,
}

impl MetricTable {
    /// MLB Stats API batting keys match the canonical names one-to-one.
    pub fn mlb_statsapi() -> Self {
        let keys = [
            Metric::Hits,
            Metric::HomeRuns,
            Metric::TotalBases,
            Metric::Rbi,
            Metric::BaseOnBalls,
            Metric::Runs,
            Metric::StolenBases,
        ]
        .into_iter()
        .map(|m| (m, m.as_str().to_string()))
        .collect();
        MetricTable { keys }
    }

    /// balldontlie stat rows use abbreviated keys.
    pub fn balldontlie() -> Self {
        let keys = [
            (Metric::Points, "pts"),
            (Metric::Assists, "ast"),
            (Metric::Rebounds, "reb"),
            (Metric::Steals, "stl"),
            (Metric::Blocks, "blk"),
            (Metric::ThreePointsMade, "fg3m"),
        ]
        .into_iter()
        .map(|(m, k)| (m, k.to_string()))
        .collect();
        MetricTable { keys }
    }

    /// Load a table from a JSON object of canonical metric name -> field key.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metric map {}", path.display()))?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metric map {}", path.display()))?;

        let mut keys = HashMap::new();
        for (name, key) in raw {
            let metric: Metric = name
                .parse()
                .with_context(|| format!("Metric map {}: bad entry", path.display()))?;
            keys.insert(metric, key);
        }
        info!("Loaded {} metric mappings from {}", keys.len(), path.display());
        Ok(MetricTable { keys })
    }

    pub fn key_for(&self, metric: Metric) -> Option<&str> {
        self.keys.get(&metric).map(String::as_str)
    }
}

/// Numeric value of a direct metric on a matched player line.
///
/// Absent key (or metric missing from the table) is 0.0, never "not found":
/// a player who played but recorded nothing still produces a real zero.
fn direct_value(line: &PlayerLine, metric: Metric, table: &MetricTable) -> f64 {
    table
        .key_for(metric)
        .and_then(|key| line.stats.get(key))
        .copied()
        .unwrap_or(0.0)
}

/// Numeric value of any metric on a matched player line. Derived metrics sum
/// their constituents, with each missing constituent treated as 0.
pub fn extract_metric(line: &PlayerLine, metric: Metric, table: &MetricTable) -> f64 {
    match metric.constituents() {
        Some(parts) => parts.iter().map(|m| direct_value(line, *m, table)).sum(),
        None => direct_value(line, metric, table),
    }
}
