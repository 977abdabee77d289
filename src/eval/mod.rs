//! Projection evaluation: pure, synchronous, no I/O.
//!
//! Given a user's projections and the box scores fetched for a date, resolve
//! each projection's player, extract the requested metric and emit one result
//! row per projection, in input order. Data-quality problems never raise:
//! an unmatched player yields a not-found row, an absent stat yields zero.

pub mod metrics;
pub mod resolve;

pub use metrics::{extract_metric, MetricTable};
pub use resolve::{resolve_player, MatchPolicy};

use crate::db::models::{BoxScore, Projection, ResultRow};

/// Evaluation settings a provider is paired with: its field-key vocabulary
/// and the name-match policy appropriate for its data quality.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub table: MetricTable,
    pub policy: MatchPolicy,
}

/// Evaluate every projection against the supplied box scores.
///
/// The output has exactly the same length and order as `projections`; no row
/// is ever dropped. Each call re-scans from scratch — callers re-fetch box
/// scores per request so live games reflect updated stats.
pub fn evaluate(
    projections: &[Projection],
    box_scores: &[BoxScore],
    config: &EvalConfig,
) -> Vec<ResultRow> {
    projections
        .iter()
        .map(|p| evaluate_one(p, box_scores, config))
        .collect()
}

fn evaluate_one(
    projection: &Projection,
    box_scores: &[BoxScore],
    config: &EvalConfig,
) -> ResultRow {
    let actual = resolve_player(&projection.player, box_scores, config.policy)
        .map(|line| extract_metric(line, projection.metric, &config.table));

    // Absence never satisfies a target, not even target <= 0.
    let met = match actual {
        Some(value) => value >= projection.target,
        None => false,
    };

    ResultRow {
        player: projection.player.clone(),
        metric: projection.metric,
        target: projection.target,
        actual,
        met,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Metric, PlayerLine};
    use approx::assert_relative_eq;
    use chrono::Utc;
    use std::collections::HashMap;

    fn projection(player: &str, metric: Metric, target: f64) -> Projection {
        Projection {
            id: None,
            session_id: "test".to_string(),
            sport: metric.sport(),
            player: player.to_string(),
            metric,
            target,
            created_at: Utc::now(),
        }
    }

    fn line(name: &str, stats: &[(&str, f64)]) -> PlayerLine {
        PlayerLine {
            name: name.to_string(),
            stats: stats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn mlb_config() -> EvalConfig {
        EvalConfig {
            table: MetricTable::mlb_statsapi(),
            policy: MatchPolicy::Exact,
        }
    }

    fn nba_config() -> EvalConfig {
        EvalConfig {
            table: MetricTable::balldontlie(),
            policy: MatchPolicy::Substring,
        }
    }

    fn single_game(lines: Vec<PlayerLine>) -> Vec<BoxScore> {
        vec![BoxScore {
            game_id: "g1".to_string(),
            lines,
        }]
    }

    #[test]
    fn test_order_and_length_preserved() {
        let projections = vec![
            projection("Aaron Judge", Metric::Hits, 1.0),
            projection("Nobody Real", Metric::Runs, 1.0),
            projection("Juan Soto", Metric::HomeRuns, 1.0),
        ];
        let scores = single_game(vec![
            line("Juan Soto", &[("homeRuns", 1.0)]),
            line("Aaron Judge", &[("hits", 2.0)]),
        ]);

        let rows = evaluate(&projections, &scores, &mlb_config());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].player, "Aaron Judge");
        assert_eq!(rows[1].player, "Nobody Real");
        assert_eq!(rows[2].player, "Juan Soto");
    }

    #[test]
    fn test_zero_stat_is_found_not_missing() {
        let scores = single_game(vec![line("Aaron Judge", &[("hits", 0.0)])]);
        let rows = evaluate(
            &[projection("Aaron Judge", Metric::Hits, 1.0)],
            &scores,
            &mlb_config(),
        );
        assert_eq!(rows[0].actual, Some(0.0));
        assert!(!rows[0].met);
    }

    #[test]
    fn test_not_found_never_met_even_for_non_positive_target() {
        let scores = single_game(vec![line("Aaron Judge", &[("hits", 2.0)])]);
        for target in [0.0, -1.0] {
            let rows = evaluate(
                &[projection("Barry Bonds", Metric::Hits, target)],
                &scores,
                &mlb_config(),
            );
            assert_eq!(rows[0].actual, None);
            assert!(!rows[0].met, "absence must not satisfy target {target}");
        }
        // But a found zero does satisfy target 0.
        let rows = evaluate(
            &[projection("Aaron Judge", Metric::StolenBases, 0.0)],
            &scores,
            &mlb_config(),
        );
        assert_eq!(rows[0].actual, Some(0.0));
        assert!(rows[0].met);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let scores = single_game(vec![line("Aaron Judge", &[("hits", 2.0)])]);
        let at = evaluate(
            &[projection("Aaron Judge", Metric::Hits, 2.0)],
            &scores,
            &mlb_config(),
        );
        assert!(at[0].met);
        let above = evaluate(
            &[projection("Aaron Judge", Metric::Hits, 3.0)],
            &scores,
            &mlb_config(),
        );
        assert!(!above[0].met);
    }

    #[test]
    fn test_derived_metric_pra() {
        let scores = single_game(vec![line(
            "Nikola Jokic",
            &[("pts", 10.0), ("reb", 5.0), ("ast", 3.0)],
        )]);
        let rows = evaluate(
            &[projection("Nikola Jokic", Metric::PointsReboundsAssists, 18.0)],
            &scores,
            &nba_config(),
        );
        assert_relative_eq!(rows[0].actual.unwrap(), 18.0);
        assert!(rows[0].met);
    }

    #[test]
    fn test_case_and_whitespace_insensitive_resolution() {
        let scores = single_game(vec![line("Aaron Judge", &[("hits", 2.0)])]);
        let rows = evaluate(
            &[projection(" aaron JUDGE ", Metric::Hits, 1.0)],
            &scores,
            &mlb_config(),
        );
        assert_eq!(rows[0].actual, Some(2.0));
        assert!(rows[0].met);
    }

    #[test]
    fn test_multi_game_scan_finds_player_in_later_game() {
        let scores = vec![
            BoxScore {
                game_id: "g1".to_string(),
                lines: vec![line("Shohei Ohtani", &[("hits", 1.0)])],
            },
            BoxScore {
                game_id: "g2".to_string(),
                lines: vec![line("Mookie Betts", &[("hits", 3.0)])],
            },
        ];
        let rows = evaluate(
            &[projection("Mookie Betts", Metric::Hits, 2.0)],
            &scores,
            &mlb_config(),
        );
        assert_eq!(rows[0].actual, Some(3.0));
        assert!(rows[0].met);
    }

    #[test]
    fn test_duplicate_projections_evaluated_independently() {
        let scores = single_game(vec![line("Aaron Judge", &[("hits", 2.0)])]);
        let projections = vec![
            projection("Aaron Judge", Metric::Hits, 1.0),
            projection("Aaron Judge", Metric::Hits, 3.0),
        ];
        let rows = evaluate(&projections, &scores, &mlb_config());
        assert!(rows[0].met);
        assert!(!rows[1].met);
    }

    #[test]
    fn test_empty_box_scores_yield_not_found_rows() {
        let rows = evaluate(
            &[projection("Aaron Judge", Metric::Hits, 1.0)],
            &[],
            &mlb_config(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].actual, None);
        assert!(!rows[0].met);
    }
}
