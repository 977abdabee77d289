use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::db::models::{BoxScore, PlayerLine};

/// How a projection's player string is compared against provider names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Full-name equality after trim + lowercase. Preferred when the
    /// provider's name list is clean (MLB Stats API).
    Exact,
    /// Containment in either direction after trim + lowercase. Fallback for
    /// providers with inconsistent name formatting (balldontlie).
    Substring,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn names_match(wanted: &str, candidate: &str, policy: MatchPolicy) -> bool {
    let candidate = normalize(candidate);
    match policy {
        MatchPolicy::Exact => wanted == candidate,
        MatchPolicy::Substring => candidate.contains(wanted) || wanted.contains(candidate.as_str()),
    }
}

/// Find the first player line matching `player` across the box scores.
///
/// Deterministic first-match-wins: box scores are scanned in the order given,
/// lines within a box score in the order the provider normalized them (home
/// team before away). Duplicate names across games are not deduplicated.
/// Absence is a normal outcome, not an error — the player may simply not have
/// played that day.
pub fn resolve_player<'a>(
    player: &str,
    box_scores: &'a [BoxScore],
    policy: MatchPolicy,
) -> Option<&'a PlayerLine> {
    let wanted = normalize(player);
    // A blank name would substring-match every candidate.
    if wanted.is_empty() {
        return None;
    }
    box_scores
        .iter()
        .flat_map(|b| b.lines.iter())
        .find(|line| names_match(&wanted, &line.name, policy))
}
