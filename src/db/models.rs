use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which sport a projection (and its provider) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Baseball,
    Basketball,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Baseball => "baseball",
            Sport::Basketball => "basketball",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sport '{0}' (expected 'baseball' or 'basketball')")]
pub struct ParseSportError(pub String);

impl FromStr for Sport {
    type Err = ParseSportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baseball" | "mlb" => Ok(Sport::Baseball),
            "basketball" | "nba" => Ok(Sport::Basketball),
            other => Err(ParseSportError(other.to_string())),
        }
    }
}

/// The statistical category a projection targets.
///
/// Wire and storage form is the camelCase name ("homeRuns",
/// "pointsReboundsAssists", ...). The mapping from canonical metric to a
/// provider's field key lives in [`crate::eval::MetricTable`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    // Baseball (batting)
    Hits,
    HomeRuns,
    TotalBases,
    Rbi,
    BaseOnBalls,
    Runs,
    StolenBases,
    // Basketball
    Points,
    Assists,
    Rebounds,
    Steals,
    Blocks,
    ThreePointsMade,
    PointsReboundsAssists,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Hits => "hits",
            Metric::HomeRuns => "homeRuns",
            Metric::TotalBases => "totalBases",
            Metric::Rbi => "rbi",
            Metric::BaseOnBalls => "baseOnBalls",
            Metric::Runs => "runs",
            Metric::StolenBases => "stolenBases",
            Metric::Points => "points",
            Metric::Assists => "assists",
            Metric::Rebounds => "rebounds",
            Metric::Steals => "steals",
            Metric::Blocks => "blocks",
            Metric::ThreePointsMade => "threePointsMade",
            Metric::PointsReboundsAssists => "pointsReboundsAssists",
        }
    }

    pub fn sport(&self) -> Sport {
        match self {
            Metric::Hits
            | Metric::HomeRuns
            | Metric::TotalBases
            | Metric::Rbi
            | Metric::BaseOnBalls
            | Metric::Runs
            | Metric::StolenBases => Sport::Baseball,
            _ => Sport::Basketball,
        }
    }

    /// Constituent metrics of a derived metric, or `None` for direct metrics.
    pub fn constituents(&self) -> Option<&'static [Metric]> {
        match self {
            Metric::PointsReboundsAssists => {
                Some(&[Metric::Points, Metric::Rebounds, Metric::Assists])
            }
            _ => None,
        }
    }

    pub const ALL: &'static [Metric] = &[
        Metric::Hits,
        Metric::HomeRuns,
        Metric::TotalBases,
        Metric::Rbi,
        Metric::BaseOnBalls,
        Metric::Runs,
        Metric::StolenBases,
        Metric::Points,
        Metric::Assists,
        Metric::Rebounds,
        Metric::Steals,
        Metric::Blocks,
        Metric::ThreePointsMade,
        Metric::PointsReboundsAssists,
    ];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown metric '{0}'")]
pub struct ParseMetricError(pub String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metric::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| ParseMetricError(wanted.to_string()))
    }
}

/// A user-declared bet: player X reaches `target` on `metric` in a date's
/// games. Identity is store-assigned; duplicates by name+metric are legal
/// and evaluated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub id: Option<i64>,
    /// Opaque session identifier scoping the projection to one user.
    pub session_id: String,
    pub sport: Sport,
    pub player: String,
    pub metric: Metric,
    pub target: f64,
    pub created_at: DateTime<Utc>,
}

/// One evaluated projection. Ephemeral: recomputed on every results request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub player: String,
    pub metric: Metric,
    pub target: f64,
    /// `Some(value)` when the player was found (value may be 0.0),
    /// `None` when no box score contained the player.
    pub actual: Option<f64>,
    /// `actual >= target` when found; always false when not found.
    pub met: bool,
}

/// One player's statistical line as normalized from a provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLine {
    /// Full display name as the provider reports it.
    pub name: String,
    /// Provider-vocabulary field key -> numeric value.
    pub stats: HashMap<String, f64>,
}

/// Normalized box score: all player lines for one game, home team first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxScore {
    pub game_id: String,
    pub lines: Vec<PlayerLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_round_trip() {
        for m in Metric::ALL {
            assert_eq!(m.as_str().parse::<Metric>().unwrap(), *m);
        }
    }

    #[test]
    fn test_metric_parse_case_insensitive() {
        assert_eq!("HomeRuns".parse::<Metric>().unwrap(), Metric::HomeRuns);
        assert_eq!(" points ".parse::<Metric>().unwrap(), Metric::Points);
        assert!("slugging".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_serde_camel_case() {
        let json = serde_json::to_string(&Metric::PointsReboundsAssists).unwrap();
        assert_eq!(json, "\"pointsReboundsAssists\"");
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Metric::PointsReboundsAssists);
    }

    #[test]
    fn test_derived_constituents() {
        let parts = Metric::PointsReboundsAssists.constituents().unwrap();
        assert_eq!(parts, &[Metric::Points, Metric::Rebounds, Metric::Assists]);
        assert!(Metric::Hits.constituents().is_none());
    }

    #[test]
    fn test_sport_parse() {
        assert_eq!("MLB".parse::<Sport>().unwrap(), Sport::Baseball);
        assert_eq!("basketball".parse::<Sport>().unwrap(), Sport::Basketball);
        assert!("cricket".parse::<Sport>().is_err());
    }
}
