use std::fmt;

use serde::{Deserialize, Serialize};

use super::tables::{
    HIGH_PRIORITY_SCORE, HIGH_THREAT_SCORE, MEDIUM_PRIORITY_SCORE, MEDIUM_THREAT_SCORE,
};
use crate::{
    asset::Priority,
    geo::{GeoPoint, LocationSource},
};

/// Three-valued threat level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    /// Low.
    #[default]
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl ThreatLevel {
    /// Upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority band for a total classification score.
#[must_use]
pub fn priority_for_score(score: f64) -> Priority {
    if score >= HIGH_PRIORITY_SCORE {
        Priority::High
    } else if score >= MEDIUM_PRIORITY_SCORE {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Threat band for a threat score.
#[must_use]
pub fn threat_level_for(threat_score: f64) -> ThreatLevel {
    if threat_score >= HIGH_THREAT_SCORE {
        ThreatLevel::High
    } else if threat_score >= MEDIUM_THREAT_SCORE {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Contribution of each signal to the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Type base score plus tag bonuses.
    pub type_score: f64,
    /// Proximity to major cities.
    pub geographic: f64,
    /// Proximity to border and military zones.
    pub border: f64,
    /// Name keyword criticality.
    pub infrastructure: f64,
    /// Footprint and capacity.
    pub size: f64,
}

impl ScoreBreakdown {
    /// Sum of all sub-scores.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.type_score + self.geographic + self.border + self.infrastructure + self.size
    }
}

/// Outcome of classifying one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Asset name.
    pub name: String,
    /// Priority band.
    pub priority: Priority,
    /// Threat band.
    pub threat_level: ThreatLevel,
    /// Total classification score.
    pub score: f64,
    /// Threat score the threat band was taken from.
    pub threat_score: f64,
    /// Contributing factor tags, in signal order.
    pub factors: Vec<String>,
    /// Per-signal sub-scores.
    pub breakdown: ScoreBreakdown,
    /// Coordinates used for scoring.
    pub coordinates: GeoPoint,
    /// Whether the coordinates came from the asset or the fallback.
    pub location_source: LocationSource,
}

impl ClassificationResult {
    /// True when the factor list contains `factor`.
    #[must_use]
    pub fn has_factor(&self, factor: &str) -> bool {
        self.factors.iter().any(|candidate| candidate == factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_boundaries() {
        assert_eq!(priority_for_score(49.0), Priority::Low);
        assert_eq!(priority_for_score(50.0), Priority::Medium);
        assert_eq!(priority_for_score(79.0), Priority::Medium);
        assert_eq!(priority_for_score(80.0), Priority::High);
    }

    #[test]
    fn threat_boundaries() {
        assert_eq!(threat_level_for(39.9), ThreatLevel::Low);
        assert_eq!(threat_level_for(40.0), ThreatLevel::Medium);
        assert_eq!(threat_level_for(70.0), ThreatLevel::High);
    }
}
