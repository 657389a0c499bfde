use serde::{Deserialize, Serialize};

use super::{region::Region, GrowthPattern, PatternKey, RiskLevel};
use crate::asset::AssetType;

/// Weight of the predicted annual rate in the hotspot score.
pub const RATE_WEIGHT: f64 = 0.4;
/// Weight of the average growth score.
pub const GROWTH_SCORE_WEIGHT: f64 = 0.3;
/// Weight of the scaled group size.
pub const SIZE_WEIGHT: f64 = 0.3;
/// Group size that counts as one full unit of size.
pub const SIZE_SCALE: f64 = 20.0;

/// A ranked pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Region of the pattern.
    pub region: Region,
    /// Asset type of the pattern.
    pub asset_type: AssetType,
    /// Ranking score.
    pub hotspot_score: f64,
    /// Predicted annual rate.
    pub predicted_growth: f64,
    /// Assets in the group.
    pub current_assets: usize,
    /// Risk level of the group.
    pub risk_level: RiskLevel,
}

impl Hotspot {
    /// Scores one pattern.
    #[must_use]
    pub fn from_pattern(pattern: &GrowthPattern) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let size = pattern.total_assets as f64 / SIZE_SCALE;
        let hotspot_score = RATE_WEIGHT.mul_add(
            pattern.predicted_growth_rate,
            GROWTH_SCORE_WEIGHT.mul_add(pattern.average_growth_score, SIZE_WEIGHT * size),
        );
        Self {
            region: pattern.region,
            asset_type: pattern.asset_type.clone(),
            hotspot_score,
            predicted_growth: pattern.predicted_growth_rate,
            current_assets: pattern.total_assets,
            risk_level: pattern.risk_assessment.level,
        }
    }

    /// Key of the ranked pattern.
    #[must_use]
    pub fn key(&self) -> PatternKey {
        PatternKey::new(self.asset_type.clone(), self.region)
    }
}

/// Ranks patterns by descending score; equal scores keep key order. At most
/// `limit` entries are returned.
pub fn rank<'a>(patterns: impl IntoIterator<Item = &'a GrowthPattern>, limit: usize) -> Vec<Hotspot> {
    let mut ranked: Vec<Hotspot> = patterns.into_iter().map(Hotspot::from_pattern).collect();
    ranked.sort_by(|a, b| {
        b.hotspot_score
            .total_cmp(&a.hotspot_score)
            .then_with(|| a.key().cmp(&b.key()))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::{GrowthTrend, PriorityCounts, RiskAssessment};

    fn pattern(asset_type: AssetType, region: Region, total: usize, rate: f64) -> GrowthPattern {
        GrowthPattern {
            asset_type,
            region,
            total_assets: total,
            priority_distribution: PriorityCounts { high: 0, medium: 0, low: total },
            average_growth_score: 0.5,
            growth_trend: GrowthTrend::SlowGrowth,
            predicted_growth_rate: rate,
            risk_assessment: RiskAssessment::default(),
            fallback_locations: 0,
        }
    }

    #[test]
    fn score_blends_rate_growth_and_size() {
        let spot = Hotspot::from_pattern(&pattern(AssetType::Bridge, Region::EastBengal, 10, 0.1));
        assert!((spot.hotspot_score - (0.04 + 0.15 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn ranking_is_descending_with_key_tiebreak() {
        let patterns = [
            pattern(AssetType::Bridge, Region::SouthDeccan, 2, 0.05),
            pattern(AssetType::Airport, Region::SouthDeccan, 2, 0.05),
            pattern(AssetType::Airport, Region::NorthDelhiNcr, 12, 0.1),
        ];
        let ranked = rank(&patterns, 10);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].region, Region::NorthDelhiNcr);
        assert_eq!(ranked[1].asset_type, AssetType::Bridge);
        assert_eq!(ranked[2].asset_type, AssetType::Airport);
        assert_eq!(rank(&patterns, 1).len(), 1);
    }
}
