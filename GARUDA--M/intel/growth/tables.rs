use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::region::Region;
use crate::asset::{AssetType, Priority};

/// Average growth score above which a group trends RAPID.
pub const RAPID_TREND: f64 = 0.7;
/// Average growth score above which a group trends MODERATE.
pub const MODERATE_TREND: f64 = 0.5;
/// Average growth score above which a group trends SLOW.
pub const SLOW_TREND: f64 = 0.3;

/// Group size above which concentration becomes a risk.
pub const CONCENTRATION_COUNT: usize = 10;
/// HIGH-priority share above which value concentration becomes a risk.
pub const HIGH_VALUE_SHARE: f64 = 0.5;
/// Average growth score above which development speed becomes a risk.
pub const RAPID_DEVELOPMENT_SCORE: f64 = 0.8;
/// Risk score above which risk is HIGH.
pub const HIGH_RISK_SCORE: f64 = 0.6;
/// Risk score above which risk is MEDIUM.
pub const MEDIUM_RISK_SCORE: f64 = 0.3;

/// Weights and lookups behind the per-asset growth score and the group rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthTables {
    /// Starting score for every asset.
    pub base_score: f64,
    /// Bonus for HIGH priority.
    pub high_priority_bonus: f64,
    /// Bonus for MEDIUM priority.
    pub medium_priority_bonus: f64,
    /// Growth potential per type.
    pub type_potential: IndexMap<AssetType, f64>,
    /// Potential for unlisted types.
    pub default_type_potential: f64,
    /// Growth potential per region.
    pub region_potential: IndexMap<Region, f64>,
    /// Potential for unlisted regions.
    pub default_region_potential: f64,
    /// Annual rate multiplier per region.
    pub region_multiplier: IndexMap<Region, f64>,
    /// Multiplier for unlisted regions.
    pub default_region_multiplier: f64,
    /// Average score to annual rate conversion.
    pub rate_factor: f64,
    /// Ceiling on the predicted annual rate.
    pub max_annual_rate: f64,
    /// Regions exposed to border risk.
    pub border_regions: Vec<Region>,
    /// Risk added when a group is large.
    pub concentration_risk: f64,
    /// Risk added when most of a group is HIGH priority.
    pub high_value_risk: f64,
    /// Risk added for border regions.
    pub border_risk: f64,
    /// Risk added for fast-developing groups.
    pub rapid_development_risk: f64,
}

impl Default for GrowthTables {
    fn default() -> Self {
        Self {
            base_score: 0.5,
            high_priority_bonus: 0.3,
            medium_priority_bonus: 0.2,
            type_potential: IndexMap::from([
                (AssetType::Airport, 0.4),
                (AssetType::PowerInfrastructure, 0.3),
                (AssetType::RailwayInfrastructure, 0.35),
                (AssetType::Bridge, 0.25),
                (AssetType::MilitaryFacility, 0.1),
                (AssetType::BorderInfrastructure, 0.2),
            ]),
            default_type_potential: 0.2,
            region_potential: IndexMap::from([
                (Region::NorthDelhiNcr, 0.4),
                (Region::SouthDeccan, 0.35),
                (Region::WestMaharashtra, 0.3),
                (Region::NorthKashmir, 0.1),
                (Region::EastBengal, 0.25),
            ]),
            default_region_potential: 0.2,
            region_multiplier: IndexMap::from([
                (Region::NorthDelhiNcr, 1.3),
                (Region::SouthDeccan, 1.2),
                (Region::WestMaharashtra, 1.15),
                (Region::CentralMpUp, 1.1),
                (Region::NorthKashmir, 0.7),
                (Region::EastBengal, 1.0),
            ]),
            default_region_multiplier: 1.0,
            rate_factor: 0.1,
            max_annual_rate: 0.2,
            border_regions: vec![Region::NorthKashmir, Region::NorthPunjab, Region::EastBengal],
            concentration_risk: 0.2,
            high_value_risk: 0.3,
            border_risk: 0.4,
            rapid_development_risk: 0.2,
        }
    }
}

impl GrowthTables {
    /// Per-asset growth score, capped at 1.
    #[must_use]
    pub fn growth_score(&self, priority: Priority, asset_type: &AssetType, region: Region) -> f64 {
        let priority_bonus = match priority {
            Priority::High => self.high_priority_bonus,
            Priority::Medium => self.medium_priority_bonus,
            Priority::Low => 0.0,
        };
        let type_bonus = self
            .type_potential
            .get(asset_type)
            .copied()
            .unwrap_or(self.default_type_potential);
        let region_bonus = self
            .region_potential
            .get(&region)
            .copied()
            .unwrap_or(self.default_region_potential);
        (self.base_score + priority_bonus + type_bonus + region_bonus).min(1.0)
    }

    /// Annual rate predicted for a group's average score, capped.
    #[must_use]
    pub fn annual_rate(&self, average_score: f64, region: Region) -> f64 {
        let multiplier = self
            .region_multiplier
            .get(&region)
            .copied()
            .unwrap_or(self.default_region_multiplier);
        (average_score * self.rate_factor * multiplier).min(self.max_annual_rate)
    }

    /// True for regions carrying border risk.
    #[must_use]
    pub fn is_border_region(&self, region: Region) -> bool {
        self.border_regions.contains(&region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_score_sums_and_caps() {
        let tables = GrowthTables::default();
        let bridge = tables.growth_score(Priority::Low, &AssetType::Bridge, Region::NorthKashmir);
        assert!((bridge - 0.85).abs() < 1e-12);
        let unlisted =
            tables.growth_score(Priority::Low, &AssetType::LocalRoad, Region::WestRajasthan);
        assert!((unlisted - 0.9).abs() < 1e-12);
        let capped = tables.growth_score(Priority::High, &AssetType::Airport, Region::NorthDelhiNcr);
        assert!((capped - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn annual_rate_uses_multiplier_and_cap() {
        let mut tables = GrowthTables::default();
        assert!((tables.annual_rate(1.0, Region::NorthDelhiNcr) - 0.13).abs() < 1e-12);
        assert!((tables.annual_rate(0.5, Region::SouthTamilNadu) - 0.05).abs() < 1e-12);
        tables.rate_factor = 1.0;
        assert!((tables.annual_rate(1.0, Region::SouthDeccan) - 0.2).abs() < f64::EPSILON);
    }
}
