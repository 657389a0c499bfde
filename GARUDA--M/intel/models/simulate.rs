use indexmap::IndexMap;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::{
    asset::{AssetType, Priority},
    features::FeatureVector,
};

/// Parameters of the synthetic label generator and the formula fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationTables {
    /// Annual growth baseline per type.
    pub growth_base_rates: IndexMap<AssetType, f64>,
    /// Baseline for unlisted types.
    pub default_growth_rate: f64,
    /// Growth multiplier for HIGH priority.
    pub high_priority_multiplier: f64,
    /// Growth multiplier for MEDIUM priority.
    pub medium_priority_multiplier: f64,
    /// Threat baseline.
    pub threat_base: f64,
    /// Border proxy (degrees) under which the border bonus applies.
    pub border_cutoff: f64,
    /// Threat bonus near the border.
    pub border_bonus: f64,
    /// Threat bonus for HIGH priority.
    pub high_priority_bonus: f64,
    /// Threat bonus for MEDIUM priority.
    pub medium_priority_bonus: f64,
    /// Economic activity is divided by this and added to the threat.
    pub economic_divisor: f64,
}

impl Default for SimulationTables {
    fn default() -> Self {
        Self {
            growth_base_rates: IndexMap::from([
                (AssetType::Bridge, 0.02),
                (AssetType::Airport, 0.05),
                (AssetType::PowerInfrastructure, 0.03),
                (AssetType::RailwayInfrastructure, 0.04),
                (AssetType::MilitaryFacility, 0.01),
                (AssetType::BorderInfrastructure, 0.025),
            ]),
            default_growth_rate: 0.02,
            high_priority_multiplier: 1.5,
            medium_priority_multiplier: 1.2,
            threat_base: 0.1,
            border_cutoff: 50.0,
            border_bonus: 0.3,
            high_priority_bonus: 0.4,
            medium_priority_bonus: 0.2,
            economic_divisor: 1000.0,
        }
    }
}

impl SimulationTables {
    /// Noise-free growth rate, floored at zero.
    #[must_use]
    pub fn expected_growth_rate(&self, asset_type: &AssetType, priority: Priority) -> f64 {
        let base = self
            .growth_base_rates
            .get(asset_type)
            .copied()
            .unwrap_or(self.default_growth_rate);
        let scaled = match priority {
            Priority::High => base * self.high_priority_multiplier,
            Priority::Medium => base * self.medium_priority_multiplier,
            Priority::Low => base,
        };
        scaled.max(0.0)
    }

    /// Noise-free threat score, clamped to `[0, 1]`.
    #[must_use]
    pub fn expected_threat_score(&self, priority: Priority, features: &FeatureVector) -> f64 {
        let mut score = self.threat_base;
        if features.border_proximity() < self.border_cutoff {
            score += self.border_bonus;
        }
        score += match priority {
            Priority::High => self.high_priority_bonus,
            Priority::Medium => self.medium_priority_bonus,
            Priority::Low => 0.0,
        };
        score += features.economic_activity() / self.economic_divisor;
        score.clamp(0.0, 1.0)
    }
}

/// Seeded label generator: the expected values plus zero-mean Gaussian noise.
#[derive(Debug, Clone)]
pub struct TargetSimulator {
    tables: SimulationTables,
    rng: SmallRng,
    growth_noise: Option<Normal>,
    threat_noise: Option<Normal>,
}

impl TargetSimulator {
    /// Creates a generator. A non-positive standard deviation disables that noise.
    #[must_use]
    pub fn new(tables: SimulationTables, seed: u64, growth_std: f64, threat_std: f64) -> Self {
        Self {
            tables,
            rng: SmallRng::seed_from_u64(seed),
            growth_noise: Normal::new(0.0, growth_std).ok(),
            threat_noise: Normal::new(0.0, threat_std).ok(),
        }
    }

    fn noise(rng: &mut SmallRng, dist: Option<&Normal>) -> f64 {
        dist.map_or(0.0, |dist| rand::distributions::Distribution::sample(dist, rng))
    }

    /// Growth rate label, floored at zero.
    pub fn growth_rate(&mut self, asset_type: &AssetType, priority: Priority) -> f64 {
        let expected = self.tables.expected_growth_rate(asset_type, priority);
        let noise = Self::noise(&mut self.rng, self.growth_noise.as_ref());
        (expected + noise).max(0.0)
    }

    /// Threat score label, clamped to `[0, 1]`.
    pub fn threat_score(&mut self, priority: Priority, features: &FeatureVector) -> f64 {
        let expected = self.tables.expected_threat_score(priority, features);
        let noise = Self::noise(&mut self.rng, self.threat_noise.as_ref());
        (expected + noise).clamp(0.0, 1.0)
    }
}
