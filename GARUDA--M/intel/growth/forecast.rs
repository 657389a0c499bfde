use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{region::Region, GrowthPattern, RiskLevel};
use crate::asset::AssetType;

/// Peak relative swing of the monthly seasonal factor.
pub const SEASONAL_AMPLITUDE: f64 = 0.1;
/// Confidence before size and balance adjustments.
pub const BASE_CONFIDENCE: f64 = 0.7;

/// Monthly count projection for one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthForecast {
    /// Region of the pattern.
    pub region: Region,
    /// Asset type of the pattern.
    pub asset_type: AssetType,
    /// Count at the start of the horizon.
    pub current_count: usize,
    /// Projected count at the end of each month, month 1 first.
    pub monthly_counts: Vec<f64>,
    /// Annual rate the projection compounds.
    pub annual_rate: f64,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Risk level carried over from the pattern.
    pub risk_level: RiskLevel,
}

impl GrowthForecast {
    /// Projected count at the end of the horizon, the current count when empty.
    #[must_use]
    pub fn final_count(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let current = self.current_count as f64;
        self.monthly_counts.last().copied().unwrap_or(current)
    }
}

/// Seasonal multiplier for month `m` (1-based).
#[must_use]
pub fn seasonal_factor(month: u32) -> f64 {
    SEASONAL_AMPLITUDE.mul_add((2.0 * PI * f64::from(month) / 12.0).sin(), 1.0)
}

/// Confidence from group size and priority balance, capped at 1.
#[must_use]
pub fn prediction_confidence(pattern: &GrowthPattern) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if pattern.total_assets > 10 {
        confidence += 0.2;
    } else if pattern.total_assets > 5 {
        confidence += 0.1;
    }
    let total = pattern.priority_distribution.total();
    if total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let balance =
            1.0 - pattern.priority_distribution.max_bucket() as f64 / total as f64;
        confidence += balance * 0.1;
    }
    confidence.min(1.0)
}

/// Compounds the pattern's count month by month over `horizon_months`.
#[must_use]
pub fn forecast(pattern: &GrowthPattern, horizon_months: u32) -> GrowthForecast {
    let monthly_rate = pattern.predicted_growth_rate / 12.0;
    #[allow(clippy::cast_precision_loss)]
    let mut count = pattern.total_assets as f64;
    let monthly_counts = (1..=horizon_months)
        .map(|month| {
            count *= monthly_rate.mul_add(seasonal_factor(month), 1.0);
            count
        })
        .collect();
    GrowthForecast {
        region: pattern.region,
        asset_type: pattern.asset_type.clone(),
        current_count: pattern.total_assets,
        monthly_counts,
        annual_rate: pattern.predicted_growth_rate,
        confidence: prediction_confidence(pattern),
        risk_level: pattern.risk_assessment.level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::{GrowthTrend, PriorityCounts, RiskAssessment};

    fn pattern(total: usize, rate: f64, priorities: PriorityCounts) -> GrowthPattern {
        GrowthPattern {
            asset_type: AssetType::Airport,
            region: Region::NorthDelhiNcr,
            total_assets: total,
            priority_distribution: priorities,
            average_growth_score: 0.6,
            growth_trend: GrowthTrend::ModerateGrowth,
            predicted_growth_rate: rate,
            risk_assessment: RiskAssessment::default(),
            fallback_locations: 0,
        }
    }

    #[test]
    fn positive_rate_ends_above_start() {
        let forecast = forecast(&pattern(8, 0.12, PriorityCounts::default()), 12);
        assert_eq!(forecast.monthly_counts.len(), 12);
        assert!(forecast.final_count() > 8.0);
        assert!(forecast
            .monthly_counts
            .windows(2)
            .all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn zero_rate_stays_within_seasonal_band() {
        let forecast = forecast(&pattern(4, 0.0, PriorityCounts::default()), 24);
        let (low, high) = (4.0 * (1.0 - SEASONAL_AMPLITUDE), 4.0 * (1.0 + SEASONAL_AMPLITUDE));
        assert!(forecast
            .monthly_counts
            .iter()
            .all(|count| (low..=high).contains(count)));
    }

    #[test]
    fn zero_horizon_is_empty() {
        let forecast = forecast(&pattern(3, 0.1, PriorityCounts::default()), 0);
        assert!(forecast.monthly_counts.is_empty());
        assert!((forecast.final_count() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_rewards_size_and_balance() {
        let skewed = PriorityCounts { high: 0, medium: 0, low: 12 };
        assert!((prediction_confidence(&pattern(12, 0.1, skewed)) - 0.9).abs() < 1e-12);
        let balanced = PriorityCounts { high: 2, medium: 2, low: 2 };
        let expected = 0.8 + (1.0 - 2.0 / 6.0) * 0.1;
        assert!((prediction_confidence(&pattern(6, 0.1, balanced)) - expected).abs() < 1e-12);
        assert!((prediction_confidence(&pattern(0, 0.1, PriorityCounts::default())) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn seasonal_factor_peaks_in_spring() {
        assert!((seasonal_factor(3) - 1.1).abs() < 1e-12);
        assert!((seasonal_factor(9) - 0.9).abs() < 1e-12);
        assert!((seasonal_factor(12) - 1.0).abs() < 1e-12);
    }
}
