//! Regional growth-pattern aggregation, monthly forecasting and hotspot
//! ranking.

/// Monthly count projection.
pub mod forecast;
/// Hotspot ranking.
pub mod hotspot;
/// Region decision table.
pub mod region;
/// Growth lookup tables and thresholds.
pub mod tables;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Write as _},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    asset::{Asset, AssetType, Priority},
    telemetry::{emit, IntelTelemetry},
};
use forecast::GrowthForecast;
use hotspot::Hotspot;
use region::Region;
pub use tables::GrowthTables;
use tables::{
    CONCENTRATION_COUNT, HIGH_RISK_SCORE, HIGH_VALUE_SHARE, MEDIUM_RISK_SCORE, MODERATE_TREND,
    RAPID_DEVELOPMENT_SCORE, RAPID_TREND, SLOW_TREND,
};

/// Hotspots listed in the text report.
const REPORT_HOTSPOTS: usize = 5;

/// Analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthSettings {
    /// Scoring tables.
    pub tables: GrowthTables,
    /// Horizon used when a caller does not pick one, months.
    pub default_horizon_months: u32,
    /// Hotspots returned when a caller does not pick a count.
    pub hotspot_limit: usize,
}

impl Default for GrowthSettings {
    fn default() -> Self {
        Self {
            tables: GrowthTables::default(),
            default_horizon_months: 12,
            hotspot_limit: 10,
        }
    }
}

/// Group key: asset type first, then region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatternKey {
    /// Asset type.
    pub asset_type: AssetType,
    /// Region.
    pub region: Region,
}

impl PatternKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(asset_type: AssetType, region: Region) -> Self {
        Self { asset_type, region }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.asset_type, self.region)
    }
}

impl TryFrom<String> for PatternKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Region::ALL
            .into_iter()
            .filter_map(|region| {
                value
                    .strip_suffix(region.as_str())
                    .and_then(|head| head.strip_suffix('_'))
                    .filter(|head| !head.is_empty())
                    .map(|head| Self::new(AssetType::from(head), region))
            })
            .next()
            .ok_or_else(|| format!("malformed pattern key `{value}`"))
    }
}

impl From<PatternKey> for String {
    fn from(value: PatternKey) -> Self {
        value.to_string()
    }
}

/// Assets per priority bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    /// HIGH.
    pub high: usize,
    /// MEDIUM.
    pub medium: usize,
    /// LOW.
    pub low: usize,
}

impl PriorityCounts {
    /// Counts one asset.
    pub fn record(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }

    /// Assets across buckets.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// Largest bucket.
    #[must_use]
    pub fn max_bucket(&self) -> usize {
        self.high.max(self.medium).max(self.low)
    }
}

/// Trend category of a group's average growth score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthTrend {
    /// Above 0.7.
    RapidGrowth,
    /// Above 0.5.
    ModerateGrowth,
    /// Above 0.3.
    SlowGrowth,
    /// Everything else.
    Stable,
}

impl GrowthTrend {
    /// Buckets an average growth score.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        if average > RAPID_TREND {
            Self::RapidGrowth
        } else if average > MODERATE_TREND {
            Self::ModerateGrowth
        } else if average > SLOW_TREND {
            Self::SlowGrowth
        } else {
            Self::Stable
        }
    }
}

/// Risk driver of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthRisk {
    /// More than ten assets in the group.
    HighConcentration,
    /// Most of the group is HIGH priority.
    HighValueConcentration,
    /// Region lies on a sensitive border.
    BorderVulnerability,
    /// Average growth score above 0.8.
    RapidDevelopment,
}

/// Risk level of a group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score at most 0.3.
    #[default]
    Low,
    /// Score above 0.3.
    Medium,
    /// Score above 0.6.
    High,
}

impl RiskLevel {
    /// Buckets a risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_SCORE {
            Self::High
        } else if score > MEDIUM_RISK_SCORE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk drivers, capped score and level of a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Drivers in evaluation order.
    pub factors: Vec<GrowthRisk>,
    /// Accumulated score, capped at 1.
    pub score: f64,
    /// Level.
    pub level: RiskLevel,
}

impl RiskAssessment {
    fn assess(
        tables: &GrowthTables,
        region: Region,
        count: usize,
        priorities: PriorityCounts,
        average: f64,
    ) -> Self {
        let mut factors = Vec::new();
        let mut score = 0.0_f64;
        if count > CONCENTRATION_COUNT {
            factors.push(GrowthRisk::HighConcentration);
            score += tables.concentration_risk;
        }
        #[allow(clippy::cast_precision_loss)]
        let high_share = if count == 0 {
            0.0
        } else {
            priorities.high as f64 / count as f64
        };
        if high_share > HIGH_VALUE_SHARE {
            factors.push(GrowthRisk::HighValueConcentration);
            score += tables.high_value_risk;
        }
        if tables.is_border_region(region) {
            factors.push(GrowthRisk::BorderVulnerability);
            score += tables.border_risk;
        }
        if average > RAPID_DEVELOPMENT_SCORE {
            factors.push(GrowthRisk::RapidDevelopment);
            score += tables.rapid_development_risk;
        }
        Self {
            factors,
            score: score.min(1.0),
            level: RiskLevel::from_score(score),
        }
    }

    /// True when `risk` drove the assessment.
    #[must_use]
    pub fn has(&self, risk: GrowthRisk) -> bool {
        self.factors.contains(&risk)
    }
}

/// Aggregate over every asset sharing a type and region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPattern {
    /// Asset type.
    pub asset_type: AssetType,
    /// Region.
    pub region: Region,
    /// Assets in the group.
    pub total_assets: usize,
    /// Priority buckets.
    pub priority_distribution: PriorityCounts,
    /// Mean per-asset growth score.
    pub average_growth_score: f64,
    /// Trend category.
    pub growth_trend: GrowthTrend,
    /// Predicted annual growth rate.
    pub predicted_growth_rate: f64,
    /// Risk assessment.
    pub risk_assessment: RiskAssessment,
    /// Members placed at the fallback coordinate.
    pub fallback_locations: usize,
}

impl GrowthPattern {
    /// Group key.
    #[must_use]
    pub fn key(&self) -> PatternKey {
        PatternKey::new(self.asset_type.clone(), self.region)
    }
}

/// Result of one analysis, ordered by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPatterns {
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
    /// Patterns by key.
    pub patterns: BTreeMap<PatternKey, GrowthPattern>,
}

impl GrowthPatterns {
    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no asset was analyzed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern for a key.
    #[must_use]
    pub fn get(&self, key: &PatternKey) -> Option<&GrowthPattern> {
        self.patterns.get(key)
    }

    /// Patterns in key order.
    pub fn iter(&self) -> impl Iterator<Item = &GrowthPattern> {
        self.patterns.values()
    }

    /// Forecasts every pattern over `horizon_months`.
    #[must_use]
    pub fn forecast_all(&self, horizon_months: u32) -> BTreeMap<PatternKey, GrowthForecast> {
        self.patterns
            .iter()
            .map(|(key, pattern)| (key.clone(), forecast::forecast(pattern, horizon_months)))
            .collect()
    }

    /// Highest-scoring `limit` patterns.
    #[must_use]
    pub fn top_hotspots(&self, limit: usize) -> Vec<Hotspot> {
        hotspot::rank(self.patterns.values(), limit)
    }

    /// Plain-text summary: leading hotspots, then per-region totals.
    #[must_use]
    pub fn report(&self) -> String {
        if self.is_empty() {
            return "No growth patterns analyzed yet.".to_string();
        }
        let regions: BTreeSet<Region> = self.iter().map(|p| p.region).collect();
        let types: BTreeSet<&AssetType> = self.iter().map(|p| &p.asset_type).collect();

        let mut out = String::new();
        let _ = writeln!(out, "GARUDA INFRASTRUCTURE GROWTH ANALYSIS REPORT");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(
            out,
            "Analysis Date: {}",
            self.analyzed_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Regions Analyzed: {}", regions.len());
        let _ = writeln!(out, "Asset Categories: {}", types.len());
        let _ = writeln!(out);

        let _ = writeln!(out, "TOP GROWTH HOTSPOTS:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for (rank, spot) in self.top_hotspots(REPORT_HOTSPOTS).iter().enumerate() {
            let _ = writeln!(out, "{}. {} - {}", rank + 1, spot.region, spot.asset_type);
            let _ = writeln!(out, "   Growth Score: {:.3}", spot.hotspot_score);
            let _ = writeln!(
                out,
                "   Predicted Growth: {:.1}% annually",
                spot.predicted_growth * 100.0
            );
            let _ = writeln!(out, "   Risk Level: {}", spot.risk_level);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "REGIONAL GROWTH SUMMARY:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for region in regions {
            let members: Vec<&GrowthPattern> =
                self.iter().filter(|p| p.region == region).collect();
            let total: usize = members.iter().map(|p| p.total_assets).sum();
            #[allow(clippy::cast_precision_loss)]
            let mean_rate = members
                .iter()
                .map(|p| p.predicted_growth_rate)
                .sum::<f64>()
                / members.len() as f64;
            let high_risk = members
                .iter()
                .filter(|p| p.risk_assessment.level == RiskLevel::High)
                .count();
            let _ = writeln!(out, "Region: {region}:");
            let _ = writeln!(out, "   Total Assets: {total}");
            let _ = writeln!(out, "   Average Growth: {:.1}%", mean_rate * 100.0);
            let _ = writeln!(out, "   High Risk Categories: {high_risk}");
            let _ = writeln!(out);
        }
        out
    }
}

#[derive(Default)]
struct GroupAccumulator {
    count: usize,
    priorities: PriorityCounts,
    score_sum: f64,
    fallback_locations: usize,
}

/// Groups assets by type and region and derives trend, rate and risk.
#[derive(Debug, Clone, Default)]
pub struct GrowthPatternAnalyzer {
    settings: GrowthSettings,
    telemetry: Option<IntelTelemetry>,
}

impl GrowthPatternAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub const fn new(settings: GrowthSettings) -> Self {
        Self {
            settings,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: IntelTelemetry) -> Self {
        self.telemetry = Some(telemetry.scoped("growth"));
        self
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &GrowthSettings {
        &self.settings
    }

    /// Builds patterns from scratch for `assets`.
    #[must_use]
    pub fn analyze(&self, assets: &[Asset]) -> GrowthPatterns {
        let tables = &self.settings.tables;
        let mut groups: BTreeMap<PatternKey, GroupAccumulator> = BTreeMap::new();
        for asset in assets {
            let resolved = asset.resolve_point();
            let region = Region::determine(resolved.point.lat, resolved.point.lon);
            let priority = asset.effective_priority();
            let group = groups
                .entry(PatternKey::new(asset.asset_type.clone(), region))
                .or_default();
            group.count += 1;
            group.priorities.record(priority);
            group.score_sum += tables.growth_score(priority, &asset.asset_type, region);
            if resolved.is_fallback() {
                group.fallback_locations += 1;
                self.log(
                    LogLevel::Debug,
                    "growth_fallback_location",
                    json!({ "asset": asset.name, "region": region }),
                );
            }
        }

        let patterns: BTreeMap<PatternKey, GrowthPattern> = groups
            .into_iter()
            .map(|(key, group)| {
                #[allow(clippy::cast_precision_loss)]
                let average = group.score_sum / group.count as f64;
                let pattern = GrowthPattern {
                    asset_type: key.asset_type.clone(),
                    region: key.region,
                    total_assets: group.count,
                    priority_distribution: group.priorities,
                    average_growth_score: average,
                    growth_trend: GrowthTrend::from_average(average),
                    predicted_growth_rate: tables.annual_rate(average, key.region),
                    risk_assessment: RiskAssessment::assess(
                        tables,
                        key.region,
                        group.count,
                        group.priorities,
                        average,
                    ),
                    fallback_locations: group.fallback_locations,
                };
                (key, pattern)
            })
            .collect();

        self.log(
            LogLevel::Info,
            "growth_patterns_analyzed",
            json!({ "assets": assets.len(), "groups": patterns.len() }),
        );
        GrowthPatterns {
            analyzed_at: Utc::now(),
            patterns,
        }
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        emit(self.telemetry.as_ref(), level, message, metadata);
    }
}
