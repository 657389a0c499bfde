use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    asset::{Asset, AssetType},
    geo::{GeoPoint, CAPITAL},
    telemetry::{emit, IntelTelemetry},
};

/// Feature names in vector order.
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "latitude",
    "longitude",
    "area_sq_m",
    "priority_score",
    "type_score",
    "distance_to_capital",
    "border_proximity",
    "population_density",
    "economic_activity",
];

/// Number of features.
pub const FEATURE_COUNT: usize = 9;

/// Vector returned when an asset cannot be read.
pub const DEFAULT_FEATURES: [f64; FEATURE_COUNT] =
    [28.6139, 77.2090, 1000.0, 1.0, 1.0, 100.0, 200.0, 1000.0, 30.0];

/// Area assumed when an asset carries none.
pub const DEFAULT_AREA_SQ_M: f64 = 1000.0;

/// Latitude and longitude offsets used as the border proximity proxy.
const BORDER_LATITUDES: [f64; 2] = [35.0, 24.0];
const BORDER_LONGITUDES: [f64; 2] = [68.0, 97.0];

/// Fixed-shape numeric description of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Wraps raw values in layout order.
    #[must_use]
    pub const fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// The documented default vector.
    #[must_use]
    pub const fn fallback() -> Self {
        Self::from_values(DEFAULT_FEATURES)
    }

    /// Values in layout order.
    #[must_use]
    pub const fn as_slice(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Looks a feature up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_LAYOUT
            .iter()
            .position(|candidate| *candidate == name)
            .map(|idx| self.values[idx])
    }

    /// Named view, in layout order.
    #[must_use]
    pub fn named(&self) -> IndexMap<&'static str, f64> {
        FEATURE_LAYOUT
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Latitude.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.values[0]
    }

    /// Longitude.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.values[1]
    }

    /// Priority code (3/2/1).
    #[must_use]
    pub const fn priority_score(&self) -> f64 {
        self.values[3]
    }

    /// Type code.
    #[must_use]
    pub const fn type_score(&self) -> f64 {
        self.values[4]
    }

    /// Degree-offset border proxy.
    #[must_use]
    pub const fn border_proximity(&self) -> f64 {
        self.values[6]
    }

    /// Population density estimate.
    #[must_use]
    pub const fn population_density(&self) -> f64 {
        self.values[7]
    }

    /// Economic activity estimate.
    #[must_use]
    pub const fn economic_activity(&self) -> f64 {
        self.values[8]
    }
}

/// Whether the vector reflects the asset or the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Computed from the asset.
    Extracted,
    /// The default vector was substituted.
    Defaulted {
        /// What was wrong with the asset.
        reason: String,
    },
}

/// Extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Feature values.
    pub vector: FeatureVector,
    /// Provenance.
    pub outcome: ExtractionOutcome,
}

impl Extraction {
    /// True when the default vector was used.
    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Defaulted { .. })
    }
}

/// City with a value that decays with distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCentre {
    /// City name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Value at the centre.
    pub value: f64,
}

impl WeightedCentre {
    /// Creates a centre.
    #[must_use]
    pub fn new(name: &str, lat: f64, lon: f64, value: f64) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            value,
        }
    }

    fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Lookup tables consumed by [`FeatureExtractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureTables {
    /// Population density centres.
    pub density_centres: Vec<WeightedCentre>,
    /// Decay radius for density, km.
    pub density_radius_km: f64,
    /// Minimum density.
    pub density_floor: f64,
    /// Economic activity centres.
    pub economic_centres: Vec<WeightedCentre>,
    /// Decay radius for economic activity, km.
    pub economic_radius_km: f64,
    /// Minimum economic activity.
    pub economic_floor: f64,
    /// Type codes; unlisted types score 0.
    pub type_scores: IndexMap<AssetType, f64>,
}

impl Default for FeatureTables {
    fn default() -> Self {
        Self {
            density_centres: vec![
                WeightedCentre::new("Delhi", 28.6139, 77.2090, 30_000.0),
                WeightedCentre::new("Mumbai", 19.0760, 72.8777, 20_000.0),
                WeightedCentre::new("Kolkata", 22.5726, 88.3639, 15_000.0),
                WeightedCentre::new("Chennai", 13.0827, 80.2707, 12_000.0),
                WeightedCentre::new("Bangalore", 12.9716, 77.5946, 11_000.0),
            ],
            density_radius_km: 500.0,
            density_floor: 100.0,
            economic_centres: vec![
                WeightedCentre::new("Delhi", 28.6139, 77.2090, 100.0),
                WeightedCentre::new("Mumbai", 19.0760, 72.8777, 95.0),
                WeightedCentre::new("Bangalore", 12.9716, 77.5946, 85.0),
                WeightedCentre::new("Kolkata", 22.5726, 88.3639, 80.0),
                WeightedCentre::new("Chennai", 13.0827, 80.2707, 75.0),
            ],
            economic_radius_km: 300.0,
            economic_floor: 10.0,
            type_scores: IndexMap::from([
                (AssetType::Bridge, 1.0),
                (AssetType::Airport, 2.0),
                (AssetType::PowerInfrastructure, 3.0),
                (AssetType::RailwayInfrastructure, 4.0),
                (AssetType::MilitaryFacility, 5.0),
                (AssetType::BorderInfrastructure, 6.0),
            ]),
        }
    }
}

impl FeatureTables {
    /// Code for a type, 0 when unlisted.
    #[must_use]
    pub fn type_score(&self, asset_type: &AssetType) -> f64 {
        self.type_scores.get(asset_type).copied().unwrap_or(0.0)
    }

    /// Reverse lookup of a type code, as decoded by the formula units.
    #[must_use]
    pub fn type_for_score(&self, score: f64) -> Option<&AssetType> {
        self.type_scores
            .iter()
            .find(|(_, code)| (**code - score).abs() < 0.5)
            .map(|(kind, _)| kind)
    }
}

/// Degree-offset border proxy: distance in degrees to the nearest reference
/// latitude or longitude.
#[must_use]
pub fn border_proximity_proxy(point: GeoPoint) -> f64 {
    BORDER_LATITUDES
        .iter()
        .map(|lat| (point.lat - lat).abs())
        .chain(BORDER_LONGITUDES.iter().map(|lon| (point.lon - lon).abs()))
        .fold(f64::INFINITY, f64::min)
}

fn decayed_max(point: GeoPoint, centres: &[WeightedCentre], radius_km: f64, floor: f64) -> f64 {
    centres
        .iter()
        .map(|centre| {
            let distance = point.distance_km(&centre.point());
            centre.value * (1.0 - distance / radius_km).max(0.1)
        })
        .fold(floor, f64::max)
}

/// Turns assets into feature vectors. Never fails.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    tables: FeatureTables,
    telemetry: Option<IntelTelemetry>,
}

impl FeatureExtractor {
    /// Creates an extractor over the given tables.
    #[must_use]
    pub const fn new(tables: FeatureTables) -> Self {
        Self {
            tables,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: IntelTelemetry) -> Self {
        self.telemetry = Some(telemetry.scoped("features"));
        self
    }

    /// Tables in use.
    #[must_use]
    pub const fn tables(&self) -> &FeatureTables {
        &self.tables
    }

    /// Extracts the feature vector, substituting the default on input defects.
    #[must_use]
    pub fn extract(&self, asset: &Asset) -> Extraction {
        match self.compute(asset) {
            Ok(vector) => Extraction {
                vector,
                outcome: ExtractionOutcome::Extracted,
            },
            Err(reason) => {
                emit(
                    self.telemetry.as_ref(),
                    LogLevel::Warn,
                    "feature_extraction_defaulted",
                    json!({ "asset": asset.name, "reason": reason }),
                );
                Extraction {
                    vector: FeatureVector::fallback(),
                    outcome: ExtractionOutcome::Defaulted { reason },
                }
            }
        }
    }

    fn compute(&self, asset: &Asset) -> Result<FeatureVector, String> {
        let resolved = asset.resolve_point();
        if resolved.is_fallback() {
            return Err(match asset.location {
                Some(point) => format!("location {point} is not usable"),
                None => "missing location".to_string(),
            });
        }
        let area = match asset.area_sq_m {
            Some(area) if !area.is_finite() || area < 0.0 => {
                return Err(format!("invalid area {area}"));
            }
            Some(area) => area,
            None => DEFAULT_AREA_SQ_M,
        };
        let point = resolved.point;
        let tables = &self.tables;
        Ok(FeatureVector::from_values([
            point.lat,
            point.lon,
            area,
            asset.effective_priority().score(),
            tables.type_score(&asset.asset_type),
            point.distance_km(&CAPITAL),
            border_proximity_proxy(point),
            decayed_max(
                point,
                &tables.density_centres,
                tables.density_radius_km,
                tables.density_floor,
            ),
            decayed_max(
                point,
                &tables.economic_centres,
                tables.economic_radius_km,
                tables.economic_floor,
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Priority;
    use shared_logging::MemoryLogger;
    use std::sync::Arc;

    #[test]
    fn delhi_asset_extracts_city_peaks() {
        let asset = Asset::new("Signature Bridge", AssetType::Bridge)
            .with_location(28.6139, 77.2090)
            .with_area(5_000.0)
            .with_priority(Priority::High);
        let extraction = FeatureExtractor::default().extract(&asset);
        assert_eq!(extraction.outcome, ExtractionOutcome::Extracted);
        let vector = extraction.vector;
        assert!(vector.get("distance_to_capital").unwrap() < 1e-6);
        assert!((vector.population_density() - 30_000.0).abs() < 1e-6);
        assert!((vector.economic_activity() - 100.0).abs() < 1e-6);
        assert!((vector.priority_score() - 3.0).abs() < f64::EPSILON);
        assert!((vector.type_score() - 1.0).abs() < f64::EPSILON);
        // min(|28.61-35|, |28.61-24|, |77.21-68|, |77.21-97|) = 4.6139
        assert!((vector.border_proximity() - 4.6139).abs() < 1e-9);
        assert_eq!(vector.named().keys().next(), Some(&"latitude"));
    }

    #[test]
    fn remote_asset_hits_floors() {
        let asset = Asset::new("Port Blair Jetty", "Port Infrastructure").with_location(11.62, 92.72);
        let vector = FeatureExtractor::default().extract(&asset).vector;
        assert!(vector.population_density() >= 100.0);
        assert!(vector.economic_activity() >= 10.0);
        assert!(vector.type_score().abs() < f64::EPSILON);
        assert!((vector.get("area_sq_m").unwrap() - DEFAULT_AREA_SQ_M).abs() < f64::EPSILON);
    }

    #[test]
    fn defects_yield_default_vector_and_log() {
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(memory.clone())
            .build()
            .unwrap();
        let extractor = FeatureExtractor::default().with_telemetry(telemetry);

        let missing = extractor.extract(&Asset::new("Nowhere", AssetType::Bridge));
        assert!(missing.is_defaulted());
        assert_eq!(missing.vector, FeatureVector::fallback());

        let negative = extractor.extract(
            &Asset::new("Odd", AssetType::Bridge)
                .with_location(20.0, 78.0)
                .with_area(-5.0),
        );
        assert!(negative.is_defaulted());
        assert_eq!(memory.snapshot().len(), 2);
    }

    #[test]
    fn kolkata_asset_takes_its_own_economic_centre() {
        let asset = Asset::new("Howrah Bridge", AssetType::Bridge)
            .with_location(22.5726, 88.3639)
            .with_area(5_000.0);
        let vector = FeatureExtractor::default().extract(&asset).vector;
        assert!((vector.economic_activity() - 80.0).abs() < 1e-6);
        assert!((vector.population_density() - 15_000.0).abs() < 1e-6);
        let tables = FeatureTables::default();
        assert_eq!(tables.economic_centres.len(), tables.density_centres.len());
    }

    #[test]
    fn type_codes_reverse() {
        let tables = FeatureTables::default();
        assert_eq!(
            tables.type_for_score(5.0),
            Some(&AssetType::MilitaryFacility)
        );
        assert_eq!(tables.type_for_score(0.0), None);
    }
}
