use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{asset::AssetType, geo::GeoPoint};

/// Full-decay radius around a major city, km.
pub const CITY_NEAR_KM: f64 = 50.0;
/// Plateau radius around a major city, km.
pub const CITY_REGIONAL_KM: f64 = 100.0;
/// Fraction of importance awarded on the regional plateau.
pub const CITY_REGIONAL_SHARE: f64 = 0.3;
/// Full-decay radius around a border zone, km.
pub const BORDER_NEAR_KM: f64 = 25.0;
/// Plateau radius around a border zone, km.
pub const BORDER_OUTER_KM: f64 = 50.0;
/// Fraction of weight awarded on the border plateau.
pub const BORDER_OUTER_SHARE: f64 = 0.5;

/// Area above which an asset counts as large, m².
pub const LARGE_AREA_SQ_M: f64 = 1_000_000.0;
/// Area above which an asset counts as medium, m².
pub const MEDIUM_AREA_SQ_M: f64 = 100_000.0;

/// Total score at or above which priority is HIGH.
pub const HIGH_PRIORITY_SCORE: f64 = 80.0;
/// Total score at or above which priority is MEDIUM.
pub const MEDIUM_PRIORITY_SCORE: f64 = 50.0;
/// Threat score at or above which threat is HIGH.
pub const HIGH_THREAT_SCORE: f64 = 70.0;
/// Threat score at or above which threat is MEDIUM.
pub const MEDIUM_THREAT_SCORE: f64 = 40.0;

/// Base score and factor tags for one asset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeProfile {
    /// Base score.
    pub score: f64,
    /// Factor tags contributed by the type.
    pub factors: Vec<String>,
}

impl TypeProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(score: f64, factors: &[&str]) -> Self {
        Self {
            score,
            factors: factors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Kind of strategic site, which decides the factor tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Major city.
    City,
    /// Sensitive border stretch.
    Border,
    /// Military zone.
    Military,
}

/// Weighted reference location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicSite {
    /// Display name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Importance (cities) or threat level (border and military zones).
    pub weight: f64,
    /// Site kind.
    pub kind: SiteKind,
}

impl StrategicSite {
    /// Creates a site.
    #[must_use]
    pub fn new(name: &str, lat: f64, lon: f64, weight: f64, kind: SiteKind) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            weight,
            kind,
        }
    }

    /// Coordinates.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Lower-case, underscore-joined name used in factor tags.
    #[must_use]
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

/// Lower-cases and joins words with underscores.
#[must_use]
pub fn slug(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_")
}

/// Lookup tables consumed by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTables {
    /// Base profile per type.
    pub type_profiles: IndexMap<AssetType, TypeProfile>,
    /// Profile for unlisted types.
    pub default_profile: TypeProfile,
    /// Major cities.
    pub major_cities: Vec<StrategicSite>,
    /// Border areas and military zones.
    pub border_zones: Vec<StrategicSite>,
    /// Name keywords and their cumulative bonus, checked in order.
    pub critical_keywords: IndexMap<String, f64>,
    /// Factor substrings that raise the threat score.
    pub threat_keywords: Vec<String>,
    /// Bonus per threat-raising factor.
    pub threat_factor_bonus: f64,
    /// Weight of the total score in the threat score.
    pub threat_score_share: f64,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            type_profiles: IndexMap::from([
                (
                    AssetType::NuclearPowerPlant,
                    TypeProfile::new(95.0, &["nuclear_facility", "critical_infrastructure"]),
                ),
                (
                    AssetType::MilitaryFacility,
                    TypeProfile::new(90.0, &["military_installation"]),
                ),
                (
                    AssetType::InternationalAirport,
                    TypeProfile::new(85.0, &["aviation_hub", "international_connectivity"]),
                ),
                (
                    AssetType::MajorPort,
                    TypeProfile::new(80.0, &["maritime_gateway"]),
                ),
                (
                    AssetType::PowerInfrastructure,
                    TypeProfile::new(65.0, &["energy_infrastructure"]),
                ),
                (
                    AssetType::MajorBridge,
                    TypeProfile::new(65.0, &["transportation_link"]),
                ),
                (
                    AssetType::RailwayHub,
                    TypeProfile::new(60.0, &["rail_connectivity"]),
                ),
                (
                    AssetType::RegionalAirport,
                    TypeProfile::new(55.0, &["regional_aviation"]),
                ),
                (
                    AssetType::LocalBridge,
                    TypeProfile::new(30.0, &["local_transport"]),
                ),
                (
                    AssetType::MinorRailway,
                    TypeProfile::new(25.0, &["local_rail"]),
                ),
                (
                    AssetType::LocalRoad,
                    TypeProfile::new(20.0, &["local_access"]),
                ),
                (
                    AssetType::Bridge,
                    TypeProfile::new(40.0, &["transport_infrastructure"]),
                ),
                (
                    AssetType::Airport,
                    TypeProfile::new(70.0, &["aviation_infrastructure"]),
                ),
                (
                    AssetType::RailwayInfrastructure,
                    TypeProfile::new(50.0, &["rail_infrastructure"]),
                ),
            ]),
            default_profile: TypeProfile::new(30.0, &["unclassified"]),
            major_cities: vec![
                StrategicSite::new("New Delhi", 28.6139, 77.2090, 10.0, SiteKind::City),
                StrategicSite::new("Mumbai", 19.0760, 72.8777, 9.0, SiteKind::City),
                StrategicSite::new("Kolkata", 22.5726, 88.3639, 8.0, SiteKind::City),
                StrategicSite::new("Chennai", 13.0827, 80.2707, 8.0, SiteKind::City),
                StrategicSite::new("Bangalore", 12.9716, 77.5946, 8.0, SiteKind::City),
            ],
            border_zones: vec![
                StrategicSite::new("LOC Kashmir", 34.0837, 74.7973, 10.0, SiteKind::Border),
                StrategicSite::new(
                    "Pakistan Border Punjab",
                    31.6340,
                    74.8723,
                    9.0,
                    SiteKind::Border,
                ),
                StrategicSite::new(
                    "China Border Ladakh",
                    34.1526,
                    77.5771,
                    10.0,
                    SiteKind::Border,
                ),
                StrategicSite::new(
                    "Bangladesh Border",
                    24.6332,
                    88.7789,
                    7.0,
                    SiteKind::Border,
                ),
                StrategicSite::new(
                    "Siachen Glacier",
                    35.4219,
                    77.0689,
                    10.0,
                    SiteKind::Military,
                ),
                StrategicSite::new("Kargil Sector", 34.5539, 76.1250, 9.0, SiteKind::Military),
            ],
            critical_keywords: IndexMap::from([
                ("international".to_string(), 20.0),
                ("national highway".to_string(), 25.0),
                ("expressway".to_string(), 20.0),
                ("metro".to_string(), 15.0),
                ("central".to_string(), 15.0),
                ("main".to_string(), 10.0),
            ]),
            threat_keywords: ["border", "military", "nuclear", "international"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            threat_factor_bonus: 10.0,
            threat_score_share: 0.7,
        }
    }
}

impl ScoringTables {
    /// Profile for a type, the default when unlisted.
    #[must_use]
    pub fn profile(&self, asset_type: &AssetType) -> &TypeProfile {
        self.type_profiles
            .get(asset_type)
            .unwrap_or(&self.default_profile)
    }
}
