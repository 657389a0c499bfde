use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub use crate::geo::LocationSource;
use crate::geo::{GeoPoint, ResolvedPoint, METRES_PER_DEGREE};

/// Free-form OpenStreetMap style key/value tags.
pub type Tags = BTreeMap<String, String>;

/// Asset category. Unknown names are kept verbatim in [`AssetType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    /// Bridge.
    Bridge,
    /// Tunnel.
    Tunnel,
    /// Airport.
    Airport,
    /// Railway infrastructure.
    RailwayInfrastructure,
    /// Port infrastructure.
    PortInfrastructure,
    /// Power infrastructure.
    PowerInfrastructure,
    /// Military facility.
    MilitaryFacility,
    /// Border infrastructure.
    BorderInfrastructure,
    /// Communication infrastructure.
    CommunicationInfrastructure,
    /// Critical infrastructure.
    CriticalInfrastructure,
    /// Nuclear power plant.
    NuclearPowerPlant,
    /// International airport.
    InternationalAirport,
    /// Major port.
    MajorPort,
    /// Major bridge.
    MajorBridge,
    /// Railway hub.
    RailwayHub,
    /// Regional airport.
    RegionalAirport,
    /// Local bridge.
    LocalBridge,
    /// Minor railway.
    MinorRailway,
    /// Local road.
    LocalRoad,
    /// Anything else.
    Other(String),
}

const NAMED_TYPES: [AssetType; 19] = [
    AssetType::Bridge,
    AssetType::Tunnel,
    AssetType::Airport,
    AssetType::RailwayInfrastructure,
    AssetType::PortInfrastructure,
    AssetType::PowerInfrastructure,
    AssetType::MilitaryFacility,
    AssetType::BorderInfrastructure,
    AssetType::CommunicationInfrastructure,
    AssetType::CriticalInfrastructure,
    AssetType::NuclearPowerPlant,
    AssetType::InternationalAirport,
    AssetType::MajorPort,
    AssetType::MajorBridge,
    AssetType::RailwayHub,
    AssetType::RegionalAirport,
    AssetType::LocalBridge,
    AssetType::MinorRailway,
    AssetType::LocalRoad,
];

/// Keyword lists used by [`AssetType::infer`], checked in order.
const TYPE_KEYWORDS: [(AssetType, &[&str]); 9] = [
    (AssetType::Bridge, &["bridge", "overpass", "flyover", "viaduct"]),
    (AssetType::Tunnel, &["tunnel", "underpass", "subway"]),
    (AssetType::Airport, &["airport", "airfield", "aerodrome", "runway"]),
    (
        AssetType::RailwayInfrastructure,
        &["railway", "train", "metro", "station", "rail"],
    ),
    (
        AssetType::PortInfrastructure,
        &["port", "harbor", "harbour", "dock", "terminal"],
    ),
    (
        AssetType::PowerInfrastructure,
        &["power", "plant", "substation", "grid", "nuclear", "thermal"],
    ),
    (
        AssetType::MilitaryFacility,
        &["military", "base", "camp", "barracks", "installation"],
    ),
    (
        AssetType::BorderInfrastructure,
        &["border", "checkpoint", "crossing", "fence"],
    ),
    (
        AssetType::CommunicationInfrastructure,
        &["tower", "antenna", "satellite", "communication"],
    ),
];

impl AssetType {
    /// Display name, e.g. `Power Infrastructure`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bridge => "Bridge",
            Self::Tunnel => "Tunnel",
            Self::Airport => "Airport",
            Self::RailwayInfrastructure => "Railway Infrastructure",
            Self::PortInfrastructure => "Port Infrastructure",
            Self::PowerInfrastructure => "Power Infrastructure",
            Self::MilitaryFacility => "Military Facility",
            Self::BorderInfrastructure => "Border Infrastructure",
            Self::CommunicationInfrastructure => "Communication Infrastructure",
            Self::CriticalInfrastructure => "Critical Infrastructure",
            Self::NuclearPowerPlant => "Nuclear Power Plant",
            Self::InternationalAirport => "International Airport",
            Self::MajorPort => "Major Port",
            Self::MajorBridge => "Major Bridge",
            Self::RailwayHub => "Railway Hub",
            Self::RegionalAirport => "Regional Airport",
            Self::LocalBridge => "Local Bridge",
            Self::MinorRailway => "Minor Railway",
            Self::LocalRoad => "Local Road",
            Self::Other(name) => name,
        }
    }

    /// Parses a type name. Case, spaces, hyphens, and underscores are ignored,
    /// so `PowerInfrastructure` and `power infrastructure` match.
    #[must_use]
    pub fn from_name(raw: &str) -> Self {
        let wanted = normalize(raw);
        NAMED_TYPES
            .iter()
            .find(|candidate| normalize(candidate.as_str()) == wanted)
            .cloned()
            .unwrap_or_else(|| Self::Other(raw.trim().to_string()))
    }

    /// Infers a type from free text. Defaults to critical infrastructure.
    #[must_use]
    pub fn infer(name: &str, description: &str) -> Self {
        let text = format!("{name} {description}").to_lowercase();
        TYPE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
            .map_or(Self::CriticalInfrastructure, |(kind, _)| kind.clone())
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AssetType {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<&str> for AssetType {
    fn from(value: &str) -> Self {
        Self::from_name(value)
    }
}

impl From<AssetType> for String {
    fn from(value: AssetType) -> Self {
        value.as_str().to_string()
    }
}

/// Three-valued strategic priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Low.
    #[default]
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

const HIGH_PRIORITY_TYPES: [AssetType; 4] = [
    AssetType::MilitaryFacility,
    AssetType::BorderInfrastructure,
    AssetType::PowerInfrastructure,
    AssetType::Airport,
];

const HIGH_PRIORITY_WORDS: [&str; 10] = [
    "international",
    "major",
    "main",
    "primary",
    "strategic",
    "nuclear",
    "military",
    "defense",
    "national",
    "critical",
];

const MEDIUM_PRIORITY_WORDS: [&str; 5] = ["regional", "state", "provincial", "secondary", "important"];

impl Priority {
    /// Numeric code used as a model feature (3/2/1).
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }

    /// Inverse of [`Priority::score`], rounding to the nearest code.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 2.5 {
            Self::High
        } else if score >= 1.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Parses `HIGH`/`MEDIUM`/`LOW` case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }

    /// Keyword pre-classification applied before the scorer runs, from the
    /// type plus name and description text.
    #[must_use]
    pub fn pre_classify(asset_type: &AssetType, name: &str, description: &str) -> Self {
        if HIGH_PRIORITY_TYPES.contains(asset_type) {
            return Self::High;
        }
        let text = format!("{name} {description}").to_lowercase();
        if HIGH_PRIORITY_WORDS.iter().any(|kw| text.contains(kw)) {
            Self::High
        } else if MEDIUM_PRIORITY_WORDS.iter().any(|kw| text.contains(kw)) {
            Self::Medium
        } else {
            Self::Low
        }
    }

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

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polygon ring in `(lon, lat)` order, as produced by geometry readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    ring: Vec<(f64, f64)>,
}

impl Footprint {
    /// Wraps a ring; a closing vertex equal to the first is dropped.
    #[must_use]
    pub fn new(mut ring: Vec<(f64, f64)>) -> Self {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        Self { ring }
    }

    fn signed_area_deg(&self) -> f64 {
        let n = self.ring.len();
        (0..n)
            .map(|i| {
                let (x0, y0) = self.ring[i];
                let (x1, y1) = self.ring[(i + 1) % n];
                x0.mul_add(y1, -(x1 * y0))
            })
            .sum::<f64>()
            / 2.0
    }

    /// Planar area converted to square metres, `None` for fewer than three vertices.
    #[must_use]
    pub fn area_sq_m(&self) -> Option<f64> {
        if self.ring.len() < 3 {
            return None;
        }
        Some(self.signed_area_deg().abs() * METRES_PER_DEGREE * METRES_PER_DEGREE)
    }

    /// Area-weighted centroid; degenerate rings fall back to the vertex mean.
    #[must_use]
    pub fn centroid(&self) -> Option<GeoPoint> {
        let n = self.ring.len();
        if n == 0 {
            return None;
        }
        let area = self.signed_area_deg();
        if n < 3 || area.abs() < f64::EPSILON {
            #[allow(clippy::cast_precision_loss)]
            let count = n as f64;
            let (sx, sy) = self
                .ring
                .iter()
                .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
            return Some(GeoPoint::new(sy / count, sx / count));
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let (x0, y0) = self.ring[i];
            let (x1, y1) = self.ring[(i + 1) % n];
            let cross = x0.mul_add(y1, -(x1 * y0));
            cx += (x0 + x1) * cross;
            cy += (y0 + y1) * cross;
        }
        Some(GeoPoint::new(cy / (6.0 * area), cx / (6.0 * area)))
    }
}

/// Record describing one physical asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Display name.
    pub name: String,
    /// Category.
    pub asset_type: AssetType,
    /// Pre-assigned priority, if any.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Representative point.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Footprint area in square metres.
    #[serde(default)]
    pub area_sq_m: Option<f64>,
    /// Optional tags.
    #[serde(default)]
    pub tags: Option<Tags>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl Asset {
    /// Creates an asset with only a name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, asset_type: impl Into<AssetType>) -> Self {
        Self {
            name: name.into(),
            asset_type: asset_type.into(),
            priority: None,
            location: None,
            area_sq_m: None,
            tags: None,
            description: String::new(),
        }
    }

    /// Builds an asset from a polygon footprint (centroid plus area).
    #[must_use]
    pub fn from_footprint(
        name: impl Into<String>,
        asset_type: impl Into<AssetType>,
        footprint: &Footprint,
    ) -> Self {
        let mut asset = Self::new(name, asset_type);
        asset.location = footprint.centroid();
        asset.area_sq_m = footprint.area_sq_m();
        asset
    }

    /// Sets the representative point.
    #[must_use]
    pub const fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(GeoPoint::new(lat, lon));
        self
    }

    /// Sets the area.
    #[must_use]
    pub const fn with_area(mut self, area_sq_m: f64) -> Self {
        self.area_sq_m = Some(area_sq_m);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(Tags::new)
            .insert(key.into(), value.into());
        self
    }

    /// Location used for scoring, substituting the capital when unusable.
    #[must_use]
    pub fn resolve_point(&self) -> ResolvedPoint {
        ResolvedPoint::resolve(self.location)
    }

    /// Provided priority, `LOW` when absent.
    #[must_use]
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_parse_loosely() {
        assert_eq!(
            AssetType::from_name("PowerInfrastructure"),
            AssetType::PowerInfrastructure
        );
        assert_eq!(
            AssetType::from_name("nuclear power plant"),
            AssetType::NuclearPowerPlant
        );
        assert_eq!(
            AssetType::from_name("Water Tower"),
            AssetType::Other("Water Tower".into())
        );
        let json = serde_json::to_string(&AssetType::MajorPort).unwrap();
        assert_eq!(json, "\"Major Port\"");
    }

    #[test]
    fn type_inference_follows_keyword_order() {
        assert_eq!(
            AssetType::infer("Yamuna Flyover", ""),
            AssetType::Bridge
        );
        assert_eq!(
            AssetType::infer("Central Station", "metro interchange"),
            AssetType::RailwayInfrastructure
        );
        assert_eq!(
            AssetType::infer("Water Treatment Works", ""),
            AssetType::CriticalInfrastructure
        );
    }

    #[test]
    fn pre_classification_uses_type_then_keywords() {
        assert_eq!(
            Priority::pre_classify(&AssetType::Airport, "Strip", ""),
            Priority::High
        );
        assert_eq!(
            Priority::pre_classify(&AssetType::Bridge, "State Highway Bridge", ""),
            Priority::Medium
        );
        assert_eq!(
            Priority::pre_classify(&AssetType::Bridge, "Village culvert", ""),
            Priority::Low
        );
        assert_eq!(Priority::from_score(Priority::Medium.score()), Priority::Medium);
    }

    #[test]
    fn footprint_square_has_expected_area_and_centroid() {
        let footprint = Footprint::new(vec![
            (77.2090, 28.6139),
            (77.2190, 28.6139),
            (77.2190, 28.6239),
            (77.2090, 28.6239),
            (77.2090, 28.6139),
        ]);
        let area = footprint.area_sq_m().unwrap();
        assert!((area - 1.239e6).abs() < 1e4, "area {area}");
        let centroid = footprint.centroid().unwrap();
        assert!((centroid.lat - 28.6189).abs() < 1e-6);
        assert!((centroid.lon - 77.2140).abs() < 1e-6);
    }

    #[test]
    fn assets_deserialize_with_defaults() {
        let asset: Asset = serde_json::from_str(
            r#"{"name":"Jammu Tawi Bridge","asset_type":"Bridge","location":{"lat":32.7,"lon":74.86}}"#,
        )
        .unwrap();
        assert_eq!(asset.asset_type, AssetType::Bridge);
        assert!(asset.tags.is_none());
        assert_eq!(asset.effective_priority(), Priority::Low);
        assert!(!asset.resolve_point().is_fallback());
    }
}
