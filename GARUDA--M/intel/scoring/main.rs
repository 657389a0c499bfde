//! Multi-factor strategic classification of assets.

/// Scorer lookup tables and band constants.
pub mod tables;
/// Classification result types.
pub mod types;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

pub use tables::{ScoringTables, SiteKind, StrategicSite, TypeProfile};
pub use types::{
    priority_for_score, threat_level_for, ClassificationResult, ScoreBreakdown, ThreatLevel,
};

use crate::{
    asset::{Asset, AssetType, Tags},
    geo::{GeoPoint, ResolvedPoint},
    telemetry::{emit, IntelTelemetry},
};
use tables::{
    slug, BORDER_NEAR_KM, BORDER_OUTER_KM, BORDER_OUTER_SHARE, CITY_NEAR_KM, CITY_REGIONAL_KM,
    CITY_REGIONAL_SHARE, LARGE_AREA_SQ_M, MEDIUM_AREA_SQ_M,
};

/// Score and factor tags contributed by one signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    /// Points awarded.
    pub score: f64,
    /// Factor tags.
    pub factors: Vec<String>,
}

impl SignalScore {
    fn add(&mut self, points: f64, factor: impl Into<String>) {
        self.score += points;
        self.factors.push(factor.into());
    }
}

/// Deterministic classifier over geographic, border, and criticality signals.
#[derive(Debug, Clone, Default)]
pub struct GeospatialScorer {
    tables: ScoringTables,
    telemetry: Option<IntelTelemetry>,
}

impl GeospatialScorer {
    /// Creates a scorer over the given tables.
    #[must_use]
    pub const fn new(tables: ScoringTables) -> Self {
        Self {
            tables,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: IntelTelemetry) -> Self {
        self.telemetry = Some(telemetry.scoped("scoring"));
        self
    }

    /// Tables in use.
    #[must_use]
    pub const fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    /// Classifies an asset record.
    #[must_use]
    pub fn classify_asset(&self, asset: &Asset) -> ClassificationResult {
        self.classify(
            &asset.name,
            &asset.asset_type,
            asset.location,
            asset.area_sq_m,
            asset.tags.as_ref(),
        )
    }

    /// Classifies many assets in parallel; output order matches input order.
    #[must_use]
    pub fn classify_batch(&self, assets: &[Asset]) -> Vec<ClassificationResult> {
        assets
            .par_iter()
            .map(|asset| self.classify_asset(asset))
            .collect()
    }

    /// Classifies from raw attributes. Same inputs always give the same result.
    #[must_use]
    pub fn classify(
        &self,
        name: &str,
        asset_type: &AssetType,
        point: Option<GeoPoint>,
        area_sq_m: Option<f64>,
        tags: Option<&Tags>,
    ) -> ClassificationResult {
        let resolved = ResolvedPoint::resolve(point);
        let mut factors = Vec::new();

        let kind = self.type_score(asset_type, tags);
        let geographic = self.geographic_score(resolved.point);
        let border = self.border_score(resolved.point);
        let infrastructure = self.infrastructure_score(name);
        let size = self.size_score(name, area_sq_m, tags);

        let breakdown = ScoreBreakdown {
            type_score: kind.score,
            geographic: geographic.score,
            border: border.score,
            infrastructure: infrastructure.score,
            size: size.score,
        };
        for signal in [kind, geographic, border, infrastructure, size] {
            factors.extend(signal.factors);
        }
        if resolved.is_fallback() {
            factors.push("fallback_location".to_string());
            self.log(
                LogLevel::Warn,
                "classification_fallback_location",
                json!({ "asset": name, "point": point }),
            );
        }

        let score = breakdown.total();
        let threat_score = self.threat_score(score, &factors);
        let result = ClassificationResult {
            name: name.to_string(),
            priority: priority_for_score(score),
            threat_level: threat_level_for(threat_score),
            score,
            threat_score,
            factors,
            breakdown,
            coordinates: resolved.point,
            location_source: resolved.source,
        };
        self.log(
            LogLevel::Debug,
            "asset_classified",
            json!({
                "asset": name,
                "priority": result.priority,
                "threat_level": result.threat_level,
                "score": score,
            }),
        );
        result
    }

    fn type_score(&self, asset_type: &AssetType, tags: Option<&Tags>) -> SignalScore {
        let profile = self.tables.profile(asset_type);
        let mut signal = SignalScore {
            score: profile.score,
            factors: profile.factors.clone(),
        };
        let Some(tags) = tags else {
            return signal;
        };
        match tags.get("highway").map(String::as_str) {
            Some("trunk" | "primary") => signal.add(20.0, "major_highway_bridge"),
            Some("secondary" | "tertiary") => signal.add(10.0, "secondary_road_bridge"),
            _ => {}
        }
        if tags.get("railway").map(String::as_str) == Some("rail")
            && tags.get("usage").map(String::as_str) == Some("main")
        {
            signal.add(15.0, "mainline_railway");
        }
        if tags.get("aeroway").map(String::as_str) == Some("aerodrome") {
            let code = tags
                .get("iata")
                .or_else(|| tags.get("icao"))
                .filter(|code| !code.is_empty());
            if code.is_some() {
                signal.add(25.0, "commercial_airport");
            }
        }
        signal
    }

    /// City proximity: linear decay inside 50 km, regional plateau to 100 km,
    /// zero beyond. Truncated to whole points.
    ///
    /// The decay falls under the plateau past 35 km, so the score steps back
    /// up at the 50 km seam.
    #[must_use]
    pub fn geographic_score(&self, point: GeoPoint) -> SignalScore {
        let mut best = 0.0_f64;
        let mut factors = Vec::new();
        for city in &self.tables.major_cities {
            let distance = point.distance_km(&city.point());
            if distance <= CITY_NEAR_KM {
                best = best.max(city.weight * (CITY_NEAR_KM - distance) / CITY_NEAR_KM);
                factors.push(format!("near_{}", city.slug()));
            } else if distance <= CITY_REGIONAL_KM {
                best = best.max(city.weight * CITY_REGIONAL_SHARE);
                factors.push(format!("regional_{}", city.slug()));
            }
        }
        SignalScore {
            score: best.trunc(),
            factors,
        }
    }

    /// Border and military zone proximity: decay inside 25 km, plateau to
    /// 50 km, zero beyond. Truncated to whole points.
    #[must_use]
    pub fn border_score(&self, point: GeoPoint) -> SignalScore {
        let mut best = 0.0_f64;
        let mut factors = Vec::new();
        for zone in &self.tables.border_zones {
            let distance = point.distance_km(&zone.point());
            if distance <= BORDER_NEAR_KM {
                best = best.max(zone.weight * (BORDER_NEAR_KM - distance) / BORDER_NEAR_KM);
                let prefix = match zone.kind {
                    SiteKind::Military => "military_zone",
                    SiteKind::Border | SiteKind::City => "border_proximity",
                };
                factors.push(format!("{prefix}_{}", zone.slug()));
            } else if distance <= BORDER_OUTER_KM {
                best = best.max(zone.weight * BORDER_OUTER_SHARE);
            }
        }
        SignalScore {
            score: best.trunc(),
            factors,
        }
    }

    fn infrastructure_score(&self, name: &str) -> SignalScore {
        let lowered = name.to_lowercase();
        let mut signal = SignalScore::default();
        for (keyword, points) in &self.tables.critical_keywords {
            if lowered.contains(keyword.as_str()) {
                signal.add(*points, format!("critical_{}", slug(keyword)));
            }
        }
        signal
    }

    fn size_score(&self, name: &str, area_sq_m: Option<f64>, tags: Option<&Tags>) -> SignalScore {
        let mut signal = SignalScore::default();
        match area_sq_m {
            Some(area) if !area.is_finite() || area < 0.0 => self.log(
                LogLevel::Warn,
                "classification_invalid_area",
                json!({ "asset": name, "area": area.to_string() }),
            ),
            Some(area) if area > LARGE_AREA_SQ_M => signal.add(15.0, "large_infrastructure"),
            Some(area) if area > MEDIUM_AREA_SQ_M => signal.add(10.0, "medium_infrastructure"),
            _ => {}
        }
        if let Some(raw) = tags.and_then(|tags| tags.get("lanes")) {
            match raw.trim().parse::<i64>() {
                Ok(lanes) if lanes >= 6 => signal.add(15.0, "major_capacity"),
                Ok(lanes) if lanes >= 4 => signal.add(10.0, "medium_capacity"),
                Ok(_) => {}
                Err(_) => self.log(
                    LogLevel::Warn,
                    "classification_malformed_lanes",
                    json!({ "asset": name, "lanes": raw }),
                ),
            }
        }
        signal
    }

    fn threat_score(&self, score: f64, factors: &[String]) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let flagged = factors
            .iter()
            .filter(|factor| {
                self.tables
                    .threat_keywords
                    .iter()
                    .any(|keyword| factor.contains(keyword.as_str()))
            })
            .count() as f64;
        self.tables
            .threat_score_share
            .mul_add(score, self.tables.threat_factor_bonus * flagged)
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        emit(self.telemetry.as_ref(), level, message, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asset::{Footprint, Priority},
        geo::{LocationSource, CAPITAL},
    };
    use shared_logging::MemoryLogger;
    use std::sync::Arc;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn test_bridge_footprint() -> Footprint {
        Footprint::new(vec![
            (77.2090, 28.6139),
            (77.2190, 28.6139),
            (77.2190, 28.6239),
            (77.2090, 28.6239),
        ])
    }

    #[test]
    fn test_bridge_point_only_scores_type_and_geography() {
        let scorer = GeospatialScorer::default();
        let highway = tags(&[("highway", "primary")]);
        let result = scorer.classify(
            "Test Bridge",
            &AssetType::Bridge,
            Some(CAPITAL),
            None,
            Some(&highway),
        );
        assert!((result.breakdown.type_score - 60.0).abs() < f64::EPSILON);
        assert!((result.breakdown.geographic - 10.0).abs() < f64::EPSILON);
        assert!(result.has_factor("major_highway_bridge"));
        assert!(result.has_factor("near_new_delhi"));
        assert!((result.score - 70.0).abs() < f64::EPSILON);
        assert_eq!(result.priority, Priority::Medium);
    }

    #[test]
    fn test_bridge_footprint_resolves_high() {
        let scorer = GeospatialScorer::default();
        let asset = Asset::from_footprint("Test Bridge", "Bridge", &test_bridge_footprint())
            .with_tag("highway", "primary");
        let result = scorer.classify_asset(&asset);
        // 40 type + 20 highway + 9 geography + 15 large footprint
        assert!((result.score - 84.0).abs() < f64::EPSILON, "score {}", result.score);
        assert_eq!(result.priority, Priority::High);
        assert!(result.has_factor("large_infrastructure"));
        assert_eq!(result.location_source, LocationSource::Geometry);
    }

    #[test]
    fn classification_is_deterministic() {
        let scorer = GeospatialScorer::default();
        let asset = Asset::new("Central Metro Interchange", AssetType::RailwayHub)
            .with_location(19.08, 72.88)
            .with_area(250_000.0)
            .with_tag("lanes", "6");
        assert_eq!(scorer.classify_asset(&asset), scorer.classify_asset(&asset));
    }

    #[test]
    fn geographic_score_decays_within_each_band() {
        let scorer = GeospatialScorer::default();
        let mut near_previous = f64::INFINITY;
        let mut regional = Vec::new();
        for step in 0..60 {
            let offset_deg = f64::from(step) * 0.025;
            let point = GeoPoint::new(CAPITAL.lat + offset_deg, CAPITAL.lon);
            let distance = CAPITAL.distance_km(&point);
            let score = scorer.geographic_score(point).score;
            if distance <= CITY_NEAR_KM {
                assert!(score <= near_previous, "rose at step {step}");
                near_previous = score;
            } else if distance <= CITY_REGIONAL_KM {
                regional.push(score);
            } else {
                assert!(score.abs() < f64::EPSILON);
            }
        }
        assert!(!regional.is_empty());
        assert!(regional.iter().all(|score| (score - 3.0).abs() < f64::EPSILON));
    }

    #[test]
    fn geographic_score_at_forty_km_uses_the_decay() {
        let scorer = GeospatialScorer::default();
        // 0.36 degrees of latitude is roughly 40 km
        let point = GeoPoint::new(CAPITAL.lat + 0.36, CAPITAL.lon);
        let distance = point.distance_km(&CAPITAL);
        assert!((39.0..41.0).contains(&distance), "distance {distance}");
        let signal = scorer.geographic_score(point);
        let expected = (10.0 * (CITY_NEAR_KM - distance) / CITY_NEAR_KM).trunc();
        assert!((signal.score - expected).abs() < f64::EPSILON);
        assert!(signal.score < 3.0);
        assert!(signal.factors.contains(&"near_new_delhi".to_string()));
    }

    #[test]
    fn border_score_bounds() {
        let scorer = GeospatialScorer::default();
        let at_loc = scorer.border_score(GeoPoint::new(34.0837, 74.7973));
        assert!((at_loc.score - 10.0).abs() < f64::EPSILON);
        assert!(at_loc
            .factors
            .contains(&"border_proximity_loc_kashmir".to_string()));
        let siachen = scorer.border_score(GeoPoint::new(35.4219, 77.0689));
        assert!(siachen
            .factors
            .contains(&"military_zone_siachen_glacier".to_string()));
        assert!(scorer.border_score(CAPITAL).score.abs() < f64::EPSILON);
    }

    #[test]
    fn keyword_tag_and_threat_signals_accumulate() {
        let scorer = GeospatialScorer::default();
        let asset = Asset::new("Indira Gandhi International Airport", AssetType::InternationalAirport)
            .with_location(28.5562, 77.1000)
            .with_tag("aeroway", "aerodrome")
            .with_tag("iata", "DEL");
        let result = scorer.classify_asset(&asset);
        assert!(result.has_factor("critical_international"));
        assert!(result.has_factor("commercial_airport"));
        // international_connectivity and critical_international raise the threat score
        let expected = 0.7f64.mul_add(result.score, 20.0);
        assert!((result.threat_score - expected).abs() < 1e-9);
        assert_eq!(result.threat_level, ThreatLevel::High);
    }

    #[test]
    fn missing_location_falls_back_and_logs() {
        let memory = Arc::new(MemoryLogger::new());
        let telemetry = IntelTelemetry::builder("garuda")
            .sink(memory.clone())
            .build()
            .unwrap();
        let scorer = GeospatialScorer::default().with_telemetry(telemetry);
        let result = scorer.classify("Unmapped Culvert", &AssetType::LocalRoad, None, None, None);
        assert_eq!(result.coordinates, CAPITAL);
        assert!(result.has_factor("fallback_location"));
        assert!(memory.contains("classification_fallback_location"));

        let odd = scorer.classify(
            "Odd Lanes",
            &AssetType::LocalRoad,
            Some(CAPITAL),
            None,
            Some(&tags(&[("lanes", "four")])),
        );
        assert!(odd.breakdown.size.abs() < f64::EPSILON);
        assert!(memory.contains("classification_malformed_lanes"));
    }

    #[test]
    fn batch_keeps_input_order() {
        let scorer = GeospatialScorer::default();
        let assets: Vec<Asset> = (0..32)
            .map(|idx| {
                Asset::new(format!("Asset {idx}"), AssetType::Bridge)
                    .with_location(20.0 + f64::from(idx) * 0.1, 78.0)
            })
            .collect();
        let results = scorer.classify_batch(&assets);
        assert_eq!(results.len(), 32);
        for (asset, result) in assets.iter().zip(&results) {
            assert_eq!(asset.name, result.name);
        }
    }
}
