use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Metres per degree used to convert planar footprint areas.
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// National capital, used for capital distance and as the fallback location.
pub const CAPITAL: GeoPoint = GeoPoint {
    lat: 28.6139,
    lon: 77.2090,
};

/// Bounding box of the covered territory `(min_lat, max_lat, min_lon, max_lon)`.
pub const COVERAGE_BOUNDS: (f64, f64, f64, f64) = (6.0, 38.0, 68.0, 98.0);

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and within `[-90, 90]`/`[-180, 180]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// True when the point lies inside [`COVERAGE_BOUNDS`].
    #[must_use]
    pub fn in_coverage(&self) -> bool {
        let (min_lat, max_lat, min_lon, max_lon) = COVERAGE_BOUNDS;
        self.is_valid()
            && (min_lat..=max_lat).contains(&self.lat)
            && (min_lon..=max_lon).contains(&self.lon)
    }

    /// Great-circle distance in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Haversine distance on a spherical Earth. Within 0.5% of the ellipsoidal
/// geodesic for the distances scored here.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Where a resolved point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// The asset's own geometry.
    Geometry,
    /// The asset had no usable geometry; the capital was substituted.
    Fallback,
}

/// Point used for scoring along with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPoint {
    /// Coordinates.
    pub point: GeoPoint,
    /// Provenance.
    pub source: LocationSource,
}

impl ResolvedPoint {
    /// Uses `point` when it is inside the coverage box, the capital otherwise.
    #[must_use]
    pub fn resolve(point: Option<GeoPoint>) -> Self {
        match point {
            Some(point) if point.in_coverage() => Self {
                point,
                source: LocationSource::Geometry,
            },
            _ => Self {
                point: CAPITAL,
                source: LocationSource::Fallback,
            },
        }
    }

    /// True when the capital was substituted.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == LocationSource::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delhi_to_mumbai_is_about_1150_km() {
        let mumbai = GeoPoint::new(19.0760, 72.8777);
        let d = CAPITAL.distance_km(&mumbai);
        assert!((1_140.0..1_160.0).contains(&d), "distance {d}");
        assert!(CAPITAL.distance_km(&CAPITAL).abs() < 1e-9);
    }

    #[test]
    fn resolve_substitutes_capital_outside_coverage() {
        let inside = ResolvedPoint::resolve(Some(GeoPoint::new(19.0, 73.0)));
        assert_eq!(inside.source, LocationSource::Geometry);

        let london = ResolvedPoint::resolve(Some(GeoPoint::new(51.5, -0.12)));
        assert!(london.is_fallback());
        assert_eq!(london.point, CAPITAL);

        let nan = ResolvedPoint::resolve(Some(GeoPoint::new(f64::NAN, 77.0)));
        assert!(nan.is_fallback());
        assert!(ResolvedPoint::resolve(None).is_fallback());
    }
}
