use std::fmt;

use serde::{Deserialize, Serialize};

/// Named analysis region, assigned from fixed latitude and longitude bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    /// Latitude above 32.
    NorthKashmir,
    /// Above 28, west of 77.
    NorthPunjab,
    /// Above 28, east of 77.
    NorthDelhiNcr,
    /// Above 23, west of 73.
    WestRajasthan,
    /// Above 23, west of 80.
    CentralMpUp,
    /// Above 20, east of 80.
    EastBengal,
    /// Above 15, east of 77.
    SouthDeccan,
    /// West of 75.
    WestMaharashtra,
    /// Everything else inside the bands.
    SouthTamilNadu,
    /// Coordinates that cannot be placed.
    CentralIndia,
}

impl Region {
    /// Every region, in decision-table order.
    pub const ALL: [Self; 10] = [
        Self::NorthKashmir,
        Self::NorthPunjab,
        Self::NorthDelhiNcr,
        Self::WestRajasthan,
        Self::CentralMpUp,
        Self::EastBengal,
        Self::SouthDeccan,
        Self::WestMaharashtra,
        Self::SouthTamilNadu,
        Self::CentralIndia,
    ];

    /// Places a coordinate. Non-finite input lands in [`Region::CentralIndia`].
    #[must_use]
    pub fn determine(lat: f64, lon: f64) -> Self {
        if !lat.is_finite() || !lon.is_finite() {
            return Self::CentralIndia;
        }
        if lat > 32.0 {
            Self::NorthKashmir
        } else if lat > 28.0 && lon < 77.0 {
            Self::NorthPunjab
        } else if lat > 28.0 {
            Self::NorthDelhiNcr
        } else if lat > 23.0 && lon < 73.0 {
            Self::WestRajasthan
        } else if lat > 23.0 && lon < 80.0 {
            Self::CentralMpUp
        } else if lat > 20.0 && lon > 80.0 {
            Self::EastBengal
        } else if lat > 15.0 && lon > 77.0 {
            Self::SouthDeccan
        } else if lon < 75.0 {
            Self::WestMaharashtra
        } else {
            Self::SouthTamilNadu
        }
    }

    /// Canonical name used in reports and stored keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NorthKashmir => "North_Kashmir",
            Self::NorthPunjab => "North_Punjab",
            Self::NorthDelhiNcr => "North_Delhi_NCR",
            Self::WestRajasthan => "West_Rajasthan",
            Self::CentralMpUp => "Central_MP_UP",
            Self::EastBengal => "East_Bengal",
            Self::SouthDeccan => "South_Deccan",
            Self::WestMaharashtra => "West_Maharashtra",
            Self::SouthTamilNadu => "South_Tamil_Nadu",
            Self::CentralIndia => "Central_India",
        }
    }

    /// Parses a canonical name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|region| region.as_str() == raw.trim())
    }
}

/// Free-function form of [`Region::determine`].
#[must_use]
pub fn determine_region(lat: f64, lon: f64) -> Region {
    Region::determine(lat, lon)
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Region {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown region `{value}`"))
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.as_str().to_string()
    }
}
