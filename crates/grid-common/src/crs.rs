//! Coordinate Reference System identifiers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A coordinate reference system identified by its EPSG code.
///
/// Projection parameters are resolved by the `projection` crate; this type
/// only carries the identifier so it can be cheaply copied into every raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic (lon/lat in degrees). Native grid of ERA5 fields.
    pub const WGS84: Crs = Crs { epsg: 4326 };

    pub const fn epsg(code: u16) -> Self {
        Self { epsg: code }
    }

    /// The numeric EPSG code.
    pub fn code(&self) -> u16 {
        self.epsg
    }
}

impl FromStr for Crs {
    type Err = CrsParseError;

    /// Accepts "EPSG:32644", "epsg:4326" and "CRS:84".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        if normalized == "CRS:84" {
            return Ok(Crs::WGS84);
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        code.parse::<u16>()
            .map(Crs::epsg)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Crs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
