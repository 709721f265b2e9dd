//! Fixed-point geographic coordinates.
//!
//! Distance matrices are keyed by coordinate, so coordinates must compare and
//! hash exactly. [`LatLng`] stores degrees multiplied by one million and
//! truncated to `i32`; floating point never takes part in equality.

use std::fmt;

use geo::Coord;

/// Scale between degrees and the fixed-point representation.
pub const E6: f64 = 1e6;

/// A latitude/longitude pair in millionths of a degree.
///
/// # Examples
///
/// ```
/// use waymark_core::LatLng;
///
/// let denver = LatLng::new(39.770_813, -104.969_438);
/// assert_eq!(denver.lat_e6, 39_770_813);
/// assert_eq!(denver.google_maps_coordinate(), "39.770813,-104.969438");
/// assert_eq!(denver.osrm_coordinate(), "-104.969438,39.770813");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    /// Latitude in millionths of a degree.
    #[cfg_attr(feature = "serde", serde(rename = "latitude_e6"))]
    pub lat_e6: i32,
    /// Longitude in millionths of a degree.
    #[cfg_attr(feature = "serde", serde(rename = "longitude_e6"))]
    pub lng_e6: i32,
}

impl LatLng {
    /// Build a coordinate from decimal degrees, truncating towards zero.
    ///
    /// Values outside the `i32` range saturate.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        reason = "coordinates are keyed on degrees truncated to microdegrees"
    )]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            lat_e6: (latitude * E6) as i32,
            lng_e6: (longitude * E6) as i32,
        }
    }

    /// Build a coordinate directly from its fixed-point parts.
    #[must_use]
    pub const fn from_e6(lat_e6: i32, lng_e6: i32) -> Self {
        Self { lat_e6, lng_e6 }
    }

    /// Latitude in decimal degrees.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "microdegrees scale back to degrees")]
    pub fn latitude(self) -> f64 {
        f64::from(self.lat_e6) / E6
    }

    /// Longitude in decimal degrees.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "microdegrees scale back to degrees")]
    pub fn longitude(self) -> f64 {
        f64::from(self.lng_e6) / E6
    }

    /// `lng,lat` with six decimals, the order OSRM expects.
    #[must_use]
    pub fn osrm_coordinate(self) -> String {
        format!("{:.6},{:.6}", self.longitude(), self.latitude())
    }

    /// `lat,lng` with six decimals, the order the Google web services expect.
    #[must_use]
    pub fn google_maps_coordinate(self) -> String {
        format!("{:.6},{:.6}", self.latitude(), self.longitude())
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6},{:.6})", self.latitude(), self.longitude())
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(value: LatLng) -> Self {
        Self {
            x: value.longitude(),
            y: value.latitude(),
        }
    }
}

impl From<Coord<f64>> for LatLng {
    fn from(value: Coord<f64>) -> Self {
        Self::new(value.y, value.x)
    }
}
