//! OSRM API response types for the Table, Route and Nearest services.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/>

use std::time::Duration;

use serde::Deserialize;
use waymark_core::{Distance, LatLng, MapServiceError};

/// Status code OSRM uses for success.
const OK_CODE: &str = "Ok";

/// OSRM Table API response.
///
/// The response contains duration and distance matrices on success or an
/// error message on failure. Rows follow `sources`, columns follow
/// `destinations`.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"NoTable"` - Table computation failed
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Matrix of durations in seconds. `None` cells mark unreachable pairs.
    pub durations: Option<Vec<Vec<Option<f64>>>>,

    /// Matrix of distances in metres. `None` cells mark unreachable pairs.
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

impl TableResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<RouteBody>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

/// One OSRM route requested with `geometries=geojson`.
#[derive(Debug, Deserialize)]
pub struct RouteBody {
    /// GeoJSON line string of the whole route.
    #[serde(default)]
    pub geometry: Geometry,
    /// Total distance in metres.
    pub distance: f64,
    /// Total duration in seconds.
    pub duration: f64,
    /// One leg per consecutive waypoint pair.
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
}

/// GeoJSON geometry; coordinates are `[lng, lat]`.
#[derive(Debug, Default, Deserialize)]
pub struct Geometry {
    /// Positions in travel order.
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

/// A route leg between two consecutive waypoints.
#[derive(Debug, Deserialize)]
pub struct RouteLeg {
    /// Leg distance in metres.
    pub distance: f64,
    /// Leg duration in seconds.
    pub duration: f64,
}

/// OSRM Nearest API response.
#[derive(Debug, Deserialize)]
pub struct NearestResponse {
    /// Status code from OSRM.
    pub code: String,
    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// Snapped points, nearest first.
    #[serde(default)]
    pub waypoints: Vec<NearestWaypoint>,
}

impl NearestResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

/// A road-network point returned by the Nearest service.
#[derive(Debug, Deserialize)]
pub struct NearestWaypoint {
    /// `[lng, lat]` of the snapped point.
    pub location: Vec<f64>,
    /// Street name, possibly empty.
    #[serde(default)]
    pub name: String,
}

/// Build the error returned for a non-`"Ok"` status.
pub fn service_error(code: String, message: Option<String>) -> MapServiceError {
    MapServiceError::ServiceError {
        code,
        message: message.unwrap_or_default(),
    }
}

/// Convert OSRM seconds and metres into a [`Distance`], truncating both.
///
/// # Errors
/// Returns [`MapServiceError::Parse`] for negative or non-finite values.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are finite and non-negative; truncation to whole units is intended"
)]
pub fn truncated_distance(seconds: f64, meters: f64) -> Result<Distance, MapServiceError> {
    if !(seconds.is_finite() && meters.is_finite()) || seconds < 0.0 || meters < 0.0 {
        return Err(MapServiceError::parse(format!(
            "invalid OSRM annotation: {seconds}s / {meters}m"
        )));
    }
    Ok(Distance::new(
        Duration::from_secs(seconds.trunc() as u64),
        meters.trunc() as i64,
    ))
}

/// Convert a GeoJSON `[lng, lat]` position.
///
/// # Errors
/// Returns [`MapServiceError::Parse`] unless the position has exactly two
/// components.
pub fn lng_lat(position: &[f64]) -> Result<LatLng, MapServiceError> {
    match position {
        [lng, lat] => Ok(LatLng::new(*lat, *lng)),
        other => Err(MapServiceError::parse(format!(
            "cannot parse coordinate with {} components",
            other.len()
        ))),
    }
}
