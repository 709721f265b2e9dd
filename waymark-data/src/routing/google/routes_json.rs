//! Protobuf-JSON bodies of the Routes API REST surface.
//!
//! Field names follow the proto3 JSON mapping: camelCase keys, enum names as
//! strings, `google.protobuf.Duration` as a decimal string with an `s`
//! suffix, and default values omitted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use waymark_core::{
    DirectionsRequest, Distance, DistanceMatrixRequest, LatLng, MapServiceError,
    PathDistanceMatrixRequest, Route, RouteModifiers, RoutingPreference,
};

use super::routes_api::MatrixElement;
use crate::routing::polyline;

const TRAVEL_MODE_DRIVE: &str = "DRIVE";
const UNITS_METRIC: &str = "METRIC";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LatLngBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationBody {
    lat_lng: LatLngBody,
}

/// `google.maps.routing.v2.Waypoint` located by coordinate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointBody {
    location: LocationBody,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    vehicle_stopover: bool,
}

impl WaypointBody {
    fn at(point: LatLng) -> Self {
        Self {
            location: LocationBody {
                lat_lng: LatLngBody {
                    latitude: point.latitude(),
                    longitude: point.longitude(),
                },
            },
            vehicle_stopover: false,
        }
    }

    fn stopover(point: LatLng) -> Self {
        Self {
            vehicle_stopover: true,
            ..Self::at(point)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteModifiersBody {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    avoid_tolls: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    avoid_highways: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    avoid_ferries: bool,
}

impl From<RouteModifiers> for RouteModifiersBody {
    fn from(value: RouteModifiers) -> Self {
        Self {
            avoid_tolls: value.avoid_tolls,
            avoid_highways: value.avoid_highways,
            avoid_ferries: value.avoid_ferries,
        }
    }
}

fn preference(value: RoutingPreference) -> Option<&'static str> {
    (value != RoutingPreference::Unspecified).then(|| value.as_str())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteMatrixOriginBody {
    waypoint: WaypointBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_modifiers: Option<RouteModifiersBody>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteMatrixDestinationBody {
    waypoint: WaypointBody,
}

/// Body of `distanceMatrix/v2:computeRouteMatrix`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRouteMatrixBody {
    origins: Vec<RouteMatrixOriginBody>,
    destinations: Vec<RouteMatrixDestinationBody>,
    travel_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_preference: Option<&'static str>,
}

impl From<&DistanceMatrixRequest> for ComputeRouteMatrixBody {
    fn from(request: &DistanceMatrixRequest) -> Self {
        Self {
            origins: request
                .origins
                .iter()
                .map(|origin| RouteMatrixOriginBody {
                    waypoint: WaypointBody::at(*origin),
                    route_modifiers: request.route_modifiers.map(RouteModifiersBody::from),
                })
                .collect(),
            destinations: request
                .destinations
                .iter()
                .map(|destination| RouteMatrixDestinationBody {
                    waypoint: WaypointBody::at(*destination),
                })
                .collect(),
            travel_mode: TRAVEL_MODE_DRIVE,
            routing_preference: preference(request.routing_preference),
        }
    }
}

/// Body of `directions/v2:computeRoutes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRoutesBody {
    origin: WaypointBody,
    destination: WaypointBody,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    intermediates: Vec<WaypointBody>,
    travel_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_preference: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_modifiers: Option<RouteModifiersBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<&'static str>,
}

impl From<&DirectionsRequest> for ComputeRoutesBody {
    fn from(request: &DirectionsRequest) -> Self {
        Self {
            origin: WaypointBody::at(request.origin),
            destination: WaypointBody::at(request.destination),
            intermediates: request
                .intermediates
                .iter()
                .copied()
                .map(WaypointBody::stopover)
                .collect(),
            travel_mode: TRAVEL_MODE_DRIVE,
            routing_preference: None,
            route_modifiers: None,
            units: Some(UNITS_METRIC),
        }
    }
}

impl ComputeRoutesBody {
    /// Body for a path window, or `None` when the window has fewer than two
    /// waypoints.
    pub fn for_path(request: &PathDistanceMatrixRequest) -> Option<Self> {
        if request.path.len() < 2 {
            return None;
        }
        Some(Self {
            origin: WaypointBody::at(request.origin()?),
            destination: WaypointBody::at(request.destination()?),
            intermediates: request
                .intermediates()
                .iter()
                .copied()
                .map(WaypointBody::stopover)
                .collect(),
            travel_mode: TRAVEL_MODE_DRIVE,
            routing_preference: preference(request.routing_preference),
            route_modifiers: request.route_modifiers.map(RouteModifiersBody::from),
            units: None,
        })
    }
}

/// `google.rpc.Status` as it appears inside matrix elements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusJson {
    /// Status code, `0` when omitted.
    #[serde(default)]
    pub code: i32,
    /// Status message.
    #[serde(default)]
    pub message: String,
}

/// One element of a `computeRouteMatrix` response array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatrixElementJson {
    /// Omitted when zero.
    #[serde(default)]
    pub origin_index: i64,
    /// Omitted when zero.
    #[serde(default)]
    pub destination_index: i64,
    /// Omitted when OK.
    #[serde(default)]
    pub status: StatusJson,
    /// Omitted when unspecified.
    #[serde(default)]
    pub condition: Option<String>,
    /// Omitted when zero.
    #[serde(default)]
    pub distance_meters: i64,
    /// Omitted when zero.
    #[serde(default)]
    pub duration: Option<String>,
}

impl TryFrom<RouteMatrixElementJson> for MatrixElement {
    type Error = MapServiceError;

    fn try_from(value: RouteMatrixElementJson) -> Result<Self, Self::Error> {
        let duration = value
            .duration
            .as_deref()
            .map(parse_duration)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            origin_index: value.origin_index,
            destination_index: value.destination_index,
            status_code: value.status.code,
            status_message: value.status.message,
            condition: value
                .condition
                .unwrap_or_else(|| "ROUTE_MATRIX_ELEMENT_CONDITION_UNSPECIFIED".to_owned()),
            distance: Distance::new(duration, value.distance_meters),
        })
    }
}

/// `computeRoutes` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputeRoutesJson {
    /// Candidate routes, best first. Omitted when empty.
    #[serde(default)]
    pub routes: Vec<RouteJson>,
}

/// One route of a `computeRoutes` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteJson {
    #[serde(default)]
    legs: Vec<RouteLegJson>,
    #[serde(default)]
    distance_meters: i64,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    polyline: Option<PolylineJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolylineJson {
    #[serde(default)]
    encoded_polyline: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteLegJson {
    #[serde(default)]
    distance_meters: i64,
    #[serde(default)]
    duration: Option<String>,
}

fn optional_duration(value: Option<&str>) -> Result<Duration, MapServiceError> {
    value.map(parse_duration).transpose().map(Option::unwrap_or_default)
}

impl RouteJson {
    /// Leg distances at full precision.
    ///
    /// # Errors
    /// Returns [`MapServiceError::Parse`] for a malformed duration.
    pub fn leg_distances(&self) -> Result<Vec<Distance>, MapServiceError> {
        self.legs
            .iter()
            .map(|leg| {
                optional_duration(leg.duration.as_deref())
                    .map(|duration| Distance::new(duration, leg.distance_meters))
            })
            .collect()
    }

    /// Convert into a [`Route`]. Durations are truncated to whole seconds.
    ///
    /// # Errors
    /// Returns [`MapServiceError::Parse`] for a malformed duration or
    /// polyline.
    pub fn into_route(self) -> Result<Route, MapServiceError> {
        let legs = self
            .leg_distances()?
            .into_iter()
            .map(whole_seconds)
            .collect();
        let encoded = self.polyline.map(|p| p.encoded_polyline).unwrap_or_default();
        let duration = optional_duration(self.duration.as_deref())?;
        Ok(Route::new(
            polyline::decode(&encoded)?,
            whole_seconds(Distance::new(duration, self.distance_meters)),
            legs,
        ))
    }
}

/// Drop the sub-second part of a distance's duration.
pub fn whole_seconds(distance: Distance) -> Distance {
    Distance::new(
        Duration::from_secs(distance.duration.as_secs()),
        distance.length_meters,
    )
}

/// Parse a protobuf-JSON duration such as `"160s"` or `"1.5s"`.
///
/// # Errors
/// Returns [`MapServiceError::Parse`] for anything else, including negative
/// durations.
pub fn parse_duration(value: &str) -> Result<Duration, MapServiceError> {
    let invalid = || MapServiceError::parse(format!("invalid duration {value:?}"));
    let number = value.strip_suffix('s').ok_or_else(invalid)?;
    let (seconds, fraction) = number.split_once('.').unwrap_or((number, ""));
    if seconds.is_empty()
        || fraction.len() > 9
        || !seconds.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let whole: u64 = seconds.parse().map_err(|_| invalid())?;
    let nanos = if fraction.is_empty() {
        0
    } else {
        let scale = 10_u32.pow(9 - u32::try_from(fraction.len()).map_err(|_| invalid())?);
        fraction.parse::<u32>().map_err(|_| invalid())? * scale
    };
    Ok(Duration::new(whole, nanos))
}
