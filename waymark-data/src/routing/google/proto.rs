//! Wire messages of the `google.maps.routing.v2.Routes` service.
//!
//! Only the fields this crate sends or reads are declared; prost skips
//! unknown fields when decoding. Single-member `oneof`s are declared as plain
//! optional fields, which encode identically.

/// `google.type.LatLng`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct LatLng {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
}

/// `google.maps.routing.v2.Location`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Location {
    #[prost(message, optional, tag = "1")]
    pub lat_lng: Option<LatLng>,
}

/// `google.maps.routing.v2.Waypoint`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Waypoint {
    #[prost(message, optional, tag = "1")]
    pub location: Option<Location>,
    #[prost(bool, tag = "4")]
    pub vehicle_stopover: bool,
}

/// `google.maps.routing.v2.RouteModifiers`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct RouteModifiers {
    #[prost(bool, tag = "1")]
    pub avoid_tolls: bool,
    #[prost(bool, tag = "2")]
    pub avoid_highways: bool,
    #[prost(bool, tag = "3")]
    pub avoid_ferries: bool,
}

/// `google.maps.routing.v2.RouteTravelMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RouteTravelMode {
    Unspecified = 0,
    Drive = 1,
}

/// `google.maps.routing.v2.RoutingPreference`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RoutingPreference {
    Unspecified = 0,
    TrafficUnaware = 1,
    TrafficAware = 2,
    TrafficAwareOptimal = 3,
}

/// `google.maps.routing.v2.Units`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Units {
    Unspecified = 0,
    Metric = 1,
    Imperial = 2,
}

/// `google.maps.routing.v2.RouteMatrixElementCondition`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RouteMatrixElementCondition {
    Unspecified = 0,
    RouteExists = 1,
    RouteNotFound = 2,
}

impl RouteMatrixElementCondition {
    /// Enum value name as it appears in the proto definition.
    #[must_use]
    pub const fn as_str_name(self) -> &'static str {
        match self {
            Self::Unspecified => "ROUTE_MATRIX_ELEMENT_CONDITION_UNSPECIFIED",
            Self::RouteExists => "ROUTE_EXISTS",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
        }
    }
}

/// `google.maps.routing.v2.ComputeRoutesRequest`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComputeRoutesRequest {
    #[prost(message, optional, tag = "1")]
    pub origin: Option<Waypoint>,
    #[prost(message, optional, tag = "2")]
    pub destination: Option<Waypoint>,
    #[prost(message, repeated, tag = "3")]
    pub intermediates: Vec<Waypoint>,
    #[prost(enumeration = "RouteTravelMode", tag = "4")]
    pub travel_mode: i32,
    #[prost(enumeration = "RoutingPreference", tag = "5")]
    pub routing_preference: i32,
    #[prost(bool, tag = "8")]
    pub compute_alternative_routes: bool,
    #[prost(message, optional, tag = "9")]
    pub route_modifiers: Option<RouteModifiers>,
    #[prost(enumeration = "Units", tag = "11")]
    pub units: i32,
}

/// `google.maps.routing.v2.ComputeRoutesResponse`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComputeRoutesResponse {
    #[prost(message, repeated, tag = "1")]
    pub routes: Vec<Route>,
}

/// `google.maps.routing.v2.Route`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Route {
    #[prost(message, repeated, tag = "1")]
    pub legs: Vec<RouteLeg>,
    #[prost(int32, tag = "2")]
    pub distance_meters: i32,
    #[prost(message, optional, tag = "3")]
    pub duration: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "4")]
    pub static_duration: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "5")]
    pub polyline: Option<Polyline>,
}

/// `google.maps.routing.v2.Polyline`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Polyline {
    #[prost(string, tag = "1")]
    pub encoded_polyline: String,
}

/// `google.maps.routing.v2.RouteLeg`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteLeg {
    #[prost(int32, tag = "1")]
    pub distance_meters: i32,
    #[prost(message, optional, tag = "2")]
    pub duration: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "3")]
    pub static_duration: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "5")]
    pub start_location: Option<Location>,
    #[prost(message, optional, tag = "6")]
    pub end_location: Option<Location>,
}

/// `google.maps.routing.v2.ComputeRouteMatrixRequest`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComputeRouteMatrixRequest {
    #[prost(message, repeated, tag = "1")]
    pub origins: Vec<RouteMatrixOrigin>,
    #[prost(message, repeated, tag = "2")]
    pub destinations: Vec<RouteMatrixDestination>,
    #[prost(enumeration = "RouteTravelMode", tag = "3")]
    pub travel_mode: i32,
    #[prost(enumeration = "RoutingPreference", tag = "4")]
    pub routing_preference: i32,
}

/// `google.maps.routing.v2.RouteMatrixOrigin`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct RouteMatrixOrigin {
    #[prost(message, optional, tag = "1")]
    pub waypoint: Option<Waypoint>,
    #[prost(message, optional, tag = "2")]
    pub route_modifiers: Option<RouteModifiers>,
}

/// `google.maps.routing.v2.RouteMatrixDestination`.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct RouteMatrixDestination {
    #[prost(message, optional, tag = "1")]
    pub waypoint: Option<Waypoint>,
}

/// `google.rpc.Status`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

/// `google.maps.routing.v2.RouteMatrixElement`, one per streamed message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteMatrixElement {
    #[prost(int32, optional, tag = "1")]
    pub origin_index: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub destination_index: Option<i32>,
    #[prost(message, optional, tag = "3")]
    pub status: Option<Status>,
    #[prost(int32, tag = "4")]
    pub distance_meters: i32,
    #[prost(message, optional, tag = "5")]
    pub duration: Option<::prost_types::Duration>,
    #[prost(message, optional, tag = "6")]
    pub static_duration: Option<::prost_types::Duration>,
    #[prost(enumeration = "RouteMatrixElementCondition", tag = "9")]
    pub condition: i32,
}
