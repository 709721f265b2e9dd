//! Facade crate for the Waymark distance layer.
//!
//! This crate re-exports the core domain types and, behind the `providers`
//! feature, the routing backends that implement [`MapService`].

#![forbid(unsafe_code)]

pub use waymark_core::{
    ApiKeyPicker, ContextError, Distance, DistanceMatrix, DistanceMatrixRequest, LatLng,
    LimitsError, MapService, MapServiceError, MapServicePicker, MapsLimits,
    NearestWaypointService, PathDistanceMatrixRequest, RegionSettings, RequestContext, Route,
    SettingsError, SettingsService, ThrottleConfig, ThrottledResource, Throttler, fan_out,
    metrics, tiling,
};

#[cfg(feature = "test-support")]
pub use waymark_core::test_support;

#[cfg(feature = "providers")]
pub use waymark_data::routing::{
    GoogleMapsService, LegacyMapsApiClient, OsrmService, RoutesApiGrpcClient, RoutesApiHttpClient,
};
