//! Routing backends implementing [`waymark_core::MapService`].
//!
//! - [`OsrmService`]: a self-hosted OSRM instance, one GET per call.
//! - [`GoogleMapsService`]: Google Maps behind any [`RoutesClient`]
//!   transport, with tiling, throttling and concurrent fan-out.
//!
//! Every adapter converts provider failures into
//! [`waymark_core::MapServiceError`] and never retries.

pub mod google;
mod http;
mod osrm;
pub mod polyline;

pub use self::google::{
    DirectionsPathClient, GoogleMapsService, LegacyMapsApiClient, LegacyMapsApiConfig,
    PathDistanceMatrixClient, RoutesApiGrpcClient, RoutesApiGrpcConfig, RoutesApiHttpClient,
    RoutesApiHttpConfig, RoutesClient,
};
pub use self::http::{DEFAULT_USER_AGENT, ProviderBuildError};
pub use self::osrm::{OsrmService, OsrmServiceConfig};
