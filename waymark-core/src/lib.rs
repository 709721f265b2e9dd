//! Core domain types for the Waymark distance layer.
//!
//! Waymark sits between a dispatch optimiser and the routing backends that
//! answer "how far, how long" questions. This crate holds everything that
//! does not talk to the network:
//!
//! - fixed-point coordinates, distances, distance matrices and routes;
//! - provider limits and the tiling engine that splits oversized requests;
//! - the two-dimensional [`Throttler`] and the [`ApiKeyPicker`];
//! - the [`fan_out`] executor that issues tiles concurrently and merges them;
//! - the [`MapService`] capability trait and the region-aware
//!   [`MapServicePicker`].
//!
//! Provider adapters live in `waymark-data`.

mod api_key;
mod context;
mod coordinate;
mod distance;
mod error;
mod fanout;
mod limits;
mod map_service;
pub mod metrics;
mod picker;
mod request;
mod route;
mod settings;
mod throttle;
pub mod tiling;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use api_key::ApiKeyPicker;
pub use context::{ContextError, RequestContext};
pub use coordinate::{E6, LatLng};
pub use distance::{Distance, DistanceMatrix, DistanceRow};
pub use error::{MapServiceError, ThrottleDimension, ThrottledResource};
pub use fanout::fan_out;
pub use limits::{LimitsError, MapsLimits, RouteModifiers, RoutingPreference};
pub use map_service::{MapService, NearestWaypointService};
pub use metrics::{FieldValue, Fields, LogScope, NoopScope, Scope, Tags};
pub use picker::MapServicePicker;
pub use request::{DirectionsRequest, DistanceMatrixRequest, PathDistanceMatrixRequest};
pub use route::{Route, RoutePolyline};
pub use settings::{RegionSettings, SettingsError, SettingsService};
pub use throttle::{ThrottleConfig, Throttler};
pub use tiling::{MatrixTile, TiledRequest};
