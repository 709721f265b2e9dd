//! Capability contract implemented by every routing backend.

use async_trait::async_trait;

use crate::{DistanceMatrix, LatLng, MapServiceError, RequestContext, Route};

/// One routing backend, fixed at start-up.
///
/// Every matrix returned satisfies `matrix[x][x] == Distance::ZERO` for each
/// coordinate `x` present as both origin and destination.
#[async_trait]
pub trait MapService: Send + Sync {
    /// Distances for every origin × destination pair.
    async fn get_distance_matrix(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError>;

    /// Distances for each consecutive leg `path[i] → path[i + 1]` only.
    async fn get_path_distance_matrix(
        &self,
        ctx: &RequestContext,
        path: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError>;

    /// A route through `waypoints` in order.
    async fn get_route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError>;

    /// Stable identifier of this backend's distances.
    fn distance_source_id(&self) -> i64;

    /// One cheap round trip to the backend.
    async fn is_healthy(&self, ctx: &RequestContext) -> bool;
}

/// Snapping to the road network.
#[async_trait]
pub trait NearestWaypointService: Send + Sync {
    /// The road-network point closest to `location`.
    async fn nearest_waypoint(
        &self,
        ctx: &RequestContext,
        location: LatLng,
    ) -> Result<LatLng, MapServiceError>;
}
