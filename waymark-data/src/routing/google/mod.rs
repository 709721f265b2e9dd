//! Google Maps backends.
//!
//! Three transports share one service: the Routes API over REST
//! ([`RoutesApiHttpClient`]), the Routes API over gRPC
//! ([`RoutesApiGrpcClient`]) and the legacy Distance Matrix / Directions JSON
//! API ([`LegacyMapsApiClient`]). Each transport only knows how to send one
//! provider-compliant request. [`GoogleMapsService`] owns everything above
//! that: tiling oversized requests, pacing them through the throttlers,
//! fanning them out concurrently and merging the results.

mod legacy;
mod proto;
mod routes_api;
mod routes_grpc;
mod routes_http;
mod routes_json;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use log::{debug, warn};
use waymark_core::metrics::{
    self, DISTANCE_MATRIX_MEASUREMENT, GET_ROUTE_MEASUREMENT, MATRIX_TYPE_PATH, MATRIX_TYPE_RECT,
    MATRIX_TYPE_TAG,
};
use waymark_core::tiling::{distance_matrix_requests, path_distance_matrix_requests};
use waymark_core::{
    DirectionsRequest, DistanceMatrix, DistanceMatrixRequest, LatLng, LogScope, MapService,
    MapServiceError, MapsLimits, PathDistanceMatrixRequest, RequestContext, Route, Scope,
    ThrottledResource, Throttler,
};

pub use self::legacy::{LegacyMapsApiClient, LegacyMapsApiConfig};
pub use self::routes_api::{ROUTES_API_BASE_URL, first_route, path_matrix_from_legs};
pub use self::routes_grpc::{RoutesApiGrpcClient, RoutesApiGrpcConfig};
pub use self::routes_http::{RoutesApiHttpClient, RoutesApiHttpConfig};
pub use self::routes_json::parse_duration;

/// Probe point for health checks, in central Denver.
const HEALTH_PROBE: LatLng = LatLng::from_e6(39_770_813, -104_969_438);

/// One Google transport answering single, already-tiled requests.
#[async_trait]
pub trait RoutesClient: Send + Sync {
    /// Distances for one matrix tile. Implementations zero the diagonal.
    async fn distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &DistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError>;

    /// Candidate routes through the request's waypoints, best first.
    async fn directions(
        &self,
        ctx: &RequestContext,
        request: &DirectionsRequest,
    ) -> Result<Vec<Route>, MapServiceError>;
}

/// Leg distances for one path window.
#[async_trait]
pub trait PathDistanceMatrixClient: Send + Sync {
    /// One cell per consecutive pair of the window, diagonal zeroed.
    async fn path_distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &PathDistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError>;
}

/// Answers path windows with a directions call and reads the legs back.
///
/// Used for transports without a leg-only request, such as the legacy API.
#[derive(Clone)]
pub struct DirectionsPathClient {
    routes: Arc<dyn RoutesClient>,
}

impl fmt::Debug for DirectionsPathClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectionsPathClient").finish_non_exhaustive()
    }
}

impl DirectionsPathClient {
    /// Wrap a transport.
    #[must_use]
    pub fn new(routes: Arc<dyn RoutesClient>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl PathDistanceMatrixClient for DirectionsPathClient {
    async fn path_distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &PathDistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        if request.path.len() < 2 {
            return Ok(DistanceMatrix::new());
        }
        let (Some(origin), Some(destination)) = (request.origin(), request.destination()) else {
            return Ok(DistanceMatrix::new());
        };
        let directions = DirectionsRequest {
            origin,
            destination,
            intermediates: request.intermediates().to_vec(),
        };
        let routes = self.routes.directions(ctx, &directions).await?;
        let legs = routes.into_iter().map(|route| route.legs).collect();
        path_matrix_from_legs(&request.path, legs)
    }
}

/// A Google transport composed with tiling, throttling and fan-out.
///
/// Rectangular matrices are tiled to fit `limits`, every tile waits on the
/// matrix throttler for one request and `m × n` elements, and all tiles run
/// concurrently under a shared child context: the first failing tile cancels
/// the rest and its error is the only one returned. Paths are split into
/// overlapping windows that wait on the route throttler for one request and
/// one element per leg. Throttlers start unlimited.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use waymark_core::{ApiKeyPicker, MapsLimits, ThrottledResource, Throttler};
/// use waymark_data::routing::{GoogleMapsService, RoutesApiHttpClient};
///
/// # fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = Arc::new(ApiKeyPicker::new(vec!["key".to_owned()]));
/// let client = Arc::new(RoutesApiHttpClient::new(keys)?);
/// let limits = MapsLimits::ROUTES_TRAFFIC_AWARE;
/// let service = GoogleMapsService::new(client.clone(), client, 2, limits)
///     .with_matrix_throttler(Throttler::for_limits(10, 1_000, &limits, ThrottledResource::Matrix));
/// # let _ = service;
/// # Ok(())
/// # }
/// ```
pub struct GoogleMapsService {
    routes: Arc<dyn RoutesClient>,
    paths: Arc<dyn PathDistanceMatrixClient>,
    distance_source_id: i64,
    limits: MapsLimits,
    matrix_throttler: Arc<Throttler>,
    route_throttler: Arc<Throttler>,
    scope: Arc<dyn Scope>,
}

impl fmt::Debug for GoogleMapsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleMapsService")
            .field("distance_source_id", &self.distance_source_id)
            .field("limits", &self.limits)
            .field("matrix_throttler", &self.matrix_throttler)
            .field("route_throttler", &self.route_throttler)
            .finish_non_exhaustive()
    }
}

impl GoogleMapsService {
    /// Compose a service from a transport for matrices and routes and one for
    /// path windows.
    #[must_use]
    pub fn new(
        routes: Arc<dyn RoutesClient>,
        paths: Arc<dyn PathDistanceMatrixClient>,
        distance_source_id: i64,
        limits: MapsLimits,
    ) -> Self {
        Self {
            routes,
            paths,
            distance_source_id,
            limits,
            matrix_throttler: Arc::new(Throttler::unlimited(ThrottledResource::Matrix)),
            route_throttler: Arc::new(Throttler::unlimited(ThrottledResource::Route)),
            scope: Arc::new(LogScope::new()),
        }
    }

    /// Pace matrix tiles through `throttler`.
    #[must_use]
    pub fn with_matrix_throttler(mut self, throttler: Throttler) -> Self {
        self.matrix_throttler = Arc::new(throttler);
        self
    }

    /// Pace path windows and route calls through `throttler`.
    #[must_use]
    pub fn with_route_throttler(mut self, throttler: Throttler) -> Self {
        self.route_throttler = Arc::new(throttler);
        self
    }

    /// Write call metrics to `scope` instead of the log.
    #[must_use]
    pub fn with_scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scope = scope;
        self
    }

    /// Quotas this service tiles against.
    #[must_use]
    pub const fn limits(&self) -> &MapsLimits {
        &self.limits
    }

    fn call_scope(
        &self,
        ctx: &RequestContext,
        matrix_type: Option<&str>,
        requests: usize,
        elements: usize,
    ) -> Arc<dyn Scope> {
        let mut tags = ctx.tags().clone();
        if let Some(matrix_type) = matrix_type {
            tags.insert(MATRIX_TYPE_TAG.to_owned(), matrix_type.to_owned());
        }
        self.scope
            .with("", &tags, &metrics::size_fields(requests, elements))
    }

    async fn tiled_matrix(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        tiles: Vec<DistanceMatrixRequest>,
    ) -> Result<DistanceMatrix, MapServiceError> {
        let partials = fan_out_with(
            ctx,
            tiles,
            &self.routes,
            &self.matrix_throttler,
            |routes, task_ctx, tile| async move { routes.distance_matrix(&task_ctx, &tile).await },
        )
        .await?;
        let mut matrix = DistanceMatrix::with_origins(origins);
        for partial in partials {
            matrix.absorb(partial);
        }
        Ok(matrix.with_zero_diagonal())
    }

    async fn windowed_path(
        &self,
        ctx: &RequestContext,
        windows: Vec<PathDistanceMatrixRequest>,
    ) -> Result<DistanceMatrix, MapServiceError> {
        let partials = fan_out_with(
            ctx,
            windows,
            &self.paths,
            &self.route_throttler,
            |paths, task_ctx, window| async move {
                paths.path_distance_matrix(&task_ctx, &window).await
            },
        )
        .await?;
        Ok(DistanceMatrix::merge(partials).with_zero_diagonal())
    }

    async fn route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError> {
        let request = DirectionsRequest::for_waypoints(waypoints, &self.limits)?;
        self.route_throttler.wait(ctx, request.legs()).await?;
        let routes = ctx.run(self.routes.directions(ctx, &request)).await??;
        first_route(routes)
    }
}

/// Requests that know how many throttler elements they consume.
trait ThrottledRequest {
    fn elements(&self) -> usize;
}

impl ThrottledRequest for DistanceMatrixRequest {
    fn elements(&self) -> usize {
        self.size()
    }
}

impl ThrottledRequest for PathDistanceMatrixRequest {
    fn elements(&self) -> usize {
        self.legs()
    }
}

/// Throttle and send every request concurrently through `client`.
async fn fan_out_with<C, R, F, Fut>(
    ctx: &RequestContext,
    requests: Vec<R>,
    client: &Arc<C>,
    throttler: &Arc<Throttler>,
    call: F,
) -> Result<Vec<DistanceMatrix>, MapServiceError>
where
    C: ?Sized + Send + Sync + 'static,
    R: ThrottledRequest + Send + 'static,
    F: Fn(Arc<C>, RequestContext, R) -> Fut + Copy + Send + 'static,
    Fut: Future<Output = Result<DistanceMatrix, MapServiceError>> + Send + 'static,
{
    waymark_core::fan_out(ctx, requests, |task_ctx, request| {
        let client = Arc::clone(client);
        let throttler = Arc::clone(throttler);
        async move {
            throttler.wait(&task_ctx, request.elements()).await?;
            call(client, task_ctx, request).await
        }
    })
    .await
}

#[async_trait]
impl MapService for GoogleMapsService {
    async fn get_distance_matrix(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        let started = Instant::now();
        let tiles: Vec<DistanceMatrixRequest> =
            distance_matrix_requests(origins, destinations, &self.limits)
                .into_iter()
                .map(|tiled| tiled.request)
                .collect();
        debug!(
            "Google matrix {}x{} in {} tiles",
            origins.len(),
            destinations.len(),
            tiles.len()
        );
        let scope = self.call_scope(
            ctx,
            Some(MATRIX_TYPE_RECT),
            tiles.len(),
            origins.len() * destinations.len(),
        );
        let result = self.tiled_matrix(ctx, origins, tiles).await;
        metrics::record_outcome(scope.as_ref(), DISTANCE_MATRIX_MEASUREMENT, started, &result);
        result
    }

    async fn get_path_distance_matrix(
        &self,
        ctx: &RequestContext,
        path: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        let windows = path_distance_matrix_requests(path, &self.limits);
        if windows.is_empty() {
            return Ok(DistanceMatrix::new());
        }
        let started = Instant::now();
        let scope = self.call_scope(
            ctx,
            Some(MATRIX_TYPE_PATH),
            windows.len(),
            path.len().saturating_sub(1),
        );
        let result = self.windowed_path(ctx, windows).await;
        metrics::record_outcome(scope.as_ref(), DISTANCE_MATRIX_MEASUREMENT, started, &result);
        result
    }

    async fn get_route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError> {
        let started = Instant::now();
        let scope = self.call_scope(ctx, None, 1, waypoints.len().saturating_sub(1));
        let result = self.route(ctx, waypoints).await;
        metrics::record_outcome(scope.as_ref(), GET_ROUTE_MEASUREMENT, started, &result);
        result
    }

    fn distance_source_id(&self) -> i64 {
        self.distance_source_id
    }

    async fn is_healthy(&self, ctx: &RequestContext) -> bool {
        let probe = [HEALTH_PROBE];
        match self.get_distance_matrix(ctx, &probe, &probe).await {
            Ok(_) => true,
            Err(err) => {
                warn!("Google health probe failed: {err}");
                false
            }
        }
    }
}
