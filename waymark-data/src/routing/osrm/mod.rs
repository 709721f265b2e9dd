//! Self-hosted OSRM backend.
//!
//! [`OsrmService`] answers every [`MapService`] call with a single HTTP GET:
//! matrices through the Table service with explicit `sources` and
//! `destinations` index ranges, paths and routes through the Route service,
//! and snapping through the Nearest service. OSRM has no request quotas, so
//! nothing here is tiled or throttled.

mod response;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use waymark_core::metrics::{
    self, DISTANCE_MATRIX_MEASUREMENT, ELEMENTS_FIELD, GET_ROUTE_MEASUREMENT, MATRIX_TYPE_PATH,
    MATRIX_TYPE_RECT, MATRIX_TYPE_TAG,
};
use waymark_core::{
    Distance, DistanceMatrix, FieldValue, Fields, LatLng, LogScope, MapService, MapServiceError,
    NearestWaypointService, RequestContext, Route, Scope,
};

use self::response::{
    NearestResponse, RouteResponse, TableResponse, lng_lat, service_error, truncated_distance,
};
use super::http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client};

/// Endpoints of the fixed route used as a health probe.
const HEALTH_PROBE: [LatLng; 2] = [
    LatLng::from_e6(39_561_763, -105_161_387),
    LatLng::from_e6(39_986_717, -104_743_106),
];

/// Configuration for [`OsrmService`].
#[derive(Debug, Clone)]
pub struct OsrmServiceConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Identifier stamped on distances from this backend.
    pub distance_source_id: i64,
}

impl Default for OsrmServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            distance_source_id: 0,
        }
    }
}

impl OsrmServiceConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the distance source identifier.
    #[must_use]
    pub const fn with_distance_source_id(mut self, distance_source_id: i64) -> Self {
        self.distance_source_id = distance_source_id;
        self
    }
}

/// [`MapService`] backed by a self-hosted OSRM instance.
///
/// # Example
///
/// ```no_run
/// use waymark_core::{LatLng, MapService, RequestContext};
/// use waymark_data::routing::{OsrmService, OsrmServiceConfig};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let osrm = OsrmService::with_config(
///     OsrmServiceConfig::new("http://localhost:5000").with_distance_source_id(1),
/// )?;
/// let points = [LatLng::new(39.74, -104.99), LatLng::new(39.77, -104.97)];
/// let matrix = osrm
///     .get_distance_matrix(&RequestContext::new(), &points, &points)
///     .await?;
/// assert_eq!(matrix.cell_count(), 4);
/// # Ok(())
/// # }
/// ```
pub struct OsrmService {
    client: Client,
    config: OsrmServiceConfig,
    scope: Arc<dyn Scope>,
}

impl fmt::Debug for OsrmService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsrmService")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("scope", &"<dyn Scope>")
            .finish()
    }
}

impl OsrmService {
    /// Create a new service with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmServiceConfig::new(base_url))
    }

    /// Create a new service with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: OsrmServiceConfig) -> Result<Self, ProviderBuildError> {
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            config,
            scope: Arc::new(LogScope::new()),
        })
    }

    /// Send measurement points to `scope` instead of the log.
    #[must_use]
    pub fn with_scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scope = scope;
        self
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Table service URL for `origins × destinations`.
    ///
    /// Origins and destinations are sent as one coordinate list; `sources`
    /// selects the first `origins.len()` entries and `destinations` the rest.
    fn table_url(&self, origins: &[LatLng], destinations: &[LatLng]) -> String {
        let coords = coordinate_list(origins.iter().chain(destinations));
        let split = origins.len();
        format!(
            "{}/table/v1/driving/{coords}?annotations=distance,duration&skip_waypoints=true&sources={}&destinations={}",
            self.base_url(),
            index_range(0, split),
            index_range(split, split + destinations.len()),
        )
    }

    /// Route service URL through `waypoints` with GeoJSON geometry.
    fn route_url(&self, waypoints: &[LatLng]) -> String {
        format!(
            "{}/route/v1/driving/{}?geometries=geojson",
            self.base_url(),
            coordinate_list(waypoints.iter())
        )
    }

    /// Nearest service URL for a single location.
    fn nearest_url(&self, location: LatLng) -> String {
        format!(
            "{}/nearest/v1/driving/{}?number=1",
            self.base_url(),
            location.osrm_coordinate()
        )
    }

    async fn fetch_route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<RouteResponse, MapServiceError> {
        let url = self.route_url(waypoints);
        debug!("requesting OSRM route through {} waypoints", waypoints.len());
        let response: RouteResponse = super::http::send_json(ctx, self.client.get(&url)).await?;
        if !response.is_ok() {
            warn!("OSRM route request rejected with {}", response.code);
            return Err(service_error(response.code, response.message));
        }
        Ok(response)
    }

    async fn table(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        let url = self.table_url(origins, destinations);
        debug!(
            "requesting OSRM table for {}x{} coordinates",
            origins.len(),
            destinations.len()
        );
        let response: TableResponse = super::http::send_json(ctx, self.client.get(&url)).await?;
        if !response.is_ok() {
            warn!("OSRM table request rejected with {}", response.code);
            return Err(service_error(response.code, response.message));
        }
        let durations = response
            .durations
            .ok_or_else(|| MapServiceError::parse("OSRM response missing durations array"))?;
        let distances = response
            .distances
            .ok_or_else(|| MapServiceError::parse("OSRM response missing distances array"))?;
        check_shape(&durations, origins.len(), destinations.len())?;
        check_shape(&distances, origins.len(), destinations.len())?;

        let mut matrix = DistanceMatrix::with_origins(origins);
        for ((origin, duration_row), distance_row) in origins.iter().zip(&durations).zip(&distances)
        {
            for ((destination, seconds), meters) in
                destinations.iter().zip(duration_row).zip(distance_row)
            {
                let (Some(seconds), Some(meters)) = (seconds, meters) else {
                    return Err(MapServiceError::UnreachablePair {
                        origin: *origin,
                        destination: *destination,
                    });
                };
                matrix.insert(*origin, *destination, truncated_distance(*seconds, *meters)?);
            }
        }
        Ok(matrix.with_zero_diagonal())
    }

    async fn path(
        &self,
        ctx: &RequestContext,
        path: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        let response = self.fetch_route(ctx, path).await?;
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(MapServiceError::NoRoutes)?;
        let expected = path.len() - 1;
        if route.legs.len() != expected {
            warn!(
                "OSRM returned {} legs for a {}-point path",
                route.legs.len(),
                path.len()
            );
            return Err(MapServiceError::UnexpectedLegCount {
                expected,
                got: route.legs.len(),
            });
        }

        let mut matrix = DistanceMatrix::new();
        for (pair, leg) in path.windows(2).zip(&route.legs) {
            if let [from, to] = pair {
                matrix.insert(*from, *to, truncated_distance(leg.duration, leg.distance)?);
            }
        }
        Ok(matrix.with_zero_diagonal())
    }

    async fn route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError> {
        if waypoints.len() < 2 {
            return Err(MapServiceError::NotEnoughWaypoints {
                min: 2,
                got: waypoints.len(),
            });
        }
        let response = self.fetch_route(ctx, waypoints).await?;
        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(MapServiceError::NoRoutes)?;
        let polyline = route
            .geometry
            .coordinates
            .iter()
            .map(|position| lng_lat(position))
            .collect::<Result<Vec<_>, _>>()?;
        let legs = route
            .legs
            .iter()
            .map(|leg| truncated_distance(leg.duration, leg.distance))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Route::new(
            polyline,
            truncated_distance(route.duration, route.distance)?,
            legs,
        ))
    }

    fn matrix_scope(&self, ctx: &RequestContext, matrix_type: &str, elements: usize) -> Arc<dyn Scope> {
        let mut tags = ctx.tags().clone();
        tags.insert(MATRIX_TYPE_TAG.to_owned(), matrix_type.to_owned());
        self.scope
            .with("", &tags, &metrics::size_fields(1, elements))
    }
}

#[async_trait]
impl MapService for OsrmService {
    async fn get_distance_matrix(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(DistanceMatrix::new());
        }
        if let ([origin], [destination]) = (origins, destinations)
            && origin == destination
        {
            return Ok([(*origin, *origin, Distance::ZERO)].into_iter().collect());
        }

        let started = Instant::now();
        let scope = self.matrix_scope(ctx, MATRIX_TYPE_RECT, origins.len() * destinations.len());
        let result = self.table(ctx, origins, destinations).await;
        metrics::record_outcome(scope.as_ref(), DISTANCE_MATRIX_MEASUREMENT, started, &result);
        result
    }

    async fn get_path_distance_matrix(
        &self,
        ctx: &RequestContext,
        path: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        if path.len() <= 1 {
            return Ok(DistanceMatrix::new());
        }

        let started = Instant::now();
        let scope = self.matrix_scope(ctx, MATRIX_TYPE_PATH, path.len() - 1);
        let result = self.path(ctx, path).await;
        metrics::record_outcome(scope.as_ref(), DISTANCE_MATRIX_MEASUREMENT, started, &result);
        result
    }

    async fn get_route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError> {
        let started = Instant::now();
        let fields = Fields::from([(
            ELEMENTS_FIELD.to_owned(),
            FieldValue::from(waypoints.len().saturating_sub(1)),
        )]);
        let scope = self.scope.with("", ctx.tags(), &fields);
        let result = self.route(ctx, waypoints).await;
        metrics::record_outcome(scope.as_ref(), GET_ROUTE_MEASUREMENT, started, &result);
        result
    }

    fn distance_source_id(&self) -> i64 {
        self.config.distance_source_id
    }

    async fn is_healthy(&self, ctx: &RequestContext) -> bool {
        let url = self.route_url(&HEALTH_PROBE);
        match ctx.run(self.client.get(&url).send()).await {
            Ok(Ok(response)) if response.status() == reqwest::StatusCode::OK => true,
            Ok(Ok(response)) => {
                warn!("OSRM health probe answered {}", response.status());
                false
            }
            Ok(Err(err)) => {
                warn!("OSRM health probe failed: {err}");
                false
            }
            Err(cause) => {
                warn!("OSRM health probe aborted: {cause}");
                false
            }
        }
    }
}

#[async_trait]
impl NearestWaypointService for OsrmService {
    async fn nearest_waypoint(
        &self,
        ctx: &RequestContext,
        location: LatLng,
    ) -> Result<LatLng, MapServiceError> {
        let url = self.nearest_url(location);
        let response: NearestResponse = super::http::send_json(ctx, self.client.get(&url)).await?;
        if !response.is_ok() {
            return Err(service_error(response.code, response.message));
        }
        let waypoint = response
            .waypoints
            .first()
            .ok_or(MapServiceError::NoWaypoints)?;
        lng_lat(&waypoint.location)
    }
}

/// `lng,lat;lng,lat;...` for the OSRM path segment.
fn coordinate_list<'a>(coordinates: impl Iterator<Item = &'a LatLng>) -> String {
    coordinates
        .map(|ll| ll.osrm_coordinate())
        .collect::<Vec<_>>()
        .join(";")
}

/// `start;start+1;...;end-1` for the `sources`/`destinations` parameters.
fn index_range(start: usize, end: usize) -> String {
    (start..end)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

fn check_shape<T>(rows: &[Vec<T>], expected_rows: usize, expected_columns: usize) -> Result<(), MapServiceError> {
    let bad_row = rows.iter().find(|row| row.len() != expected_columns);
    if rows.len() != expected_rows || bad_row.is_some() {
        warn!("OSRM table shape does not match the {expected_rows}x{expected_columns} request");
        return Err(MapServiceError::UnexpectedMatrixShape {
            expected_rows,
            expected_columns,
            rows: rows.len(),
            columns: bad_row.or(rows.first()).map_or(0, Vec::len),
        });
    }
    Ok(())
}
