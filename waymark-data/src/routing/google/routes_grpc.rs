//! Routes API over gRPC.
//!
//! `ComputeRoutes` is unary; `ComputeRouteMatrix` streams one element per
//! message and the client accumulates them until the server closes the
//! stream.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::uri::PathAndQuery;
use log::debug;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use waymark_core::{
    ApiKeyPicker, DirectionsRequest, Distance, DistanceMatrix, DistanceMatrixRequest, LatLng,
    MapServiceError, PathDistanceMatrixRequest, RequestContext, Route, RouteModifiers,
    RoutingPreference,
};

use super::proto;
use super::routes_api::{
    DIRECTIONS_FIELD_MASK, DISTANCE_MATRIX_FIELD_MASK, MatrixAssembler, MatrixElement,
    PATH_DISTANCE_MATRIX_FIELD_MASK, ROUTES_API_BASE_URL, path_matrix_from_legs,
};
use super::routes_json::whole_seconds;
use super::{PathDistanceMatrixClient, RoutesClient};
use crate::routing::http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError};
use crate::routing::polyline;

const COMPUTE_ROUTES_PATH: &str = "/google.maps.routing.v2.Routes/ComputeRoutes";
const COMPUTE_ROUTE_MATRIX_PATH: &str = "/google.maps.routing.v2.Routes/ComputeRouteMatrix";

/// gRPC metadata keys are lower case.
const API_KEY_METADATA: &str = "x-goog-api-key";
const FIELD_MASK_METADATA: &str = "x-goog-fieldmask";

/// Configuration for [`RoutesApiGrpcClient`].
#[derive(Debug, Clone)]
pub struct RoutesApiGrpcConfig {
    /// Scheme and host of the Routes API. TLS is used for `https` URLs.
    pub endpoint: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// User agent string for calls.
    pub user_agent: String,
}

impl Default for RoutesApiGrpcConfig {
    fn default() -> Self {
        Self {
            endpoint: ROUTES_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl RoutesApiGrpcConfig {
    /// Create a new configuration with the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the per-call timeout.
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
}

/// Routes API client over a persistent gRPC channel.
///
/// The channel connects lazily on first use and is shared by every clone of
/// the underlying transport, so one client serves any number of concurrent
/// calls.
pub struct RoutesApiGrpcClient {
    channel: Channel,
    api_keys: Arc<ApiKeyPicker>,
}

impl fmt::Debug for RoutesApiGrpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutesApiGrpcClient")
            .field("api_keys", &self.api_keys)
            .finish_non_exhaustive()
    }
}

impl RoutesApiGrpcClient {
    /// Create a client for the production endpoint.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be configured.
    pub fn new(api_keys: Arc<ApiKeyPicker>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&RoutesApiGrpcConfig::default(), api_keys)
    }

    /// Create a client with explicit configuration.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL, TLS setup or user agent is
    /// rejected.
    pub fn with_config(
        config: &RoutesApiGrpcConfig,
        api_keys: Arc<ApiKeyPicker>,
    ) -> Result<Self, ProviderBuildError> {
        let mut endpoint = Endpoint::from_shared(config.endpoint.clone())
            .map_err(ProviderBuildError::GrpcChannel)?
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .map_err(ProviderBuildError::GrpcChannel)?;
        if config.endpoint.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_webpki_roots())
                .map_err(ProviderBuildError::GrpcChannel)?;
        }
        Ok(Self {
            channel: endpoint.connect_lazy(),
            api_keys,
        })
    }

    fn request<T>(
        &self,
        message: T,
        field_mask: &'static str,
    ) -> Result<tonic::Request<T>, MapServiceError> {
        let mut request = tonic::Request::new(message);
        let metadata = request.metadata_mut();
        metadata.insert(
            FIELD_MASK_METADATA,
            MetadataValue::from_static(field_mask),
        );
        if let Some(key) = self.api_keys.next_api_key() {
            let value = MetadataValue::try_from(key).map_err(|err| MapServiceError::Grpc {
                code: "InvalidArgument".to_owned(),
                message: format!("API key is not valid metadata: {err}"),
            })?;
            metadata.insert(API_KEY_METADATA, value);
        }
        Ok(request)
    }

    async fn ready(&self) -> Result<Grpc<Channel>, MapServiceError> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|err| MapServiceError::Network {
            message: err.to_string(),
        })?;
        Ok(grpc)
    }

    async fn compute_routes(
        &self,
        ctx: &RequestContext,
        message: proto::ComputeRoutesRequest,
        field_mask: &'static str,
    ) -> Result<proto::ComputeRoutesResponse, MapServiceError> {
        let request = self.request(message, field_mask)?;
        ctx.check()?;
        ctx.run(async {
            let mut grpc = self.ready().await?;
            let response = grpc
                .unary(
                    request,
                    PathAndQuery::from_static(COMPUTE_ROUTES_PATH),
                    ProstCodec::default(),
                )
                .await
                .map_err(grpc_error)?;
            Ok(response.into_inner())
        })
        .await?
    }
}

#[async_trait]
impl RoutesClient for RoutesApiGrpcClient {
    async fn distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &DistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        debug!(
            "ComputeRouteMatrix stream for {}x{} waypoints",
            request.origins.len(),
            request.destinations.len()
        );
        let call = self.request(matrix_message(request), DISTANCE_MATRIX_FIELD_MASK)?;
        ctx.check()?;
        ctx.run(async {
            let mut grpc = self.ready().await?;
            let mut stream = grpc
                .server_streaming(
                    call,
                    PathAndQuery::from_static(COMPUTE_ROUTE_MATRIX_PATH),
                    ProstCodec::<proto::ComputeRouteMatrixRequest, proto::RouteMatrixElement>::default(),
                )
                .await
                .map_err(grpc_error)?
                .into_inner();

            let mut matrix = MatrixAssembler::new(request);
            while let Some(element) = stream.message().await.map_err(grpc_error)? {
                matrix.add(matrix_element(element)?)?;
            }
            matrix.finish()
        })
        .await?
    }

    async fn directions(
        &self,
        ctx: &RequestContext,
        request: &DirectionsRequest,
    ) -> Result<Vec<Route>, MapServiceError> {
        let response = self
            .compute_routes(ctx, directions_message(request), DIRECTIONS_FIELD_MASK)
            .await?;
        response.routes.into_iter().map(route_from_proto).collect()
    }
}

#[async_trait]
impl PathDistanceMatrixClient for RoutesApiGrpcClient {
    async fn path_distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &PathDistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        let Some(message) = path_message(request) else {
            return Ok(DistanceMatrix::new());
        };
        let response = self
            .compute_routes(ctx, message, PATH_DISTANCE_MATRIX_FIELD_MASK)
            .await?;
        let legs = response
            .routes
            .iter()
            .map(|route| route.legs.iter().map(leg_distance).collect())
            .collect::<Result<Vec<_>, _>>()?;
        path_matrix_from_legs(&request.path, legs)
    }
}

fn grpc_error(status: tonic::Status) -> MapServiceError {
    MapServiceError::Grpc {
        code: format!("{:?}", status.code()),
        message: status.message().to_owned(),
    }
}

fn waypoint(point: LatLng, vehicle_stopover: bool) -> proto::Waypoint {
    proto::Waypoint {
        location: Some(proto::Location {
            lat_lng: Some(proto::LatLng {
                latitude: point.latitude(),
                longitude: point.longitude(),
            }),
        }),
        vehicle_stopover,
    }
}

fn stopovers(points: &[LatLng]) -> Vec<proto::Waypoint> {
    points.iter().map(|point| waypoint(*point, true)).collect()
}

fn modifiers(value: RouteModifiers) -> proto::RouteModifiers {
    proto::RouteModifiers {
        avoid_tolls: value.avoid_tolls,
        avoid_highways: value.avoid_highways,
        avoid_ferries: value.avoid_ferries,
    }
}

fn preference(value: RoutingPreference) -> i32 {
    let mapped = match value {
        RoutingPreference::Unspecified => proto::RoutingPreference::Unspecified,
        RoutingPreference::TrafficUnaware => proto::RoutingPreference::TrafficUnaware,
        RoutingPreference::TrafficAware => proto::RoutingPreference::TrafficAware,
        RoutingPreference::TrafficAwareOptimal => proto::RoutingPreference::TrafficAwareOptimal,
    };
    mapped.into()
}

fn matrix_message(request: &DistanceMatrixRequest) -> proto::ComputeRouteMatrixRequest {
    proto::ComputeRouteMatrixRequest {
        origins: request
            .origins
            .iter()
            .map(|origin| proto::RouteMatrixOrigin {
                waypoint: Some(waypoint(*origin, false)),
                route_modifiers: request.route_modifiers.map(modifiers),
            })
            .collect(),
        destinations: request
            .destinations
            .iter()
            .map(|destination| proto::RouteMatrixDestination {
                waypoint: Some(waypoint(*destination, false)),
            })
            .collect(),
        travel_mode: proto::RouteTravelMode::Drive.into(),
        routing_preference: preference(request.routing_preference),
    }
}

fn directions_message(request: &DirectionsRequest) -> proto::ComputeRoutesRequest {
    proto::ComputeRoutesRequest {
        origin: Some(waypoint(request.origin, false)),
        destination: Some(waypoint(request.destination, false)),
        intermediates: stopovers(&request.intermediates),
        travel_mode: proto::RouteTravelMode::Drive.into(),
        units: proto::Units::Metric.into(),
        ..Default::default()
    }
}

fn path_message(request: &PathDistanceMatrixRequest) -> Option<proto::ComputeRoutesRequest> {
    if request.path.len() < 2 {
        return None;
    }
    Some(proto::ComputeRoutesRequest {
        origin: Some(waypoint(request.origin()?, false)),
        destination: Some(waypoint(request.destination()?, false)),
        intermediates: stopovers(request.intermediates()),
        travel_mode: proto::RouteTravelMode::Drive.into(),
        routing_preference: preference(request.routing_preference),
        route_modifiers: request.route_modifiers.map(modifiers),
        ..Default::default()
    })
}

fn duration(value: Option<&prost_types::Duration>) -> Result<Duration, MapServiceError> {
    let Some(value) = value else {
        return Ok(Duration::ZERO);
    };
    let seconds = u64::try_from(value.seconds);
    let nanos = u32::try_from(value.nanos);
    match (seconds, nanos) {
        (Ok(seconds), Ok(nanos)) => Ok(Duration::new(seconds, nanos)),
        _ => Err(MapServiceError::parse(format!(
            "negative duration {}s {}ns",
            value.seconds, value.nanos
        ))),
    }
}

fn leg_distance(leg: &proto::RouteLeg) -> Result<Distance, MapServiceError> {
    Ok(Distance::new(
        duration(leg.duration.as_ref())?,
        i64::from(leg.distance_meters),
    ))
}

fn matrix_element(element: proto::RouteMatrixElement) -> Result<MatrixElement, MapServiceError> {
    let condition = proto::RouteMatrixElementCondition::try_from(element.condition)
        .map_or("UNKNOWN_CONDITION", proto::RouteMatrixElementCondition::as_str_name);
    let status = element.status.unwrap_or_default();
    Ok(MatrixElement {
        origin_index: i64::from(element.origin_index.unwrap_or_default()),
        destination_index: i64::from(element.destination_index.unwrap_or_default()),
        status_code: status.code,
        status_message: status.message,
        condition: condition.to_owned(),
        distance: Distance::new(
            duration(element.duration.as_ref())?,
            i64::from(element.distance_meters),
        ),
    })
}

/// Convert a proto route. Durations are truncated to whole seconds.
fn route_from_proto(route: proto::Route) -> Result<Route, MapServiceError> {
    let encoded = route
        .polyline
        .map(|p| p.encoded_polyline)
        .unwrap_or_default();
    let legs = route
        .legs
        .iter()
        .map(|leg| leg_distance(leg).map(whole_seconds))
        .collect::<Result<Vec<_>, _>>()?;
    let total = Distance::new(
        duration(route.duration.as_ref())?,
        i64::from(route.distance_meters),
    );
    Ok(Route::new(polyline::decode(&encoded)?, whole_seconds(total), legs))
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        clippy::indexing_slicing,
        reason = "tests fail fast on broken setup and index fixtures of known length"
    )]

    use super::*;
    use rstest::rstest;
    use waymark_core::MapsLimits;

    fn points(n: i32) -> Vec<LatLng> {
        (1..=n).map(|i| LatLng::from_e6(i * 1_000_000, -i * 1_000_000)).collect()
    }

    #[rstest]
    fn matrix_message_carries_limit_options() {
        let pts = points(2);
        let request =
            DistanceMatrixRequest::new(pts.clone(), pts, &MapsLimits::ROUTES_TRAFFIC_AWARE_OPTIMAL);
        let message = matrix_message(&request);
        assert_eq!(message.origins.len(), 2);
        assert_eq!(
            message.routing_preference,
            i32::from(proto::RoutingPreference::TrafficAwareOptimal)
        );
        assert_eq!(
            message.origins[0].route_modifiers,
            Some(proto::RouteModifiers {
                avoid_tolls: false,
                avoid_highways: false,
                avoid_ferries: true,
            })
        );
        assert!(message.destinations[0].waypoint.is_some());
    }

    #[rstest]
    fn path_message_marks_intermediates() {
        let request = PathDistanceMatrixRequest::new(points(4), &MapsLimits::ADVANCED);
        let message = path_message(&request).expect("four waypoints");
        assert_eq!(message.intermediates.len(), 2);
        assert!(message.intermediates.iter().all(|w| w.vehicle_stopover));
        assert!(!message.origin.is_some_and(|w| w.vehicle_stopover));
        assert!(path_message(&PathDistanceMatrixRequest::new(points(1), &MapsLimits::ADVANCED)).is_none());
    }

    #[rstest]
    fn directions_message_requests_metric_units() {
        let request = DirectionsRequest::for_waypoints(&points(2), &MapsLimits::ADVANCED)
            .expect("two waypoints");
        let message = directions_message(&request);
        assert_eq!(message.units, i32::from(proto::Units::Metric));
        assert!(message.intermediates.is_empty());
    }

    #[rstest]
    fn streamed_element_defaults_absent_indices() {
        let element = proto::RouteMatrixElement {
            destination_index: Some(1),
            condition: proto::RouteMatrixElementCondition::RouteExists.into(),
            distance_meters: 250,
            duration: Some(prost_types::Duration {
                seconds: 20,
                nanos: 500_000_000,
            }),
            ..Default::default()
        };
        let element = matrix_element(element).expect("valid");
        assert_eq!(element.origin_index, 0);
        assert_eq!(element.destination_index, 1);
        assert_eq!(element.condition, "ROUTE_EXISTS");
        assert_eq!(
            element.distance,
            Distance::new(Duration::from_millis(20_500), 250)
        );
    }

    #[rstest]
    fn route_durations_are_truncated() {
        let route = proto::Route {
            distance_meters: 1_000,
            duration: Some(prost_types::Duration {
                seconds: 70,
                nanos: 900_000_000,
            }),
            legs: vec![proto::RouteLeg {
                distance_meters: 1_000,
                duration: Some(prost_types::Duration {
                    seconds: 70,
                    nanos: 900_000_000,
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        let route = route_from_proto(route).expect("valid");
        assert_eq!(route.distance, Distance::new(Duration::from_secs(70), 1_000));
        assert_eq!(route.legs, vec![Distance::new(Duration::from_secs(70), 1_000)]);
        assert!(route.polyline.is_empty());
    }

    #[rstest]
    fn negative_durations_are_rejected() {
        let value = prost_types::Duration {
            seconds: -1,
            nanos: 0,
        };
        assert!(matches!(duration(Some(&value)), Err(MapServiceError::Parse { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_endpoint_fails_the_call() {
        let config = RoutesApiGrpcConfig::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let client = RoutesApiGrpcClient::with_config(&config, Arc::new(ApiKeyPicker::new(Vec::new())))
            .expect("client should build");
        let request = DirectionsRequest::for_waypoints(&points(2), &MapsLimits::ADVANCED)
            .expect("two waypoints");
        let err = client
            .directions(&RequestContext::new(), &request)
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(
            err,
            MapServiceError::Grpc { .. } | MapServiceError::Network { .. }
        ));
    }

    /// In-process `ComputeRouteMatrix` endpoint streaming canned elements
    /// and recording the metadata it was called with.
    #[derive(Clone)]
    struct MatrixServer {
        elements: Arc<Vec<proto::RouteMatrixElement>>,
        calls: Arc<std::sync::Mutex<Vec<(String, Option<String>)>>>,
    }

    impl tonic::server::NamedService for MatrixServer {
        const NAME: &'static str = "google.maps.routing.v2.Routes";
    }

    struct StreamElements(MatrixServer);

    impl tonic::server::ServerStreamingService<proto::ComputeRouteMatrixRequest> for StreamElements {
        type Response = proto::RouteMatrixElement;
        type ResponseStream = tokio_stream::Iter<
            std::vec::IntoIter<Result<proto::RouteMatrixElement, tonic::Status>>,
        >;
        type Future =
            std::future::Ready<Result<tonic::Response<Self::ResponseStream>, tonic::Status>>;

        fn call(
            &mut self,
            request: tonic::Request<proto::ComputeRouteMatrixRequest>,
        ) -> Self::Future {
            let metadata = request.metadata();
            let text = |key: &str| {
                metadata
                    .get(key)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            };
            self.0.calls.lock().expect("calls lock").push((
                text(FIELD_MASK_METADATA).unwrap_or_default(),
                text(API_KEY_METADATA),
            ));
            let items: Vec<_> = self.0.elements.iter().cloned().map(Ok).collect();
            std::future::ready(Ok(tonic::Response::new(tokio_stream::iter(items))))
        }
    }

    impl<B> tonic::codegen::Service<http::Request<B>> for MatrixServer
    where
        B: tonic::codegen::Body + Send + 'static,
        B::Error: Into<tonic::codegen::StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = tonic::codegen::BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: http::Request<B>) -> Self::Future {
            assert_eq!(request.uri().path(), COMPUTE_ROUTE_MATRIX_PATH);
            let service = StreamElements(self.clone());
            Box::pin(async move {
                let mut grpc = tonic::server::Grpc::new(ProstCodec::default());
                Ok(grpc.server_streaming(service, request).await)
            })
        }
    }

    impl MatrixServer {
        fn new(elements: Vec<proto::RouteMatrixElement>) -> Self {
            Self {
                elements: Arc::new(elements),
                calls: Arc::default(),
            }
        }

        /// Serve on an ephemeral local port and return a client for it.
        async fn start(&self) -> RoutesApiGrpcClient {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind local port");
            let addr = listener.local_addr().expect("local address");
            let router = tonic::transport::Server::builder().add_service(self.clone());
            tokio::spawn(router.serve_with_incoming(
                tokio_stream::wrappers::TcpListenerStream::new(listener),
            ));
            let config = RoutesApiGrpcConfig::new(format!("http://{addr}"))
                .with_timeout(Duration::from_secs(5));
            RoutesApiGrpcClient::with_config(
                &config,
                Arc::new(ApiKeyPicker::new(vec!["grpc-key".to_owned()])),
            )
            .expect("client should build")
        }
    }

    fn streamed(origin: i32, destination: i32) -> proto::RouteMatrixElement {
        proto::RouteMatrixElement {
            origin_index: Some(origin),
            destination_index: Some(destination),
            condition: proto::RouteMatrixElementCondition::RouteExists.into(),
            distance_meters: 1_000 * (origin + 1) + destination,
            duration: Some(prost_types::Duration {
                seconds: i64::from(10 * (origin + 1) + destination),
                nanos: 250_000_000,
            }),
            ..Default::default()
        }
    }

    fn square_request() -> DistanceMatrixRequest {
        let pts = points(2);
        DistanceMatrixRequest::new(pts.clone(), pts, &MapsLimits::ADVANCED)
    }

    #[rstest]
    #[tokio::test]
    async fn streamed_elements_assemble_the_tile() {
        let elements = [(1, 1), (0, 1), (1, 0), (0, 0)]
            .into_iter()
            .map(|(o, d)| streamed(o, d))
            .collect();
        let server = MatrixServer::new(elements);
        let client = server.start().await;
        let request = square_request();

        let matrix = client
            .distance_matrix(&RequestContext::new(), &request)
            .await
            .expect("complete stream");

        let (a, b) = (request.origins[0], request.origins[1]);
        assert_eq!(matrix.cell_count(), 4);
        assert_eq!(
            matrix.get(a, b),
            Some(Distance::new(Duration::from_millis(11_250), 1_001))
        );
        assert_eq!(
            matrix.get(b, a),
            Some(Distance::new(Duration::from_millis(20_250), 2_000))
        );
        assert_eq!(matrix.get(a, a), Some(Distance::ZERO));
        assert_eq!(matrix.get(b, b), Some(Distance::ZERO));
        assert_eq!(
            *server.calls.lock().expect("calls lock"),
            [(
                DISTANCE_MATRIX_FIELD_MASK.to_owned(),
                Some("grpc-key".to_owned())
            )]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn bad_element_mid_stream_fails_the_tile() {
        let mut missing = streamed(0, 1);
        missing.condition = proto::RouteMatrixElementCondition::RouteNotFound.into();
        let server = MatrixServer::new(vec![streamed(0, 0), missing, streamed(1, 0), streamed(1, 1)]);
        let client = server.start().await;

        let err = client
            .distance_matrix(&RequestContext::new(), &square_request())
            .await
            .expect_err("one element has no route");
        assert_eq!(
            err,
            MapServiceError::ElementStatus {
                origin_index: 0,
                destination_index: 1,
                status: "ROUTE_NOT_FOUND".to_owned(),
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn short_stream_fails_the_tile() {
        let server = MatrixServer::new(vec![streamed(0, 0), streamed(0, 1), streamed(1, 0)]);
        let client = server.start().await;

        let err = client
            .distance_matrix(&RequestContext::new(), &square_request())
            .await
            .expect_err("one cell never arrives");
        assert_eq!(
            err,
            MapServiceError::UnexpectedMatrixShape {
                expected_rows: 2,
                expected_columns: 2,
                rows: 2,
                columns: 1,
            }
        );
    }
}
