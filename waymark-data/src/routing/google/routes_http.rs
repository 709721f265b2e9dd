//! Routes API over REST: protobuf-JSON bodies, field-mask and API-key
//! headers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use waymark_core::{
    ApiKeyPicker, DirectionsRequest, DistanceMatrix, DistanceMatrixRequest, MapServiceError,
    PathDistanceMatrixRequest, RequestContext, Route,
};

use super::routes_api::{
    API_KEY_HEADER, DIRECTIONS_FIELD_MASK, DISTANCE_MATRIX_FIELD_MASK, FIELD_MASK_HEADER,
    MatrixAssembler, MatrixElement, PATH_DISTANCE_MATRIX_FIELD_MASK, ROUTES_API_BASE_URL,
    path_matrix_from_legs,
};
use super::routes_json::{
    ComputeRouteMatrixBody, ComputeRoutesBody, ComputeRoutesJson, RouteMatrixElementJson,
};
use super::{PathDistanceMatrixClient, RoutesClient};
use crate::routing::http::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client, send_json,
};

const COMPUTE_ROUTE_MATRIX_PATH: &str = "/distanceMatrix/v2:computeRouteMatrix";
const COMPUTE_ROUTES_PATH: &str = "/directions/v2:computeRoutes";

/// Configuration for [`RoutesApiHttpClient`].
#[derive(Debug, Clone)]
pub struct RoutesApiHttpConfig {
    /// Scheme and host of the Routes API.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for RoutesApiHttpConfig {
    fn default() -> Self {
        Self {
            base_url: ROUTES_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl RoutesApiHttpConfig {
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
}

/// Routes API client speaking JSON over HTTP.
///
/// Every request draws one key from the shared [`ApiKeyPicker`]; when the
/// pool is empty the key header is left off.
pub struct RoutesApiHttpClient {
    client: Client,
    config: RoutesApiHttpConfig,
    api_keys: Arc<ApiKeyPicker>,
}

impl fmt::Debug for RoutesApiHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutesApiHttpClient")
            .field("config", &self.config)
            .field("api_keys", &self.api_keys)
            .finish_non_exhaustive()
    }
}

impl RoutesApiHttpClient {
    /// Create a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(api_keys: Arc<ApiKeyPicker>) -> Result<Self, ProviderBuildError> {
        Self::with_config(RoutesApiHttpConfig::default(), api_keys)
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(
        config: RoutesApiHttpConfig,
        api_keys: Arc<ApiKeyPicker>,
    ) -> Result<Self, ProviderBuildError> {
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            config,
            api_keys,
        })
    }

    fn post<B: Serialize>(&self, path: &str, body: &B, field_mask: &'static str) -> RequestBuilder {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        let request = self
            .client
            .post(url)
            .header(FIELD_MASK_HEADER, field_mask)
            .json(body);
        match self.api_keys.next_api_key() {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[async_trait]
impl RoutesClient for RoutesApiHttpClient {
    async fn distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &DistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        debug!(
            "computeRouteMatrix for {}x{} waypoints",
            request.origins.len(),
            request.destinations.len()
        );
        let body = ComputeRouteMatrixBody::from(request);
        let elements: Vec<RouteMatrixElementJson> = send_json(
            ctx,
            self.post(COMPUTE_ROUTE_MATRIX_PATH, &body, DISTANCE_MATRIX_FIELD_MASK),
        )
        .await?;

        let mut matrix = MatrixAssembler::new(request);
        for element in elements {
            matrix.add(MatrixElement::try_from(element)?)?;
        }
        matrix.finish()
    }

    async fn directions(
        &self,
        ctx: &RequestContext,
        request: &DirectionsRequest,
    ) -> Result<Vec<Route>, MapServiceError> {
        let body = ComputeRoutesBody::from(request);
        let response: ComputeRoutesJson = send_json(
            ctx,
            self.post(COMPUTE_ROUTES_PATH, &body, DIRECTIONS_FIELD_MASK),
        )
        .await?;
        response
            .routes
            .into_iter()
            .map(super::routes_json::RouteJson::into_route)
            .collect()
    }
}

#[async_trait]
impl PathDistanceMatrixClient for RoutesApiHttpClient {
    async fn path_distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &PathDistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        let Some(body) = ComputeRoutesBody::for_path(request) else {
            return Ok(DistanceMatrix::new());
        };
        let response: ComputeRoutesJson = send_json(
            ctx,
            self.post(COMPUTE_ROUTES_PATH, &body, PATH_DISTANCE_MATRIX_FIELD_MASK),
        )
        .await?;
        let legs = response
            .routes
            .iter()
            .map(super::routes_json::RouteJson::leg_distances)
            .collect::<Result<Vec<_>, _>>()?;
        path_matrix_from_legs(&request.path, legs)
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests should fail fast when setup breaks"
    )]

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn config_builder_pattern() {
        let config = RoutesApiHttpConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[rstest]
    fn default_config_targets_production() {
        assert_eq!(RoutesApiHttpConfig::default().base_url, ROUTES_API_BASE_URL);
    }

    #[rstest]
    fn debug_hides_keys() {
        let client = RoutesApiHttpClient::new(Arc::new(ApiKeyPicker::new(vec!["secret".to_owned()])))
            .expect("client should build");
        assert!(!format!("{client:?}").contains("secret"));
    }
}
