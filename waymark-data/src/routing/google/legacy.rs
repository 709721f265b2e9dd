//! Legacy Google Maps JSON web services: Distance Matrix and Directions.
//!
//! Both answer HTTP 200 and report failure in a top-level `status` field.
//! Matrix cells carry their own `status`; any cell other than `OK` fails the
//! whole call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use waymark_core::{
    ApiKeyPicker, DirectionsRequest, Distance, DistanceMatrix, DistanceMatrixRequest, LatLng,
    MapServiceError, RequestContext, Route,
};

use super::RoutesClient;
use crate::routing::http::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client, send_json,
};
use crate::routing::polyline;

const DISTANCE_MATRIX_PATH: &str = "/maps/api/distancematrix/json";
const DIRECTIONS_PATH: &str = "/maps/api/directions/json";

/// Top-level and element status for success.
const OK_STATUS: &str = "OK";

/// Configuration for [`LegacyMapsApiClient`].
#[derive(Debug, Clone)]
pub struct LegacyMapsApiConfig {
    /// Scheme and host of the Maps web services.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for LegacyMapsApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl LegacyMapsApiConfig {
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

/// Distance Matrix API response.
#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixCell>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    status: String,
    #[serde(default)]
    duration: Option<ValueField>,
    #[serde(default)]
    distance: Option<ValueField>,
}

/// `{"value": .., "text": ..}`; only the numeric value is read.
#[derive(Debug, Deserialize)]
struct ValueField {
    value: i64,
}

/// Directions API response.
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    overview_polyline: Option<OverviewPolyline>,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    duration: ValueField,
    distance: ValueField,
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), MapServiceError> {
    if status == OK_STATUS {
        return Ok(());
    }
    warn!("legacy Maps API answered {status}");
    Err(MapServiceError::ServiceError {
        code: status.to_owned(),
        message: error_message.unwrap_or_default(),
    })
}

fn value_distance(duration: &ValueField, distance: &ValueField) -> Result<Distance, MapServiceError> {
    let seconds = u64::try_from(duration.value)
        .map_err(|_| MapServiceError::parse(format!("negative duration {}", duration.value)))?;
    Ok(Distance::new(Duration::from_secs(seconds), distance.value))
}

/// Client for the legacy JSON web services.
pub struct LegacyMapsApiClient {
    client: Client,
    config: LegacyMapsApiConfig,
    api_keys: Arc<ApiKeyPicker>,
}

impl fmt::Debug for LegacyMapsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyMapsApiClient")
            .field("config", &self.config)
            .field("api_keys", &self.api_keys)
            .finish_non_exhaustive()
    }
}

impl LegacyMapsApiClient {
    /// Create a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(api_keys: Arc<ApiKeyPicker>) -> Result<Self, ProviderBuildError> {
        Self::with_config(LegacyMapsApiConfig::default(), api_keys)
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(
        config: LegacyMapsApiConfig,
        api_keys: Arc<ApiKeyPicker>,
    ) -> Result<Self, ProviderBuildError> {
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            config,
            api_keys,
        })
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        let request = self
            .client
            .get(url)
            .query(params)
            .query(&[("units", "metric")]);
        match self.api_keys.next_api_key() {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }
}

fn joined(points: &[LatLng]) -> String {
    points
        .iter()
        .map(|p| p.google_maps_coordinate())
        .collect::<Vec<_>>()
        .join("|")
}

fn matrix_from_rows(
    request: &DistanceMatrixRequest,
    rows: Vec<MatrixRow>,
) -> Result<DistanceMatrix, MapServiceError> {
    let expected_rows = request.origins.len();
    let expected_columns = request.destinations.len();
    let bad_row = rows.iter().find(|row| row.elements.len() != expected_columns);
    if rows.len() != expected_rows || bad_row.is_some() {
        return Err(MapServiceError::UnexpectedMatrixShape {
            expected_rows,
            expected_columns,
            rows: rows.len(),
            columns: bad_row.map_or(expected_columns, |row| row.elements.len()),
        });
    }

    let mut matrix = DistanceMatrix::with_origins(&request.origins);
    for ((origin_index, origin), row) in request.origins.iter().enumerate().zip(rows) {
        for ((destination_index, destination), cell) in
            request.destinations.iter().enumerate().zip(row.elements)
        {
            let cell_error = |status: String| MapServiceError::ElementStatus {
                origin_index: i64::try_from(origin_index).unwrap_or(i64::MAX),
                destination_index: i64::try_from(destination_index).unwrap_or(i64::MAX),
                status,
            };
            if cell.status != OK_STATUS {
                return Err(cell_error(cell.status));
            }
            let (Some(duration), Some(distance)) = (cell.duration, cell.distance) else {
                return Err(cell_error("missing duration or distance".to_owned()));
            };
            matrix.insert(*origin, *destination, value_distance(&duration, &distance)?);
        }
    }
    Ok(matrix.with_zero_diagonal())
}

fn route_from_json(route: DirectionsRoute) -> Result<Route, MapServiceError> {
    let encoded = route
        .overview_polyline
        .map(|p| p.points)
        .unwrap_or_default();
    let legs = route
        .legs
        .iter()
        .map(|leg| value_distance(&leg.duration, &leg.distance))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Route::from_legs(polyline::decode(&encoded)?, legs))
}

#[async_trait]
impl RoutesClient for LegacyMapsApiClient {
    async fn distance_matrix(
        &self,
        ctx: &RequestContext,
        request: &DistanceMatrixRequest,
    ) -> Result<DistanceMatrix, MapServiceError> {
        debug!(
            "legacy distance matrix for {}x{} waypoints",
            request.origins.len(),
            request.destinations.len()
        );
        let params = [
            ("origins", joined(&request.origins)),
            ("destinations", joined(&request.destinations)),
        ];
        let response: DistanceMatrixResponse =
            send_json(ctx, self.get(DISTANCE_MATRIX_PATH, &params)).await?;
        check_status(&response.status, response.error_message)?;
        matrix_from_rows(request, response.rows)
    }

    async fn directions(
        &self,
        ctx: &RequestContext,
        request: &DirectionsRequest,
    ) -> Result<Vec<Route>, MapServiceError> {
        let mut params = vec![
            ("origin", request.origin.google_maps_coordinate()),
            ("destination", request.destination.google_maps_coordinate()),
        ];
        if !request.intermediates.is_empty() {
            params.push(("waypoints", joined(&request.intermediates)));
        }
        let response: DirectionsResponse =
            send_json(ctx, self.get(DIRECTIONS_PATH, &params)).await?;
        check_status(&response.status, response.error_message)?;
        response.routes.into_iter().map(route_from_json).collect()
    }
}
