//! Shared HTTP plumbing for the JSON providers.

use std::time::Duration;

use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use waymark_core::{MapServiceError, RequestContext};

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "waymark-routing/0.1";

/// Default request timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for provider construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to configure the gRPC channel.
    GrpcChannel(tonic::transport::Error),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::GrpcChannel(err) => write!(f, "failed to configure gRPC channel: {err}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::GrpcChannel(err) => Some(err),
        }
    }
}

/// Build a client that applies `timeout` to both connecting and the whole
/// request.
pub(crate) fn build_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Client, ProviderBuildError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProviderBuildError::HttpClient)
}

/// Convert a reqwest error to a `MapServiceError`.
pub(crate) fn convert_reqwest_error(error: &reqwest::Error) -> MapServiceError {
    if error.is_timeout() {
        return MapServiceError::Timeout;
    }

    if let Some(status) = error.status() {
        return MapServiceError::Http {
            status: status.as_u16(),
        };
    }

    if error.is_decode() {
        return MapServiceError::parse(error);
    }

    MapServiceError::Network {
        message: error.to_string(),
    }
}

/// Send `request` under `ctx`, reject non-success statuses and decode the
/// JSON body.
pub(crate) async fn send_json<T>(
    ctx: &RequestContext,
    request: RequestBuilder,
) -> Result<T, MapServiceError>
where
    T: DeserializeOwned,
{
    ctx.check()?;
    ctx.run(async {
        let response = request
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err))?;
        debug!("{} answered {}", response.url(), response.status());
        let response = response
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err))?;
        response.json::<T>().await.map_err(MapServiceError::parse)
    })
    .await?
}
