//! Builds the routing backend selected by a [`QueryConfig`].

use std::sync::Arc;

use waymark_core::{ApiKeyPicker, MapService, NearestWaypointService, ThrottledResource, Throttler};
use waymark_data::routing::{
    DirectionsPathClient, GoogleMapsService, LegacyMapsApiClient, LegacyMapsApiConfig,
    OsrmService, OsrmServiceConfig, PathDistanceMatrixClient, ProviderBuildError,
    RoutesApiGrpcClient, RoutesApiGrpcConfig, RoutesApiHttpClient, RoutesApiHttpConfig,
    RoutesClient,
};

use crate::CliError;
use crate::query::{ProviderKind, QueryConfig};

/// A backend ready to answer queries.
pub(crate) struct Provider {
    pub(crate) service: Arc<dyn MapService>,
    /// Present only for backends that can snap to the road network.
    pub(crate) nearest: Option<Arc<dyn NearestWaypointService>>,
}

/// Builds a provider for the current invocation.
///
/// Called from inside the query runtime, so implementations may create
/// clients that need one.
pub(crate) trait ServiceBuilder {
    fn build(&self, config: &QueryConfig) -> Result<Provider, CliError>;
}

pub(crate) struct DefaultServiceBuilder;

impl ServiceBuilder for DefaultServiceBuilder {
    fn build(&self, config: &QueryConfig) -> Result<Provider, CliError> {
        let failed = |source: ProviderBuildError| CliError::BuildProvider {
            provider: config.provider.name(),
            source,
        };
        match config.provider {
            ProviderKind::Osrm => {
                let osrm = Arc::new(
                    OsrmService::with_config(
                        OsrmServiceConfig::new(config.osrm_url.clone())
                            .with_timeout(config.timeout)
                            .with_distance_source_id(config.distance_source_id),
                    )
                    .map_err(failed)?,
                );
                Ok(Provider {
                    service: osrm.clone(),
                    nearest: Some(osrm),
                })
            }
            ProviderKind::GoogleHttp => {
                let mut client_config = RoutesApiHttpConfig::default().with_timeout(config.timeout);
                if let Some(url) = &config.google_url {
                    client_config.base_url.clone_from(url);
                }
                let client = Arc::new(
                    RoutesApiHttpClient::with_config(client_config, api_keys(config))
                        .map_err(failed)?,
                );
                Ok(google(config, client.clone(), client))
            }
            ProviderKind::GoogleGrpc => {
                let mut client_config = RoutesApiGrpcConfig::default().with_timeout(config.timeout);
                if let Some(url) = &config.google_url {
                    client_config.endpoint.clone_from(url);
                }
                let client = Arc::new(
                    RoutesApiGrpcClient::with_config(&client_config, api_keys(config))
                        .map_err(failed)?,
                );
                Ok(google(config, client.clone(), client))
            }
            ProviderKind::GoogleLegacy => {
                let mut client_config = LegacyMapsApiConfig::default().with_timeout(config.timeout);
                if let Some(url) = &config.google_url {
                    client_config.base_url.clone_from(url);
                }
                let client: Arc<dyn RoutesClient> = Arc::new(
                    LegacyMapsApiClient::with_config(client_config, api_keys(config))
                        .map_err(failed)?,
                );
                let paths = Arc::new(DirectionsPathClient::new(client.clone()));
                Ok(google(config, client, paths))
            }
        }
    }
}

fn api_keys(config: &QueryConfig) -> Arc<ApiKeyPicker> {
    Arc::new(ApiKeyPicker::new(config.api_keys.clone()))
}

fn google(
    config: &QueryConfig,
    routes: Arc<dyn RoutesClient>,
    paths: Arc<dyn PathDistanceMatrixClient>,
) -> Provider {
    let limits = config.limits.limits();
    let throttler = |resource| {
        Throttler::for_limits(
            config.requests_per_second,
            config.elements_per_second,
            &limits,
            resource,
        )
    };
    let service = GoogleMapsService::new(routes, paths, config.distance_source_id, limits)
        .with_matrix_throttler(throttler(ThrottledResource::Matrix))
        .with_route_throttler(throttler(ThrottledResource::Route));
    Provider {
        service: Arc::new(service),
        nearest: None,
    }
}
