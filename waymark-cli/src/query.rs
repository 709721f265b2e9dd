//! Query commands: layered configuration, query files and dispatch.

use std::io::{BufReader, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use clap::{Parser, ValueEnum};
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waymark_core::{LatLng, MapsLimits, RequestContext};
use waymark_data::routing::OsrmServiceConfig;

use crate::output::{HealthOutput, MatrixOutput, QueryOutput, RouteOutput, write_output};
use crate::provider::ServiceBuilder;
use crate::{
    ARG_API_KEYS, ARG_DISTANCE_SOURCE_ID, ARG_ELEMENTS_PER_SECOND, ARG_GOOGLE_URL, ARG_LIMITS,
    ARG_OSRM_URL, ARG_PROVIDER, ARG_QUERY, ARG_REQUESTS_PER_SECOND, ARG_TIMEOUT_SECS, CliError,
    ENV_PROVIDER, ENV_QUERY,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Routing backend selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ProviderKind {
    /// Self-hosted OSRM instance.
    Osrm,
    /// Google Routes API over REST.
    GoogleHttp,
    /// Google Routes API over gRPC.
    GoogleGrpc,
    /// Legacy Google Distance Matrix and Directions APIs.
    GoogleLegacy,
}

impl ProviderKind {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Osrm => "osrm",
            Self::GoogleHttp => "google-http",
            Self::GoogleGrpc => "google-grpc",
            Self::GoogleLegacy => "google-legacy",
        }
    }
}

/// Named provider limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum LimitsPreset {
    /// 27 waypoints, 100 matrix elements.
    #[default]
    Advanced,
    /// 12 waypoints, 10 matrix elements.
    Standard,
    /// Traffic-aware routing, 625 matrix elements.
    TrafficAware,
    /// Traffic-aware optimal routing, 100 matrix elements.
    TrafficAwareOptimal,
}

impl LimitsPreset {
    pub(crate) const fn limits(self) -> MapsLimits {
        match self {
            Self::Advanced => MapsLimits::ADVANCED,
            Self::Standard => MapsLimits::STANDARD,
            Self::TrafficAware => MapsLimits::ROUTES_TRAFFIC_AWARE,
            Self::TrafficAwareOptimal => MapsLimits::ROUTES_TRAFFIC_AWARE_OPTIMAL,
        }
    }
}

/// The question a subcommand asks the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Matrix,
    Path,
    Route,
    Nearest,
    Health,
}

impl Operation {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Matrix => "matrix",
            Self::Path => "path",
            Self::Route => "route",
            Self::Nearest => "nearest",
            Self::Health => "health",
        }
    }
}

/// CLI arguments shared by every query subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "query",
    long_about = "Ask one routing backend for distances, routes or snapped \
                 locations. Options can come from CLI flags, configuration \
                 files, or environment variables; points come from a JSON \
                 query file.",
    about = "Query a routing backend"
)]
#[ortho_config(prefix = "WAYMARK")]
pub(crate) struct QueryArgs {
    /// Path to a JSON file holding the query points.
    #[arg(long = ARG_QUERY, value_name = "path")]
    #[serde(default)]
    pub(crate) query: Option<Utf8PathBuf>,
    /// Routing backend to query.
    #[arg(long = ARG_PROVIDER, value_enum, value_name = "kind")]
    #[serde(default)]
    pub(crate) provider: Option<ProviderKind>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_url: Option<String>,
    /// Override the Google endpoint (scheme and host).
    #[arg(long = ARG_GOOGLE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) google_url: Option<String>,
    /// Comma-separated Google API keys, one drawn at random per call.
    #[arg(long = ARG_API_KEYS, value_name = "keys")]
    #[serde(default)]
    pub(crate) api_keys: Option<String>,
    /// Provider limits preset.
    #[arg(long = ARG_LIMITS, value_enum, value_name = "preset")]
    #[serde(default)]
    pub(crate) limits: Option<LimitsPreset>,
    /// Requests per second admitted by the throttlers (0 = unlimited).
    #[arg(long = ARG_REQUESTS_PER_SECOND, value_name = "n")]
    #[serde(default)]
    pub(crate) requests_per_second: Option<u32>,
    /// Matrix elements per second admitted by the throttlers (0 = unlimited).
    #[arg(long = ARG_ELEMENTS_PER_SECOND, value_name = "n")]
    #[serde(default)]
    pub(crate) elements_per_second: Option<u32>,
    /// Deadline for the whole query, in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Identifier stamped on distances from this backend.
    #[arg(long = ARG_DISTANCE_SOURCE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) distance_source_id: Option<i64>,
}

impl QueryArgs {
    pub(crate) fn into_config(self) -> Result<QueryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        QueryConfig::try_from(merged)
    }
}

/// Resolved query configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryConfig {
    /// Path to the JSON query file, absent for `health`.
    pub(crate) query: Option<Utf8PathBuf>,
    pub(crate) provider: ProviderKind,
    pub(crate) osrm_url: String,
    /// Google endpoint override; each client keeps its own default otherwise.
    pub(crate) google_url: Option<String>,
    pub(crate) api_keys: Vec<String>,
    pub(crate) limits: LimitsPreset,
    pub(crate) requests_per_second: u32,
    pub(crate) elements_per_second: u32,
    pub(crate) timeout: Duration,
    pub(crate) distance_source_id: i64,
}

impl QueryConfig {
    /// Context bounding one CLI invocation.
    pub(crate) fn context(&self) -> RequestContext {
        RequestContext::new()
            .with_timeout(self.timeout)
            .with_tag("caller", "waymark-cli")
    }

    fn query_path(&self) -> Result<&Utf8Path, CliError> {
        self.query.as_deref().ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_QUERY,
        })
    }
}

impl TryFrom<QueryArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: QueryArgs) -> Result<Self, Self::Error> {
        let provider = args.provider.ok_or(CliError::MissingArgument {
            field: ARG_PROVIDER,
            env: ENV_PROVIDER,
        })?;

        let timeout_secs = args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_TIMEOUT_SECS,
                reason: "must be at least one second",
            });
        }

        let osrm_url = args
            .osrm_url
            .unwrap_or_else(|| OsrmServiceConfig::default().base_url);
        let api_keys = args
            .api_keys
            .as_deref()
            .map(split_api_keys)
            .unwrap_or_default();

        Ok(Self {
            query: args.query,
            provider,
            osrm_url,
            google_url: args.google_url,
            api_keys,
            limits: args.limits.unwrap_or_default(),
            requests_per_second: args.requests_per_second.unwrap_or(0),
            elements_per_second: args.elements_per_second.unwrap_or(0),
            timeout: Duration::from_secs(timeout_secs),
            distance_source_id: args.distance_source_id.unwrap_or(0),
        })
    }
}

fn split_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
        .collect()
}

/// A coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub(crate) struct Point {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

impl From<Point> for LatLng {
    fn from(point: Point) -> Self {
        Self::new(point.lat, point.lng)
    }
}

impl From<LatLng> for Point {
    fn from(location: LatLng) -> Self {
        Self {
            lat: location.latitude(),
            lng: location.longitude(),
        }
    }
}

/// Points read from a query file. Each command reads the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub(crate) struct QueryFile {
    /// Matrix origins.
    #[serde(default)]
    pub(crate) origins: Vec<Point>,
    /// Matrix destinations; the origins when empty.
    #[serde(default)]
    pub(crate) destinations: Vec<Point>,
    /// Path or route waypoints in order.
    #[serde(default)]
    pub(crate) waypoints: Vec<Point>,
    /// Location to snap.
    #[serde(default)]
    pub(crate) location: Option<Point>,
}

/// Loads a JSON-encoded [`QueryFile`] from disk.
pub(crate) fn load_query(path: &Utf8Path) -> Result<QueryFile, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenQuery {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseQuery {
        path: path.to_path_buf(),
        source,
    })
}

/// The validated points for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryInput {
    Matrix {
        origins: Vec<LatLng>,
        destinations: Vec<LatLng>,
    },
    Path(Vec<LatLng>),
    Route(Vec<LatLng>),
    Nearest(LatLng),
    Health,
}

impl QueryInput {
    /// Pick out and check the fields `operation` needs from `file`.
    pub(crate) fn from_file(
        operation: Operation,
        file: QueryFile,
        path: &Utf8Path,
    ) -> Result<Self, CliError> {
        let incomplete = |field| CliError::IncompleteQuery {
            path: path.to_path_buf(),
            command: operation.name(),
            field,
        };
        let waypoints = || -> Result<Vec<LatLng>, CliError> {
            if file.waypoints.is_empty() {
                return Err(incomplete("waypoints"));
            }
            Ok(to_latlngs(&file.waypoints))
        };

        match operation {
            Operation::Matrix => {
                if file.origins.is_empty() {
                    return Err(incomplete("origins"));
                }
                let origins = to_latlngs(&file.origins);
                let destinations = if file.destinations.is_empty() {
                    origins.clone()
                } else {
                    to_latlngs(&file.destinations)
                };
                Ok(Self::Matrix {
                    origins,
                    destinations,
                })
            }
            Operation::Path => waypoints().map(Self::Path),
            Operation::Route => waypoints().map(Self::Route),
            Operation::Nearest => file
                .location
                .map(|point| Self::Nearest(point.into()))
                .ok_or_else(|| incomplete("location")),
            Operation::Health => Ok(Self::Health),
        }
    }
}

fn to_latlngs(points: &[Point]) -> Vec<LatLng> {
    points.iter().copied().map(LatLng::from).collect()
}

/// Resolve configuration, run `operation` and write the JSON answer.
pub(crate) fn run_query(
    operation: Operation,
    args: QueryArgs,
    builder: &dyn ServiceBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let input = resolve_input(operation, &config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let output = runtime.block_on(execute(operation, input, &config, builder))?;
    write_output(writer, &output)?;
    match output {
        QueryOutput::Health(HealthOutput { healthy: false, .. }) => Err(CliError::Unhealthy {
            provider: config.provider.name(),
        }),
        _ => Ok(()),
    }
}

fn resolve_input(operation: Operation, config: &QueryConfig) -> Result<QueryInput, CliError> {
    if operation == Operation::Health {
        return Ok(QueryInput::Health);
    }
    let path = config.query_path()?;
    let file = load_query(path)?;
    QueryInput::from_file(operation, file, path)
}

async fn execute(
    operation: Operation,
    input: QueryInput,
    config: &QueryConfig,
    builder: &dyn ServiceBuilder,
) -> Result<QueryOutput, CliError> {
    let provider = builder.build(config)?;
    let ctx = config.context();
    let command = operation.name();
    let failed = move |source| CliError::Query { command, source };
    debug!(
        "running {command} against {} (source id {})",
        config.provider.name(),
        provider.service.distance_source_id()
    );

    match input {
        QueryInput::Matrix {
            origins,
            destinations,
        } => {
            let matrix = provider
                .service
                .get_distance_matrix(&ctx, &origins, &destinations)
                .await
                .map_err(failed)?;
            Ok(QueryOutput::Matrix(MatrixOutput::rect(
                provider.service.distance_source_id(),
                &origins,
                &destinations,
                &matrix,
            )))
        }
        QueryInput::Path(path) => {
            let matrix = provider
                .service
                .get_path_distance_matrix(&ctx, &path)
                .await
                .map_err(failed)?;
            Ok(QueryOutput::Matrix(MatrixOutput::path(
                provider.service.distance_source_id(),
                &path,
                &matrix,
            )))
        }
        QueryInput::Route(waypoints) => {
            let route = provider
                .service
                .get_route(&ctx, &waypoints)
                .await
                .map_err(failed)?;
            Ok(QueryOutput::Route(RouteOutput::from(&route)))
        }
        QueryInput::Nearest(location) => {
            let nearest = provider.nearest.ok_or(CliError::UnsupportedCommand {
                provider: config.provider.name(),
                command,
            })?;
            let snapped = nearest
                .nearest_waypoint(&ctx, location)
                .await
                .map_err(failed)?;
            Ok(QueryOutput::Point(snapped.into()))
        }
        QueryInput::Health => Ok(QueryOutput::Health(HealthOutput {
            provider: config.provider.name(),
            healthy: provider.service.is_healthy(&ctx).await,
            distance_source_id: provider.service.distance_source_id(),
        })),
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<QueryConfig, CliError> {
    let merged = QueryArgs::merge_from_layers(layers).map_err(CliError::from)?;
    QueryConfig::try_from(merged)
}
