//! Error types emitted by the Waymark CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waymark_core::MapServiceError;
use waymark_data::routing::ProviderBuildError;

/// Errors emitted by the Waymark CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option holds a value outside its accepted range.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// Opening the query file failed.
    #[error("failed to open query at {path:?}: {source}")]
    OpenQuery {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Query JSON could not be decoded.
    #[error("failed to parse query JSON at {path:?}: {source}")]
    ParseQuery {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The query lacks the points the command needs.
    #[error("query at {path:?} has no {field} for the {command} command")]
    IncompleteQuery {
        path: Utf8PathBuf,
        command: &'static str,
        field: &'static str,
    },
    /// The selected provider cannot answer the command.
    #[error("the {provider} provider does not support {command}")]
    UnsupportedCommand {
        provider: &'static str,
        command: &'static str,
    },
    /// Constructing the provider failed.
    #[error("failed to build {provider} provider: {source}")]
    BuildProvider {
        provider: &'static str,
        #[source]
        source: ProviderBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The provider rejected or failed the query.
    #[error("{command} query failed: {source}")]
    Query {
        command: &'static str,
        #[source]
        source: MapServiceError,
    },
    /// The health probe reached the backend but did not succeed.
    #[error("{provider} provider failed its health probe")]
    Unhealthy { provider: &'static str },
    /// Serializing the query result failed.
    #[error("failed to serialize query result: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the query result failed.
    #[error("failed to write query result: {0}")]
    WriteOutput(#[source] std::io::Error),
}
