//! Command-line interface for querying Waymark routing backends.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod output;
mod provider;
mod query;

pub use error::CliError;
use provider::DefaultServiceBuilder;
use query::{Operation, QueryArgs, run_query};

const ARG_QUERY: &str = "query";
const ARG_PROVIDER: &str = "provider";
const ARG_OSRM_URL: &str = "osrm-url";
const ARG_GOOGLE_URL: &str = "google-url";
const ARG_API_KEYS: &str = "api-keys";
const ARG_LIMITS: &str = "limits";
const ARG_REQUESTS_PER_SECOND: &str = "requests-per-second";
const ARG_ELEMENTS_PER_SECOND: &str = "elements-per-second";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_DISTANCE_SOURCE_ID: &str = "distance-source-id";
const ENV_QUERY: &str = "WAYMARK_CMDS_QUERY_QUERY";
const ENV_PROVIDER: &str = "WAYMARK_CMDS_QUERY_PROVIDER";

/// Run the Waymark CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let (operation, args) = cli.command.into_parts();
    let mut stdout = std::io::stdout().lock();
    run_query(operation, args, &DefaultServiceBuilder, &mut stdout)
}

#[derive(Debug, Parser)]
#[command(
    name = "waymark",
    about = "Query distance matrices and routes from a routing backend",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Distances for every origin and destination pair.
    Matrix(QueryArgs),
    /// Distances for each consecutive leg of a path.
    Path(QueryArgs),
    /// A route through the waypoints in order.
    Route(QueryArgs),
    /// Snap a location to the road network.
    Nearest(QueryArgs),
    /// Probe the backend once.
    Health(QueryArgs),
}

impl Command {
    fn into_parts(self) -> (Operation, QueryArgs) {
        match self {
            Self::Matrix(args) => (Operation::Matrix, args),
            Self::Path(args) => (Operation::Path, args),
            Self::Route(args) => (Operation::Route, args),
            Self::Nearest(args) => (Operation::Nearest, args),
            Self::Health(args) => (Operation::Health, args),
        }
    }
}

#[cfg(test)]
mod tests;
