//! Error taxonomy for distance and route calls.

use std::fmt;

use thiserror::Error;

use crate::{ContextError, LatLng, LimitsError, SettingsError};

/// Which throttler a rate-limit error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottledResource {
    /// The throttler in front of rectangular matrix calls.
    Matrix,
    /// The throttler in front of route and path calls.
    Route,
}

impl fmt::Display for ThrottledResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Matrix => "matrix",
            Self::Route => "route",
        })
    }
}

/// Which token bucket of a throttler was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleDimension {
    /// The one-token-per-call bucket.
    Requests,
    /// The bucket charged per matrix cell or path leg.
    Elements,
}

impl fmt::Display for ThrottleDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requests => "requests",
            Self::Elements => "elements",
        })
    }
}

/// Errors returned by [`crate::MapService`] implementations and the
/// machinery behind them.
///
/// Every error is terminal for the call that produced it. Nothing in this
/// library retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapServiceError {
    /// A route call received fewer than two waypoints.
    #[error("route requires at least {min} waypoints, got {got}")]
    NotEnoughWaypoints {
        /// Minimum accepted.
        min: usize,
        /// Number supplied.
        got: usize,
    },
    /// A route call received more waypoints than the provider accepts.
    #[error("route accepts at most {max} waypoints, got {got}")]
    TooManyWaypoints {
        /// Provider maximum.
        max: usize,
        /// Number supplied.
        got: usize,
    },
    /// Provider limits failed validation.
    #[error("invalid provider limits: {0}")]
    InvalidLimits(#[from] LimitsError),
    /// The context ended while waiting on a throttler bucket.
    #[error("{resource} throttler: {dimension} wait aborted: {cause}")]
    RateLimitExceeded {
        /// Throttler that was waited on.
        resource: ThrottledResource,
        /// Bucket that could not be drawn from in time.
        dimension: ThrottleDimension,
        /// Why the wait ended.
        cause: ContextError,
    },
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// The request deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    /// The provider could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Transport error text.
        message: String,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },
    /// The transport gave up waiting for the provider.
    #[error("provider request timed out")]
    Timeout,
    /// The provider response could not be decoded.
    #[error("failed to parse provider response: {message}")]
    Parse {
        /// Decoder error text.
        message: String,
    },
    /// A gRPC call failed.
    #[error("gRPC call failed with {code}: {message}")]
    Grpc {
        /// gRPC status code name.
        code: String,
        /// Status message.
        message: String,
    },
    /// The provider answered but reported a non-success status.
    #[error("provider reported {code}: {message}")]
    ServiceError {
        /// Provider status code.
        code: String,
        /// Provider message, possibly empty.
        message: String,
    },
    /// A matrix element carried a non-success status or condition.
    #[error("matrix element ({origin_index}, {destination_index}) rejected: {status}")]
    ElementStatus {
        /// Origin index within the tile.
        origin_index: i64,
        /// Destination index within the tile.
        destination_index: i64,
        /// Status or condition reported for the element.
        status: String,
    },
    /// The provider found no road connection between two points.
    #[error("no route between {origin} and {destination}")]
    UnreachablePair {
        /// Origin coordinate.
        origin: LatLng,
        /// Destination coordinate.
        destination: LatLng,
    },
    /// A route response did not have one leg per consecutive waypoint pair.
    #[error("unexpected number of legs: expected {expected}, got {got}")]
    UnexpectedLegCount {
        /// Legs implied by the request.
        expected: usize,
        /// Legs in the response.
        got: usize,
    },
    /// A matrix response did not match the requested rows and columns.
    #[error(
        "unexpected matrix shape: expected {expected_rows}x{expected_columns}, got {rows}x{columns}"
    )]
    UnexpectedMatrixShape {
        /// Requested origin count.
        expected_rows: usize,
        /// Requested destination count.
        expected_columns: usize,
        /// Rows in the response.
        rows: usize,
        /// Columns in the response (first mismatching row).
        columns: usize,
    },
    /// A matrix element pointed outside the request.
    #[error(
        "matrix element index ({origin_index}, {destination_index}) outside {origins}x{destinations} request"
    )]
    IndexOutOfRange {
        /// Reported origin index.
        origin_index: i64,
        /// Reported destination index.
        destination_index: i64,
        /// Origins in the request.
        origins: usize,
        /// Destinations in the request.
        destinations: usize,
    },
    /// The provider returned no routes.
    #[error("provider returned no routes")]
    NoRoutes,
    /// The provider returned no snapped waypoints.
    #[error("provider returned no waypoints")]
    NoWaypoints,
    /// Region settings could not be loaded.
    #[error("failed to load region settings: {0}")]
    Settings(#[from] SettingsError),
    /// A fan-out task panicked or was aborted.
    #[error("fan-out task failed: {message}")]
    TaskFailed {
        /// Join error text.
        message: String,
    },
}

impl From<ContextError> for MapServiceError {
    fn from(value: ContextError) -> Self {
        match value {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl MapServiceError {
    /// Build a [`MapServiceError::Parse`] from any displayable error.
    pub fn parse(err: impl fmt::Display) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }

    /// Whether the error was caused by the request context ending.
    #[must_use]
    pub const fn is_context_error(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::DeadlineExceeded | Self::RateLimitExceeded { .. }
        )
    }
}
