//! Measurement points written for every public distance and route call.
//!
//! The sink itself lives outside this library; callers hand in any
//! [`Scope`]. [`LogScope`] writes points through the `log` facade and
//! [`NoopScope`] drops them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::MapServiceError;

/// Measurement written by matrix calls.
pub const DISTANCE_MATRIX_MEASUREMENT: &str = "get_distance_matrix";
/// Measurement written by route calls.
pub const GET_ROUTE_MEASUREMENT: &str = "get_route";

/// Tag holding [`STATUS_OK`] or [`STATUS_ERROR`].
pub const STATUS_TAG: &str = "status";
/// Successful call.
pub const STATUS_OK: &str = "OK";
/// Failed call.
pub const STATUS_ERROR: &str = "error";

/// Tag holding [`MATRIX_TYPE_RECT`] or [`MATRIX_TYPE_PATH`].
pub const MATRIX_TYPE_TAG: &str = "type";
/// Rectangular origin × destination matrix.
pub const MATRIX_TYPE_RECT: &str = "rect";
/// Sequential path legs.
pub const MATRIX_TYPE_PATH: &str = "path";

/// Provider requests issued by the call.
pub const REQUESTS_FIELD: &str = "requests";
/// Elements (cells or legs) requested by the call.
pub const ELEMENTS_FIELD: &str = "elements";
/// Wall-clock duration of the call.
pub const DURATION_MS_FIELD: &str = "duration_ms";
/// Error text, empty on success.
pub const ERROR_FIELD: &str = "error";

/// Indexed string dimensions of a measurement point.
pub type Tags = BTreeMap<String, String>;

/// Values of a measurement point.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Integer value.
    Int(i64),
    /// Text value.
    Str(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

/// Destination for measurement points.
pub trait Scope: Send + Sync {
    /// Write one point. Implementations merge their own base tags and fields
    /// underneath the ones given here.
    fn write_point(&self, measurement: &str, tags: &Tags, fields: &Fields);

    /// Derive a scope that prefixes measurement names and adds base tags and
    /// fields to every point.
    fn with(&self, prefix: &str, tags: &Tags, fields: &Fields) -> Arc<dyn Scope>;
}

/// A scope that drops every point.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScope;

impl Scope for NoopScope {
    fn write_point(&self, _measurement: &str, _tags: &Tags, _fields: &Fields) {}

    fn with(&self, _prefix: &str, _tags: &Tags, _fields: &Fields) -> Arc<dyn Scope> {
        Arc::new(Self)
    }
}

/// A scope that writes every point as a `debug!` record under the
/// `waymark::metrics` target.
#[derive(Debug, Clone, Default)]
pub struct LogScope {
    prefix: String,
    tags: Tags,
    fields: Fields,
}

impl LogScope {
    /// A scope with no prefix and no base tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scope for LogScope {
    fn write_point(&self, measurement: &str, tags: &Tags, fields: &Fields) {
        let tags = merged(&self.tags, tags);
        let fields = merged(&self.fields, fields);
        let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        debug!(
            target: "waymark::metrics",
            "{}{measurement} {tags:?} {}",
            self.prefix,
            rendered.join(" ")
        );
    }

    fn with(&self, prefix: &str, tags: &Tags, fields: &Fields) -> Arc<dyn Scope> {
        Arc::new(Self {
            prefix: format!("{}{prefix}", self.prefix),
            tags: merged(&self.tags, tags),
            fields: merged(&self.fields, fields),
        })
    }
}

/// Overlay `top` on `base`.
#[must_use]
pub fn merged<V: Clone>(base: &BTreeMap<String, V>, top: &BTreeMap<String, V>) -> BTreeMap<String, V> {
    let mut out = base.clone();
    out.extend(top.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

/// Fields describing the size of a call.
#[must_use]
pub fn size_fields(requests: usize, elements: usize) -> Fields {
    Fields::from([
        (REQUESTS_FIELD.to_owned(), FieldValue::from(requests)),
        (ELEMENTS_FIELD.to_owned(), FieldValue::from(elements)),
    ])
}

/// Write the outcome of a call: `status` tag, `duration_ms` and `error`
/// fields.
pub fn record_outcome<T>(
    scope: &dyn Scope,
    measurement: &str,
    started: Instant,
    result: &Result<T, MapServiceError>,
) {
    let (status, error) = match result {
        Ok(_) => (STATUS_OK, String::new()),
        Err(err) => (STATUS_ERROR, err.to_string()),
    };
    let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
    let tags = Tags::from([(STATUS_TAG.to_owned(), status.to_owned())]);
    let fields = Fields::from([
        (DURATION_MS_FIELD.to_owned(), FieldValue::Int(elapsed)),
        (ERROR_FIELD.to_owned(), FieldValue::Str(error)),
    ]);
    scope.write_point(measurement, &tags, &fields);
}
