//! Test doubles for map services, region settings and metrics sinks, used by
//! unit and behaviour tests here and in downstream crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::metrics::merged;
use crate::{
    Distance, DistanceMatrix, FieldValue, Fields, LatLng, MapService, MapServiceError,
    RegionSettings, RequestContext, Route, Scope, SettingsError, SettingsService, Tags,
};

/// `n` distinct coordinates along a diagonal.
#[must_use]
pub fn gen_latlngs(n: usize) -> Vec<LatLng> {
    (0..n)
        .map(|i| {
            let step = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(1_000);
            LatLng::from_e6(40_000_000 + step, -105_000_000 + step)
        })
        .collect()
}

/// Deterministic, never-zero distance derived from two coordinates.
///
/// Self-distances are non-zero on purpose so tests can observe diagonal
/// normalisation.
#[must_use]
pub fn synthetic_distance(origin: LatLng, destination: LatLng) -> Distance {
    let manhattan = (i64::from(origin.lat_e6) - i64::from(destination.lat_e6)).abs()
        + (i64::from(origin.lng_e6) - i64::from(destination.lng_e6)).abs();
    let meters = manhattan / 10 + 1;
    Distance::new(Duration::from_secs(meters.unsigned_abs()), meters)
}

/// A full matrix of [`synthetic_distance`] values, diagonal included.
#[must_use]
pub fn gen_distance_matrix(origins: &[LatLng], destinations: &[LatLng]) -> DistanceMatrix {
    origins
        .iter()
        .flat_map(|o| {
            destinations
                .iter()
                .map(move |d| (*o, *d, synthetic_distance(*o, *d)))
        })
        .collect()
}

/// Sequential legs of [`synthetic_distance`] values.
#[must_use]
pub fn gen_path_matrix(path: &[LatLng]) -> DistanceMatrix {
    path.windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some((*a, *b, synthetic_distance(*a, *b))),
            _ => None,
        })
        .collect()
}

/// In-memory [`MapService`] answering with [`synthetic_distance`] values or
/// a fixed error.
#[derive(Debug)]
pub struct StubMapService {
    source_id: i64,
    error: Option<MapServiceError>,
    healthy: bool,
    calls: AtomicUsize,
}

impl StubMapService {
    /// A healthy service that always succeeds.
    #[must_use]
    pub const fn new(source_id: i64) -> Self {
        Self {
            source_id,
            error: None,
            healthy: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// A service whose every call fails with `error`.
    #[must_use]
    pub const fn with_error(source_id: i64, error: MapServiceError) -> Self {
        Self {
            source_id,
            error: Some(error),
            healthy: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Report unhealthy from [`MapService::is_healthy`].
    #[must_use]
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Number of distance and route calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self, ctx: &RequestContext) -> Result<(), MapServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        self.error.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl MapService for StubMapService {
    async fn get_distance_matrix(
        &self,
        ctx: &RequestContext,
        origins: &[LatLng],
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        self.begin(ctx)?;
        Ok(gen_distance_matrix(origins, destinations).with_zero_diagonal())
    }

    async fn get_path_distance_matrix(
        &self,
        ctx: &RequestContext,
        path: &[LatLng],
    ) -> Result<DistanceMatrix, MapServiceError> {
        self.begin(ctx)?;
        Ok(gen_path_matrix(path).with_zero_diagonal())
    }

    async fn get_route(
        &self,
        ctx: &RequestContext,
        waypoints: &[LatLng],
    ) -> Result<Route, MapServiceError> {
        self.begin(ctx)?;
        if waypoints.len() < 2 {
            return Err(MapServiceError::NotEnoughWaypoints {
                min: 2,
                got: waypoints.len(),
            });
        }
        let legs = waypoints
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(synthetic_distance(*a, *b)),
                _ => None,
            })
            .collect();
        Ok(Route::from_legs(waypoints.to_vec(), legs))
    }

    fn distance_source_id(&self) -> i64 {
        self.source_id
    }

    async fn is_healthy(&self, _ctx: &RequestContext) -> bool {
        self.healthy
    }
}

/// In-memory [`SettingsService`].
#[derive(Debug, Default, Clone)]
pub struct MockSettingsService {
    regions: HashMap<i64, RegionSettings>,
    failure: Option<String>,
}

impl MockSettingsService {
    /// A store with no regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every lookup fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            regions: HashMap::new(),
            failure: Some(message.into()),
        }
    }

    /// Register settings for a region.
    #[must_use]
    pub fn with_region(mut self, region_id: i64, settings: RegionSettings) -> Self {
        self.regions.insert(region_id, settings);
        self
    }
}

#[async_trait]
impl SettingsService for MockSettingsService {
    async fn service_region_settings(
        &self,
        _ctx: &RequestContext,
        region_id: i64,
    ) -> Result<RegionSettings, SettingsError> {
        if let Some(message) = &self.failure {
            return Err(SettingsError::Unavailable {
                region_id,
                message: message.clone(),
            });
        }
        self.regions
            .get(&region_id)
            .copied()
            .ok_or(SettingsError::UnknownRegion { region_id })
    }
}

/// One point captured by [`RecordingScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPoint {
    /// Measurement name, prefix included.
    pub measurement: String,
    /// Base tags merged with point tags.
    pub tags: Tags,
    /// Base fields merged with point fields.
    pub fields: Fields,
}

impl RecordedPoint {
    /// Value of a tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Value of a field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// [`Scope`] capturing every point in memory. Derived scopes share the
/// capture buffer with their parent.
#[derive(Debug, Clone, Default)]
pub struct RecordingScope {
    prefix: String,
    tags: Tags,
    fields: Fields,
    points: Arc<Mutex<Vec<RecordedPoint>>>,
}

impl RecordingScope {
    /// Every point written so far, in write order.
    #[must_use]
    pub fn points(&self) -> Vec<RecordedPoint> {
        self.points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Scope for RecordingScope {
    fn write_point(&self, measurement: &str, tags: &Tags, fields: &Fields) {
        let point = RecordedPoint {
            measurement: format!("{}{measurement}", self.prefix),
            tags: merged(&self.tags, tags),
            fields: merged(&self.fields, fields),
        };
        self.points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(point);
    }

    fn with(&self, prefix: &str, tags: &Tags, fields: &Fields) -> Arc<dyn Scope> {
        Arc::new(Self {
            prefix: format!("{}{prefix}", self.prefix),
            tags: merged(&self.tags, tags),
            fields: merged(&self.fields, fields),
            points: Arc::clone(&self.points),
        })
    }
}
