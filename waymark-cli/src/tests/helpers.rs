//! Test helpers for query files and stub providers.

use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use waymark_core::test_support::StubMapService;
use waymark_core::{LatLng, MapServiceError, NearestWaypointService, RequestContext};

use crate::CliError;
use crate::provider::{Provider, ServiceBuilder};
use crate::query::{Point, QueryConfig, QueryFile};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture file");
}

/// A temporary directory holding one query file.
pub(super) struct QueryWorkspace {
    _dir: TempDir,
    query_path: Utf8PathBuf,
}

impl QueryWorkspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            query_path: root.join("query.json"),
            _dir: dir,
        }
    }

    pub(super) fn query_path(&self) -> &Utf8Path {
        &self.query_path
    }

    pub(super) fn write_query(&self, query: &QueryFile) {
        let payload = serde_json::to_string_pretty(query).expect("serialize query");
        write_utf8(&self.query_path, payload.as_bytes());
    }
}

/// `count` points one thousandth of a degree apart.
pub(super) fn points(count: usize) -> Vec<Point> {
    waymark_core::test_support::gen_latlngs(count)
        .into_iter()
        .map(Point::from)
        .collect()
}

/// Snaps every location to one fixed point.
#[derive(Debug)]
pub(super) struct FixedNearest(pub(super) LatLng);

#[async_trait]
impl NearestWaypointService for FixedNearest {
    async fn nearest_waypoint(
        &self,
        ctx: &RequestContext,
        _location: LatLng,
    ) -> Result<LatLng, MapServiceError> {
        ctx.check()?;
        Ok(self.0)
    }
}

/// Hands out a [`StubMapService`] instead of a network client.
#[derive(Debug, Default)]
pub(super) struct StubServiceBuilder {
    pub(super) unhealthy: bool,
    pub(super) error: Option<MapServiceError>,
    pub(super) nearest: Option<LatLng>,
}

impl ServiceBuilder for StubServiceBuilder {
    fn build(&self, config: &QueryConfig) -> Result<Provider, CliError> {
        let stub = match &self.error {
            Some(error) => StubMapService::with_error(config.distance_source_id, error.clone()),
            None => StubMapService::new(config.distance_source_id),
        };
        let stub = if self.unhealthy { stub.unhealthy() } else { stub };
        Ok(Provider {
            service: Arc::new(stub),
            nearest: self
                .nearest
                .map(|point| Arc::new(FixedNearest(point)) as Arc<dyn NearestWaypointService>),
        })
    }
}
