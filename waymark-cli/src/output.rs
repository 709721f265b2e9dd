//! JSON shapes printed by the query commands.

use std::io::Write;

use serde::Serialize;
use waymark_core::{Distance, DistanceMatrix, LatLng, Route};

use crate::CliError;
use crate::query::Point;

/// One answer, printed as a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum QueryOutput {
    Matrix(MatrixOutput),
    Route(RouteOutput),
    Point(Point),
    Health(HealthOutput),
}

/// Travel time and road length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct DistanceOutput {
    pub(crate) duration_secs: u64,
    pub(crate) length_meters: i64,
}

impl From<Distance> for DistanceOutput {
    fn from(distance: Distance) -> Self {
        Self {
            duration_secs: distance.duration.as_secs(),
            length_meters: distance.length_meters,
        }
    }
}

/// One matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CellOutput {
    pub(crate) origin: Point,
    pub(crate) destination: Point,
    #[serde(flatten)]
    pub(crate) distance: DistanceOutput,
}

/// Matrix cells in query order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MatrixOutput {
    pub(crate) distance_source_id: i64,
    pub(crate) cells: Vec<CellOutput>,
}

impl MatrixOutput {
    /// Cells for every origin and destination pair, row by row.
    pub(crate) fn rect(
        distance_source_id: i64,
        origins: &[LatLng],
        destinations: &[LatLng],
        matrix: &DistanceMatrix,
    ) -> Self {
        let pairs = origins
            .iter()
            .flat_map(|origin| destinations.iter().map(move |destination| (*origin, *destination)));
        Self::from_pairs(distance_source_id, pairs, matrix)
    }

    /// Cells for each consecutive leg of `path`.
    pub(crate) fn path(distance_source_id: i64, path: &[LatLng], matrix: &DistanceMatrix) -> Self {
        let pairs = path.windows(2).filter_map(|pair| match pair {
            [from, to] => Some((*from, *to)),
            _ => None,
        });
        Self::from_pairs(distance_source_id, pairs, matrix)
    }

    fn from_pairs(
        distance_source_id: i64,
        pairs: impl Iterator<Item = (LatLng, LatLng)>,
        matrix: &DistanceMatrix,
    ) -> Self {
        let cells = pairs
            .filter_map(|(origin, destination)| {
                matrix
                    .get(origin, destination)
                    .map(|distance| CellOutput {
                        origin: origin.into(),
                        destination: destination.into(),
                        distance: distance.into(),
                    })
            })
            .collect();
        Self {
            distance_source_id,
            cells,
        }
    }
}

/// A route with its geometry and legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RouteOutput {
    pub(crate) polyline: Vec<Point>,
    #[serde(flatten)]
    pub(crate) distance: DistanceOutput,
    pub(crate) legs: Vec<DistanceOutput>,
}

impl From<&Route> for RouteOutput {
    fn from(route: &Route) -> Self {
        Self {
            polyline: route.polyline.iter().copied().map(Point::from).collect(),
            distance: route.distance.into(),
            legs: route.legs.iter().copied().map(DistanceOutput::from).collect(),
        }
    }
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct HealthOutput {
    pub(crate) provider: &'static str,
    pub(crate) healthy: bool,
    pub(crate) distance_source_id: i64,
}

pub(crate) fn write_output(writer: &mut dyn Write, output: &QueryOutput) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(output).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
