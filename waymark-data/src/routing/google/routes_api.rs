//! Pieces shared by the HTTP and gRPC Routes API clients.

use waymark_core::{Distance, DistanceMatrix, DistanceMatrixRequest, LatLng, MapServiceError, Route};

/// Production host of the Routes API.
pub const ROUTES_API_BASE_URL: &str = "https://routes.googleapis.com";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";
/// Header selecting the response fields.
pub const FIELD_MASK_HEADER: &str = "X-Goog-Fieldmask";

/// Fields read from matrix elements.
pub const DISTANCE_MATRIX_FIELD_MASK: &str =
    "originIndex,destinationIndex,duration,distanceMeters,status,condition";
/// Fields read when a route is only used for its legs.
pub const PATH_DISTANCE_MATRIX_FIELD_MASK: &str = "routes.legs.startLocation,routes.legs.endLocation,routes.legs.distanceMeters,routes.legs.duration,routes.legs.staticDuration";
/// Fields read when the route itself is returned.
pub const DIRECTIONS_FIELD_MASK: &str = "routes.distanceMeters,routes.duration,routes.polyline.encodedPolyline,routes.legs.distanceMeters,routes.legs.duration";

/// `google.rpc.Code.OK`.
const STATUS_OK: i32 = 0;

/// Matrix element condition required for a cell to be accepted.
pub const ROUTE_EXISTS: &str = "ROUTE_EXISTS";

/// A Routes API matrix element, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixElement {
    /// Index into the request's origins.
    pub origin_index: i64,
    /// Index into the request's destinations.
    pub destination_index: i64,
    /// `google.rpc.Code` of the element.
    pub status_code: i32,
    /// Status message, possibly empty.
    pub status_message: String,
    /// Condition enum name, e.g. `ROUTE_EXISTS`.
    pub condition: String,
    /// Travel time and length.
    pub distance: Distance,
}

/// Collects matrix elements for one request and refuses to finish until
/// every requested cell has arrived.
#[derive(Debug)]
pub struct MatrixAssembler<'a> {
    request: &'a DistanceMatrixRequest,
    matrix: DistanceMatrix,
    seen: Vec<Vec<bool>>,
}

impl<'a> MatrixAssembler<'a> {
    /// Start an empty matrix for `request`.
    #[must_use]
    pub fn new(request: &'a DistanceMatrixRequest) -> Self {
        Self {
            request,
            matrix: DistanceMatrix::with_origins(&request.origins),
            seen: vec![vec![false; request.destinations.len()]; request.origins.len()],
        }
    }

    /// Validate and store one element.
    ///
    /// # Errors
    /// See [`add_matrix_element`].
    pub fn add(&mut self, element: MatrixElement) -> Result<(), MapServiceError> {
        let (row, column) = add_matrix_element(&mut self.matrix, self.request, element)?;
        if let Some(cell) = self.seen.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            *cell = true;
        }
        Ok(())
    }

    /// The assembled matrix with its diagonal zeroed.
    ///
    /// # Errors
    /// [`MapServiceError::UnexpectedMatrixShape`] when any requested cell is
    /// missing; `rows` counts origins with at least one element and
    /// `columns` is the element count of the first incomplete row.
    pub fn finish(self) -> Result<DistanceMatrix, MapServiceError> {
        let expected_columns = self.request.destinations.len();
        let filled = |cells: &[bool]| cells.iter().filter(|seen| **seen).count();
        if let Some(columns) = self
            .seen
            .iter()
            .map(|cells| filled(cells))
            .find(|columns| *columns != expected_columns)
        {
            return Err(MapServiceError::UnexpectedMatrixShape {
                expected_rows: self.request.origins.len(),
                expected_columns,
                rows: self.seen.iter().filter(|cells| filled(cells) > 0).count(),
                columns,
            });
        }
        Ok(self.matrix.with_zero_diagonal())
    }
}

/// Validate `element` against `request` and store it in `matrix`.
///
/// Returns the origin and destination indices of the stored cell.
///
/// # Errors
/// [`MapServiceError::ElementStatus`] unless the status is OK and the
/// condition is `ROUTE_EXISTS`; [`MapServiceError::IndexOutOfRange`] when
/// either index falls outside the request.
pub fn add_matrix_element(
    matrix: &mut DistanceMatrix,
    request: &DistanceMatrixRequest,
    element: MatrixElement,
) -> Result<(usize, usize), MapServiceError> {
    let MatrixElement {
        origin_index,
        destination_index,
        status_code,
        status_message,
        condition,
        distance,
    } = element;
    if status_code != STATUS_OK {
        return Err(MapServiceError::ElementStatus {
            origin_index,
            destination_index,
            status: format!("status {status_code}: {status_message}"),
        });
    }
    if condition != ROUTE_EXISTS {
        return Err(MapServiceError::ElementStatus {
            origin_index,
            destination_index,
            status: condition,
        });
    }

    let origin = lookup(&request.origins, origin_index);
    let destination = lookup(&request.destinations, destination_index);
    let (Some((row, origin)), Some((column, destination))) = (origin, destination) else {
        return Err(MapServiceError::IndexOutOfRange {
            origin_index,
            destination_index,
            origins: request.origins.len(),
            destinations: request.destinations.len(),
        });
    };
    matrix.insert(origin, destination, distance);
    Ok((row, column))
}

fn lookup(points: &[LatLng], index: i64) -> Option<(usize, LatLng)> {
    let position = usize::try_from(index).ok()?;
    points.get(position).map(|point| (position, *point))
}

/// Turn the legs of the first route through `path` into matrix cells.
///
/// # Errors
/// [`MapServiceError::NoRoutes`] for an empty route list and
/// [`MapServiceError::UnexpectedLegCount`] unless there is exactly one leg
/// per consecutive pair in `path`.
pub fn path_matrix_from_legs(
    path: &[LatLng],
    legs_by_route: Vec<Vec<Distance>>,
) -> Result<DistanceMatrix, MapServiceError> {
    let legs = legs_by_route
        .into_iter()
        .next()
        .ok_or(MapServiceError::NoRoutes)?;
    let expected = path.len().saturating_sub(1);
    if legs.len() != expected {
        return Err(MapServiceError::UnexpectedLegCount {
            expected,
            got: legs.len(),
        });
    }
    let matrix: DistanceMatrix = path
        .windows(2)
        .zip(legs)
        .filter_map(|(pair, leg)| match pair {
            [from, to] => Some((*from, *to, leg)),
            _ => None,
        })
        .collect();
    Ok(matrix.with_zero_diagonal())
}

/// The first of the provider's candidate routes.
///
/// # Errors
/// [`MapServiceError::NoRoutes`] when there are none.
pub fn first_route(routes: Vec<Route>) -> Result<Route, MapServiceError> {
    routes.into_iter().next().ok_or(MapServiceError::NoRoutes)
}
