//! Quota-aware splitting of matrix and path requests.
//!
//! Both algorithms are pure functions of their inputs and a provider's
//! [`MapsLimits`]. Rectangular tiling walks origins and destinations in
//! square blocks of `floor(sqrt(max_elems))`; path tiling walks the path in
//! windows of `max_route_waypoints` that overlap by one boundary waypoint so
//! every leg lands in exactly one window.

use log::debug;

use crate::{DistanceMatrixRequest, LatLng, MapsLimits, PathDistanceMatrixRequest};

/// Offset of a tile inside the full origin × destination product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatrixTile {
    /// Index of the tile's first origin.
    pub row_offset: usize,
    /// Index of the tile's first destination.
    pub column_offset: usize,
}

/// A matrix request together with its position in the full matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledRequest {
    /// Sub-request sent to the provider.
    pub request: DistanceMatrixRequest,
    /// Where the sub-request sits.
    pub tile: MatrixTile,
}

/// Edge length of a square tile holding at most `max_elems` cells.
#[must_use]
pub fn tile_stride(max_elems: usize) -> usize {
    max_elems.isqrt().max(1)
}

/// Partition `origins × destinations` into provider-compliant tiles.
///
/// Tiles are emitted row block by row block. Edge tiles may be smaller than
/// interior ones. Empty inputs produce no tiles.
///
/// # Examples
///
/// ```
/// use waymark_core::{LatLng, MapsLimits, tiling::distance_matrix_requests};
///
/// let points: Vec<_> = (0..3).map(|i| LatLng::from_e6(i, i)).collect();
/// let limits = MapsLimits::new(2, 4)?;
/// let tiles = distance_matrix_requests(&points, &points, &limits);
/// let offsets: Vec<_> = tiles
///     .iter()
///     .map(|t| (t.tile.row_offset, t.tile.column_offset))
///     .collect();
/// assert_eq!(offsets, [(0, 0), (0, 2), (2, 0), (2, 2)]);
/// # Ok::<(), waymark_core::LimitsError>(())
/// ```
#[must_use]
pub fn distance_matrix_requests(
    origins: &[LatLng],
    destinations: &[LatLng],
    limits: &MapsLimits,
) -> Vec<TiledRequest> {
    let stride = tile_stride(limits.max_distance_matrix_elems());
    let requests: Vec<TiledRequest> = origins
        .chunks(stride)
        .enumerate()
        .flat_map(|(row_block, row)| {
            destinations
                .chunks(stride)
                .enumerate()
                .map(move |(column_block, column)| TiledRequest {
                    request: DistanceMatrixRequest::new(row.to_vec(), column.to_vec(), limits),
                    tile: MatrixTile {
                        row_offset: row_block * stride,
                        column_offset: column_block * stride,
                    },
                })
        })
        .collect();
    debug!(
        "tiled {}x{} matrix into {} requests of stride {stride}",
        origins.len(),
        destinations.len(),
        requests.len()
    );
    requests
}

/// Partition a path into overlapping route windows.
///
/// Each window holds at most `max_route_waypoints` waypoints and shares its
/// first waypoint with the previous window's last. A trailing window that
/// would only hold the shared boundary point is dropped, as are paths with
/// fewer than two waypoints.
#[must_use]
pub fn path_distance_matrix_requests(
    path: &[LatLng],
    limits: &MapsLimits,
) -> Vec<PathDistanceMatrixRequest> {
    if path.len() <= 1 {
        return Vec::new();
    }
    let window = limits.max_route_waypoints().max(2);
    let step = window - 1;
    let mut requests = Vec::with_capacity(path.len().div_ceil(step));
    let mut start = 0;
    while start < path.len() {
        let end = (start + window).min(path.len());
        if end == start + 1 {
            break;
        }
        if let Some(slice) = path.get(start..end) {
            requests.push(PathDistanceMatrixRequest::new(slice.to_vec(), limits));
        }
        start += step;
    }
    debug!(
        "tiled {}-point path into {} windows of up to {window} waypoints",
        path.len(),
        requests.len()
    );
    requests
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        clippy::indexing_slicing,
        reason = "tests fail fast on broken setup and index fixtures of known length"
    )]

    use super::*;
    use rstest::rstest;

    fn points(n: usize) -> Vec<LatLng> {
        (0..n)
            .map(|i| {
                let v = i32::try_from(i).expect("small index");
                LatLng::from_e6(v, v)
            })
            .collect()
    }

    fn limits(waypoints: usize, elems: usize) -> MapsLimits {
        MapsLimits::new(waypoints, elems).expect("valid limits")
    }

    #[rstest]
    #[case(1, 1)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(10, 3)]
    #[case(100, 10)]
    #[case(625, 25)]
    fn stride_is_integer_square_root(#[case] max: usize, #[case] stride: usize) {
        assert_eq!(tile_stride(max), stride);
    }

    #[rstest]
    fn three_by_three_with_four_elements_gives_four_tiles() {
        let pts = points(3);
        let tiles = distance_matrix_requests(&pts, &pts, &limits(2, 4));
        let sizes: Vec<_> = tiles
            .iter()
            .map(|t| (t.request.origins.len(), t.request.destinations.len()))
            .collect();
        assert_eq!(sizes, [(2, 2), (2, 1), (1, 2), (1, 1)]);
        assert_eq!(tiles[3].request.origins, [pts[2]]);
    }

    #[rstest]
    #[case(0, 3)]
    #[case(3, 0)]
    fn empty_side_gives_no_tiles(#[case] m: usize, #[case] n: usize) {
        assert!(distance_matrix_requests(&points(m), &points(n), &limits(2, 4)).is_empty());
    }

    #[rstest]
    fn four_point_path_with_three_waypoints_gives_two_windows() {
        let pts = points(4);
        let windows = path_distance_matrix_requests(&pts, &limits(3, 1));
        let paths: Vec<_> = windows.into_iter().map(|w| w.path).collect();
        assert_eq!(paths, [pts[0..3].to_vec(), pts[2..4].to_vec()]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn short_paths_give_no_windows(#[case] n: usize) {
        assert!(path_distance_matrix_requests(&points(n), &limits(3, 1)).is_empty());
    }

    #[rstest]
    fn exact_fit_drops_boundary_only_window() {
        let pts = points(5);
        let windows = path_distance_matrix_requests(&pts, &limits(3, 1));
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].path, pts[2..5].to_vec());
    }

    #[rstest]
    fn windows_inherit_limit_options() {
        let windows = path_distance_matrix_requests(&points(3), &MapsLimits::ROUTES_TRAFFIC_AWARE);
        assert_eq!(
            windows[0].routing_preference,
            crate::RoutingPreference::TrafficAware
        );
    }
}
