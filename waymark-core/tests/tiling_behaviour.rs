//! Behavioural coverage for rectangular and path tiling.
#![expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests fail fast on broken setup and index fixtures of known length"
)]

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use waymark_core::test_support::gen_latlngs;
use waymark_core::tiling::{
    TiledRequest, distance_matrix_requests, path_distance_matrix_requests,
};
use waymark_core::{LatLng, MapsLimits, PathDistanceMatrixRequest};

#[derive(Debug, Default)]
struct TilingWorld {
    limits: RefCell<Option<MapsLimits>>,
    points: RefCell<Vec<LatLng>>,
    tiles: RefCell<Vec<TiledRequest>>,
    windows: RefCell<Vec<PathDistanceMatrixRequest>>,
}

impl TilingWorld {
    fn limits(&self) -> MapsLimits {
        self.limits.borrow().expect("limits configured")
    }
}

#[fixture]
fn world() -> TilingWorld {
    TilingWorld::default()
}

#[given("a provider accepting four matrix elements per call")]
fn four_elements(world: &TilingWorld) {
    world
        .limits
        .replace(Some(MapsLimits::new(27, 4).expect("valid limits")));
}

#[given("a provider accepting three waypoints per route call")]
fn three_waypoints(world: &TilingWorld) {
    world
        .limits
        .replace(Some(MapsLimits::new(3, 100).expect("valid limits")));
}

#[when("a three by three matrix is tiled")]
fn tile_three_by_three(world: &TilingWorld) {
    let points = gen_latlngs(3);
    let tiles = distance_matrix_requests(&points, &points, &world.limits());
    world.points.replace(points);
    world.tiles.replace(tiles);
}

#[when("a four point path is tiled")]
fn tile_four_points(world: &TilingWorld) {
    let points = gen_latlngs(4);
    let windows = path_distance_matrix_requests(&points, &world.limits());
    world.points.replace(points);
    world.windows.replace(windows);
}

#[when("a one point path is tiled")]
fn tile_one_point(world: &TilingWorld) {
    let points = gen_latlngs(1);
    let windows = path_distance_matrix_requests(&points, &world.limits());
    world.points.replace(points);
    world.windows.replace(windows);
}

#[then("four tiles are produced at the corner offsets")]
fn four_corner_tiles(world: &TilingWorld) {
    let offsets: Vec<_> = world
        .tiles
        .borrow()
        .iter()
        .map(|t| (t.tile.row_offset, t.tile.column_offset))
        .collect();
    assert_eq!(offsets, [(0, 0), (0, 2), (2, 0), (2, 2)]);
}

#[then("two windows sharing the third point are produced")]
fn two_windows(world: &TilingWorld) {
    let points = world.points.borrow();
    let windows: Vec<_> = world.windows.borrow().iter().map(|w| w.path.clone()).collect();
    assert_eq!(windows, [points[0..3].to_vec(), points[2..4].to_vec()]);
}

#[then("no windows are produced")]
fn no_windows(world: &TilingWorld) {
    assert!(world.windows.borrow().is_empty());
}

#[scenario(path = "tests/features/tiling.feature", index = 0)]
fn rectangular_tiling(world: TilingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/tiling.feature", index = 1)]
fn path_tiling(world: TilingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/tiling.feature", index = 2)]
fn single_point_path(world: TilingWorld) {
    let _ = world;
}
