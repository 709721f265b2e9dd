//! Behavioural coverage for the fan-out executor.
#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::time::Duration;
use tokio::runtime::Builder;
use waymark_core::{MapServiceError, RequestContext, fan_out};

/// A tile that sleeps for `delay` then succeeds or fails.
#[derive(Debug, Clone, Copy)]
struct Tile {
    id: u32,
    delay: Duration,
    fails: bool,
}

#[derive(Debug, Default)]
struct FanOutWorld {
    tiles: RefCell<Vec<Tile>>,
    result: RefCell<Option<Result<Vec<u32>, MapServiceError>>>,
}

#[fixture]
fn world() -> FanOutWorld {
    FanOutWorld::default()
}

fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime")
        .block_on(future)
}

#[given("four tile requests where the third fails with HTTP 503")]
fn third_fails(world: &FanOutWorld) {
    world.tiles.replace(
        (0..4)
            .map(|id| Tile {
                id,
                delay: Duration::from_millis(if id == 2 { 5 } else { 200 }),
                fails: id == 2,
            })
            .collect(),
    );
}

#[given("four tile requests finishing in reverse order")]
fn reverse_order(world: &FanOutWorld) {
    world.tiles.replace(
        (0..4)
            .map(|id| Tile {
                id,
                delay: Duration::from_millis(u64::from(4 - id) * 15),
                fails: false,
            })
            .collect(),
    );
}

#[when("the tiles are fanned out")]
fn fanned_out(world: &FanOutWorld) {
    let tiles = world.tiles.borrow().clone();
    let outcome = block_on(fan_out(&RequestContext::new(), tiles, |_ctx, tile| async move {
        tokio::time::sleep(tile.delay).await;
        if tile.fails {
            Err(MapServiceError::Http { status: 503 })
        } else {
            Ok(tile.id)
        }
    }));
    world.result.replace(Some(outcome));
}

#[then("the call fails with HTTP 503")]
fn fails_with_503(world: &FanOutWorld) {
    let result = world.result.borrow();
    assert!(
        matches!(&*result, Some(Err(MapServiceError::Http { status: 503 }))),
        "expected HTTP 503, got {result:?}"
    );
}

#[then("no partial results are returned")]
fn no_partial_results(world: &FanOutWorld) {
    assert!(
        world
            .result
            .borrow()
            .as_ref()
            .is_some_and(Result::is_err)
    );
}

#[then("the results are in submission order")]
fn submission_order(world: &FanOutWorld) {
    let result = world.result.borrow();
    let ids = result
        .as_ref()
        .expect("fan-out ran")
        .as_ref()
        .expect("all tiles succeed");
    assert_eq!(ids, &[0, 1, 2, 3]);
}

#[scenario(path = "tests/features/fan_out.feature", index = 0)]
fn failing_tile(world: FanOutWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/fan_out.feature", index = 1)]
fn ordered_results(world: FanOutWorld) {
    let _ = world;
}
