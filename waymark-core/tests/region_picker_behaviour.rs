//! Behavioural coverage for [`MapServicePicker`].
#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use tokio::runtime::Builder;
use waymark_core::test_support::{MockSettingsService, StubMapService};
use waymark_core::{
    MapService, MapServiceError, MapServicePicker, RegionSettings, RequestContext,
};

const OSRM_ID: i64 = 10;
const GOOGLE_ID: i64 = 20;
const REGION: i64 = 7;

#[derive(Debug, Default)]
struct PickerWorld {
    with_commercial: Cell<bool>,
    settings: RefCell<Option<MockSettingsService>>,
    chosen: RefCell<Option<Result<i64, MapServiceError>>>,
}

impl PickerWorld {
    fn picker(&self) -> MapServicePicker {
        let osrm: Arc<dyn MapService> = Arc::new(StubMapService::new(OSRM_ID));
        let google: Option<Arc<dyn MapService>> = if self.with_commercial.get() {
            Some(Arc::new(StubMapService::new(GOOGLE_ID)))
        } else {
            None
        };
        let settings = self
            .settings
            .borrow()
            .clone()
            .expect("region settings configured");
        MapServicePicker::new(osrm, google, Arc::new(settings))
    }

    fn set_region(&self, settings: RegionSettings) {
        self.settings
            .replace(Some(MockSettingsService::new().with_region(REGION, settings)));
    }
}

#[fixture]
fn world() -> PickerWorld {
    PickerWorld::default()
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

#[given("OSRM and a commercial provider are configured")]
fn both_configured(world: &PickerWorld) {
    world.with_commercial.set(true);
}

#[given("only OSRM is configured")]
fn only_osrm(world: &PickerWorld) {
    world.with_commercial.set(false);
}

#[given("the region does not force OSRM")]
fn region_default(world: &PickerWorld) {
    world.set_region(RegionSettings::default());
}

#[given("the region forces OSRM")]
fn region_forces_osrm(world: &PickerWorld) {
    world.set_region(RegionSettings {
        use_osrm_map_service: true,
        use_google_maps_for_real_time_traffic: false,
    });
}

#[given("the region forces OSRM but asks for commercial real-time traffic")]
fn region_wants_traffic(world: &PickerWorld) {
    world.set_region(RegionSettings {
        use_osrm_map_service: true,
        use_google_maps_for_real_time_traffic: true,
    });
}

#[given("the settings store is offline")]
fn store_offline(world: &PickerWorld) {
    world
        .settings
        .replace(Some(MockSettingsService::failing("connection refused")));
}

#[when("the map service for the region is resolved")]
fn resolve_base(world: &PickerWorld) {
    let picker = world.picker();
    let outcome = block_on(picker.map_service_for_region(&RequestContext::new(), REGION))
        .map(|service| service.distance_source_id());
    world.chosen.replace(Some(outcome));
}

#[when("the real-time traffic map service for the region is resolved")]
fn resolve_traffic(world: &PickerWorld) {
    let picker = world.picker();
    let outcome =
        block_on(picker.real_time_traffic_map_service(&RequestContext::new(), REGION))
            .map(|service| service.distance_source_id());
    world.chosen.replace(Some(outcome));
}

#[then("the commercial provider is chosen")]
fn commercial_chosen(world: &PickerWorld) {
    assert_eq!(*world.chosen.borrow(), Some(Ok(GOOGLE_ID)));
}

#[then("OSRM is chosen")]
fn osrm_chosen(world: &PickerWorld) {
    assert_eq!(*world.chosen.borrow(), Some(Ok(OSRM_ID)));
}

#[then("a settings error is returned")]
fn settings_error(world: &PickerWorld) {
    let chosen = world.chosen.borrow();
    assert!(
        matches!(&*chosen, Some(Err(MapServiceError::Settings(_)))),
        "expected a settings error, got {chosen:?}"
    );
}

#[scenario(path = "tests/features/region_picker.feature", index = 0)]
fn commercial_by_default(world: PickerWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_picker.feature", index = 1)]
fn forced_osrm(world: PickerWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_picker.feature", index = 2)]
fn osrm_only(world: PickerWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_picker.feature", index = 3)]
fn traffic_override(world: PickerWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/region_picker.feature", index = 4)]
fn settings_failure(world: PickerWorld) {
    let _ = world;
}
