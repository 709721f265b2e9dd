//! Region-based choice between the self-hosted engine and a commercial
//! provider.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::{MapService, MapServiceError, RegionSettings, RequestContext, SettingsService};

/// Resolves which [`MapService`] serves a service region.
///
/// The self-hosted engine is always configured; the commercial provider is
/// optional. Without a commercial provider every region is served by the
/// self-hosted engine regardless of its settings.
pub struct MapServicePicker {
    osrm: Arc<dyn MapService>,
    default_maps: Option<Arc<dyn MapService>>,
    other_map_services: HashMap<i64, Vec<Arc<dyn MapService>>>,
    settings: Arc<dyn SettingsService>,
}

impl MapServicePicker {
    /// Build a picker and precompute, per distance source, the other
    /// configured services.
    #[must_use]
    pub fn new(
        osrm: Arc<dyn MapService>,
        default_maps: Option<Arc<dyn MapService>>,
        settings: Arc<dyn SettingsService>,
    ) -> Self {
        let all: Vec<Arc<dyn MapService>> = std::iter::once(Arc::clone(&osrm))
            .chain(default_maps.iter().cloned())
            .collect();
        let other_map_services = all
            .iter()
            .map(|service| {
                let id = service.distance_source_id();
                let others = all
                    .iter()
                    .filter(|other| other.distance_source_id() != id)
                    .cloned()
                    .collect();
                (id, others)
            })
            .collect();
        Self {
            osrm,
            default_maps,
            other_map_services,
            settings,
        }
    }

    /// The service answering distance and route calls for `region_id`.
    ///
    /// # Errors
    /// Returns [`MapServiceError::Settings`] when the settings lookup fails.
    pub async fn map_service_for_region(
        &self,
        ctx: &RequestContext,
        region_id: i64,
    ) -> Result<Arc<dyn MapService>, MapServiceError> {
        let settings = self.region_settings(ctx, region_id).await?;
        Ok(self.base_service(settings))
    }

    /// The configured services other than the one serving `region_id`.
    ///
    /// # Errors
    /// Returns [`MapServiceError::Settings`] when the settings lookup fails.
    pub async fn other_map_services_for_region(
        &self,
        ctx: &RequestContext,
        region_id: i64,
    ) -> Result<Vec<Arc<dyn MapService>>, MapServiceError> {
        let service = self.map_service_for_region(ctx, region_id).await?;
        Ok(self
            .other_map_services
            .get(&service.distance_source_id())
            .cloned()
            .unwrap_or_default())
    }

    /// The service answering real-time traffic queries for `region_id`.
    ///
    /// A region that asks for commercial real-time traffic gets the
    /// commercial provider when one is configured; otherwise the base choice
    /// applies.
    ///
    /// # Errors
    /// Returns [`MapServiceError::Settings`] when the settings lookup fails.
    pub async fn real_time_traffic_map_service(
        &self,
        ctx: &RequestContext,
        region_id: i64,
    ) -> Result<Arc<dyn MapService>, MapServiceError> {
        let settings = self.region_settings(ctx, region_id).await?;
        match &self.default_maps {
            Some(default) if settings.use_google_maps_for_real_time_traffic => {
                Ok(Arc::clone(default))
            }
            _ => Ok(self.base_service(settings)),
        }
    }

    async fn region_settings(
        &self,
        ctx: &RequestContext,
        region_id: i64,
    ) -> Result<RegionSettings, MapServiceError> {
        self.settings
            .service_region_settings(ctx, region_id)
            .await
            .map_err(|err| {
                warn!("map service picker could not resolve region {region_id}: {err}");
                MapServiceError::Settings(err)
            })
    }

    fn base_service(&self, settings: RegionSettings) -> Arc<dyn MapService> {
        match &self.default_maps {
            Some(default) if !settings.use_osrm_map_service => Arc::clone(default),
            _ => Arc::clone(&self.osrm),
        }
    }
}

impl fmt::Debug for MapServicePicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapServicePicker")
            .field("osrm", &self.osrm.distance_source_id())
            .field(
                "default_maps",
                &self.default_maps.as_ref().map(|s| s.distance_source_id()),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests should fail fast when setup breaks"
    )]

    use super::*;
    use crate::SettingsError;
    use crate::test_support::{MockSettingsService, StubMapService};
    use rstest::{fixture, rstest};

    const OSRM_ID: i64 = 1;
    const GOOGLE_ID: i64 = 2;
    const REGION: i64 = 42;

    #[fixture]
    fn osrm() -> Arc<dyn MapService> {
        Arc::new(StubMapService::new(OSRM_ID))
    }

    #[fixture]
    fn google() -> Arc<dyn MapService> {
        Arc::new(StubMapService::new(GOOGLE_ID))
    }

    fn picker(
        osrm: Arc<dyn MapService>,
        google: Option<Arc<dyn MapService>>,
        settings: RegionSettings,
    ) -> MapServicePicker {
        MapServicePicker::new(
            osrm,
            google,
            Arc::new(MockSettingsService::new().with_region(REGION, settings)),
        )
    }

    fn settings(force_osrm: bool, traffic: bool) -> RegionSettings {
        RegionSettings {
            use_osrm_map_service: force_osrm,
            use_google_maps_for_real_time_traffic: traffic,
        }
    }

    #[rstest]
    #[case(settings(false, false), GOOGLE_ID)]
    #[case(settings(true, false), OSRM_ID)]
    #[case(settings(false, true), GOOGLE_ID)]
    #[case(settings(true, true), OSRM_ID)]
    #[tokio::test]
    async fn base_choice_with_commercial_provider(
        osrm: Arc<dyn MapService>,
        google: Arc<dyn MapService>,
        #[case] region: RegionSettings,
        #[case] expected: i64,
    ) {
        let picker = picker(osrm, Some(google), region);
        let chosen = picker
            .map_service_for_region(&RequestContext::new(), REGION)
            .await
            .expect("settings resolve");
        assert_eq!(chosen.distance_source_id(), expected);
    }

    #[rstest]
    #[case(settings(false, false))]
    #[case(settings(true, true))]
    #[case(settings(false, true))]
    #[tokio::test]
    async fn without_commercial_provider_always_osrm(
        osrm: Arc<dyn MapService>,
        #[case] region: RegionSettings,
    ) {
        let picker = picker(osrm, None, region);
        let ctx = RequestContext::new();
        let base = picker
            .map_service_for_region(&ctx, REGION)
            .await
            .expect("settings resolve");
        let traffic = picker
            .real_time_traffic_map_service(&ctx, REGION)
            .await
            .expect("settings resolve");
        assert_eq!(base.distance_source_id(), OSRM_ID);
        assert_eq!(traffic.distance_source_id(), OSRM_ID);
        let others = picker
            .other_map_services_for_region(&ctx, REGION)
            .await
            .expect("settings resolve");
        assert!(others.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn real_time_traffic_overrides_forced_osrm(
        osrm: Arc<dyn MapService>,
        google: Arc<dyn MapService>,
    ) {
        let picker = picker(osrm, Some(google), settings(true, true));
        let chosen = picker
            .real_time_traffic_map_service(&RequestContext::new(), REGION)
            .await
            .expect("settings resolve");
        assert_eq!(chosen.distance_source_id(), GOOGLE_ID);
    }

    #[rstest]
    #[tokio::test]
    async fn other_services_exclude_the_chosen_one(
        osrm: Arc<dyn MapService>,
        google: Arc<dyn MapService>,
    ) {
        let picker = picker(osrm, Some(google), settings(false, false));
        let others = picker
            .other_map_services_for_region(&RequestContext::new(), REGION)
            .await
            .expect("settings resolve");
        let ids: Vec<_> = others.iter().map(|s| s.distance_source_id()).collect();
        assert_eq!(ids, [OSRM_ID]);
    }

    #[rstest]
    #[tokio::test]
    async fn settings_failure_propagates(osrm: Arc<dyn MapService>, google: Arc<dyn MapService>) {
        let picker = MapServicePicker::new(
            osrm,
            Some(google),
            Arc::new(MockSettingsService::failing("store offline")),
        );
        let err = picker
            .map_service_for_region(&RequestContext::new(), REGION)
            .await
            .err()
            .expect("lookup fails");
        assert_eq!(
            err,
            MapServiceError::Settings(SettingsError::Unavailable {
                region_id: REGION,
                message: "store offline".to_owned(),
            })
        );
    }
}
