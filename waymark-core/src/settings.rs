//! Per-region provider preferences supplied by an external settings store.

use async_trait::async_trait;
use thiserror::Error;

use crate::RequestContext;

/// Routing preferences for one service region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionSettings {
    /// Force the self-hosted engine even when a commercial provider exists.
    pub use_osrm_map_service: bool,
    /// Serve real-time traffic routing from the commercial provider.
    pub use_google_maps_for_real_time_traffic: bool,
}

/// Errors from a [`SettingsService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The store has no settings for the region.
    #[error("no settings for service region {region_id}")]
    UnknownRegion {
        /// Region that was looked up.
        region_id: i64,
    },
    /// The store could not be queried.
    #[error("settings lookup for service region {region_id} failed: {message}")]
    Unavailable {
        /// Region that was looked up.
        region_id: i64,
        /// Store error text.
        message: String,
    },
}

/// Source of per-region routing preferences.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Load settings for `region_id`.
    async fn service_region_settings(
        &self,
        ctx: &RequestContext,
        region_id: i64,
    ) -> Result<RegionSettings, SettingsError>;
}
