//! Per-provider quota limits and routing options.

use thiserror::Error;

/// Features a route should avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RouteModifiers {
    /// Avoid toll roads where reasonable.
    pub avoid_tolls: bool,
    /// Avoid highways where reasonable.
    pub avoid_highways: bool,
    /// Avoid ferries where reasonable.
    pub avoid_ferries: bool,
}

impl RouteModifiers {
    /// Only avoid ferries.
    pub const AVOID_FERRIES: Self = Self {
        avoid_tolls: false,
        avoid_highways: false,
        avoid_ferries: true,
    };
}

/// How much live traffic the provider should take into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoutingPreference {
    /// Leave the choice to the provider.
    #[default]
    Unspecified,
    /// Ignore live traffic.
    TrafficUnaware,
    /// Account for live traffic with latency optimisations.
    TrafficAware,
    /// Account for live traffic without latency optimisations.
    TrafficAwareOptimal,
}

impl RoutingPreference {
    /// Enum name used in protobuf JSON bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "ROUTING_PREFERENCE_UNSPECIFIED",
            Self::TrafficUnaware => "TRAFFIC_UNAWARE",
            Self::TrafficAware => "TRAFFIC_AWARE",
            Self::TrafficAwareOptimal => "TRAFFIC_AWARE_OPTIMAL",
        }
    }
}

/// Errors from [`MapsLimits::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitsError {
    /// A route must have room for an origin and a destination.
    #[error("max route waypoints must be at least 2, got {0}")]
    TooFewRouteWaypoints(usize),
    /// A matrix call must admit at least one element.
    #[error("max distance matrix elements must be at least 1")]
    NoMatrixElements,
}

/// Quota limits and mandatory options of one routing backend.
///
/// # Examples
///
/// ```
/// use waymark_core::{MapsLimits, RoutingPreference};
///
/// let limits = MapsLimits::ROUTES_TRAFFIC_AWARE;
/// assert_eq!(limits.max_distance_matrix_elems(), 625);
/// assert_eq!(limits.routing_preference(), RoutingPreference::TrafficAware);
///
/// let custom = MapsLimits::new(5, 16)?;
/// assert_eq!(custom.max_route_waypoints(), 5);
/// # Ok::<(), waymark_core::LimitsError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapsLimits {
    max_route_waypoints: usize,
    max_distance_matrix_elems: usize,
    route_modifiers: Option<RouteModifiers>,
    routing_preference: RoutingPreference,
}

impl MapsLimits {
    /// Legacy Directions / Distance Matrix API, advanced tier.
    pub const ADVANCED: Self = Self::preset(27, 100, None, RoutingPreference::Unspecified);
    /// Legacy Directions / Distance Matrix API, standard tier.
    pub const STANDARD: Self = Self::preset(12, 10, None, RoutingPreference::Unspecified);
    /// Routes API with traffic-aware routing.
    pub const ROUTES_TRAFFIC_AWARE: Self = Self::preset(
        27,
        625,
        Some(RouteModifiers::AVOID_FERRIES),
        RoutingPreference::TrafficAware,
    );
    /// Routes API with traffic-aware-optimal routing.
    pub const ROUTES_TRAFFIC_AWARE_OPTIMAL: Self = Self::preset(
        27,
        100,
        Some(RouteModifiers::AVOID_FERRIES),
        RoutingPreference::TrafficAwareOptimal,
    );

    const fn preset(
        max_route_waypoints: usize,
        max_distance_matrix_elems: usize,
        route_modifiers: Option<RouteModifiers>,
        routing_preference: RoutingPreference,
    ) -> Self {
        Self {
            max_route_waypoints,
            max_distance_matrix_elems,
            route_modifiers,
            routing_preference,
        }
    }

    /// Validate and build custom limits with no mandatory options.
    ///
    /// # Errors
    /// Returns [`LimitsError`] when fewer than two route waypoints or zero
    /// matrix elements are allowed.
    pub const fn new(
        max_route_waypoints: usize,
        max_distance_matrix_elems: usize,
    ) -> Result<Self, LimitsError> {
        if max_route_waypoints < 2 {
            return Err(LimitsError::TooFewRouteWaypoints(max_route_waypoints));
        }
        if max_distance_matrix_elems == 0 {
            return Err(LimitsError::NoMatrixElements);
        }
        Ok(Self::preset(
            max_route_waypoints,
            max_distance_matrix_elems,
            None,
            RoutingPreference::Unspecified,
        ))
    }

    /// Attach route modifiers every request must carry.
    #[must_use]
    pub const fn with_route_modifiers(mut self, modifiers: RouteModifiers) -> Self {
        self.route_modifiers = Some(modifiers);
        self
    }

    /// Attach the routing preference every request must carry.
    #[must_use]
    pub const fn with_routing_preference(mut self, preference: RoutingPreference) -> Self {
        self.routing_preference = preference;
        self
    }

    /// Waypoints accepted by one route call, origin and destination included.
    #[must_use]
    pub const fn max_route_waypoints(&self) -> usize {
        self.max_route_waypoints
    }

    /// Origin × destination cells accepted by one matrix call.
    #[must_use]
    pub const fn max_distance_matrix_elems(&self) -> usize {
        self.max_distance_matrix_elems
    }

    /// Mandatory route modifiers, if any.
    #[must_use]
    pub const fn route_modifiers(&self) -> Option<RouteModifiers> {
        self.route_modifiers
    }

    /// Mandatory routing preference.
    #[must_use]
    pub const fn routing_preference(&self) -> RoutingPreference {
        self.routing_preference
    }
}

impl Default for MapsLimits {
    fn default() -> Self {
        Self::ADVANCED
    }
}
