//! Provider-neutral request shapes produced by the tiling engine.

use crate::{LatLng, MapServiceError, MapsLimits, RouteModifiers, RoutingPreference};

/// One rectangular matrix call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistanceMatrixRequest {
    /// Row coordinates.
    pub origins: Vec<LatLng>,
    /// Column coordinates.
    pub destinations: Vec<LatLng>,
    /// Modifiers required by the provider.
    pub route_modifiers: Option<RouteModifiers>,
    /// Preference required by the provider.
    pub routing_preference: RoutingPreference,
}

impl DistanceMatrixRequest {
    /// Build a request carrying the options mandated by `limits`.
    #[must_use]
    pub fn new(origins: Vec<LatLng>, destinations: Vec<LatLng>, limits: &MapsLimits) -> Self {
        Self {
            origins,
            destinations,
            route_modifiers: limits.route_modifiers(),
            routing_preference: limits.routing_preference(),
        }
    }

    /// Number of cells the provider bills for.
    #[must_use]
    pub fn size(&self) -> usize {
        self.origins.len() * self.destinations.len()
    }
}

/// One route call whose legs become matrix cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathDistanceMatrixRequest {
    /// Ordered waypoints of this window.
    pub path: Vec<LatLng>,
    /// Modifiers required by the provider.
    pub route_modifiers: Option<RouteModifiers>,
    /// Preference required by the provider.
    pub routing_preference: RoutingPreference,
}

impl PathDistanceMatrixRequest {
    /// Build a request carrying the options mandated by `limits`.
    #[must_use]
    pub fn new(path: Vec<LatLng>, limits: &MapsLimits) -> Self {
        Self {
            path,
            route_modifiers: limits.route_modifiers(),
            routing_preference: limits.routing_preference(),
        }
    }

    /// Number of legs, one per consecutive waypoint pair.
    #[must_use]
    pub fn legs(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// First waypoint.
    #[must_use]
    pub fn origin(&self) -> Option<LatLng> {
        self.path.first().copied()
    }

    /// Last waypoint.
    #[must_use]
    pub fn destination(&self) -> Option<LatLng> {
        self.path.last().copied()
    }

    /// Waypoints strictly between the first and the last.
    #[must_use]
    pub fn intermediates(&self) -> &[LatLng] {
        intermediates(&self.path)
    }
}

/// A validated point-to-point route call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsRequest {
    /// Start of the route.
    pub origin: LatLng,
    /// End of the route.
    pub destination: LatLng,
    /// Stop-overs, in order.
    pub intermediates: Vec<LatLng>,
}

impl DirectionsRequest {
    /// Split `waypoints` into origin, stop-overs and destination.
    ///
    /// # Errors
    /// Returns [`MapServiceError::NotEnoughWaypoints`] for fewer than two
    /// waypoints and [`MapServiceError::TooManyWaypoints`] when `limits` does
    /// not admit that many.
    pub fn for_waypoints(
        waypoints: &[LatLng],
        limits: &MapsLimits,
    ) -> Result<Self, MapServiceError> {
        if waypoints.len() > limits.max_route_waypoints() {
            return Err(MapServiceError::TooManyWaypoints {
                max: limits.max_route_waypoints(),
                got: waypoints.len(),
            });
        }
        match waypoints {
            [origin, stop_overs @ .., destination] => Ok(Self {
                origin: *origin,
                destination: *destination,
                intermediates: stop_overs.to_vec(),
            }),
            _ => Err(MapServiceError::NotEnoughWaypoints {
                min: 2,
                got: waypoints.len(),
            }),
        }
    }

    /// Number of legs in the route.
    #[must_use]
    pub fn legs(&self) -> usize {
        self.intermediates.len() + 1
    }

    /// All waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> Vec<LatLng> {
        let mut all = Vec::with_capacity(self.intermediates.len() + 2);
        all.push(self.origin);
        all.extend_from_slice(&self.intermediates);
        all.push(self.destination);
        all
    }
}

fn intermediates(path: &[LatLng]) -> &[LatLng] {
    path.get(1..path.len().saturating_sub(1)).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests should fail fast when setup breaks"
    )]

    use super::*;
    use rstest::rstest;

    fn points(n: i32) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::from_e6(i, i)).collect()
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn directions_rejects_short_paths(#[case] n: i32) {
        let err = DirectionsRequest::for_waypoints(&points(n), &MapsLimits::ADVANCED)
            .expect_err("short path");
        assert!(matches!(err, MapServiceError::NotEnoughWaypoints { min: 2, .. }));
    }

    #[rstest]
    fn directions_rejects_long_paths() {
        let err = DirectionsRequest::for_waypoints(&points(13), &MapsLimits::STANDARD)
            .expect_err("long path");
        assert_eq!(err, MapServiceError::TooManyWaypoints { max: 12, got: 13 });
    }

    #[rstest]
    #[case(2, 0)]
    #[case(3, 1)]
    #[case(12, 10)]
    fn directions_splits_stop_overs(#[case] n: i32, #[case] stops: usize) {
        let path = points(n);
        let req = DirectionsRequest::for_waypoints(&path, &MapsLimits::STANDARD)
            .expect("valid path");
        assert_eq!(req.intermediates.len(), stops);
        assert_eq!(req.waypoints(), path);
        assert_eq!(req.legs(), path.len() - 1);
    }

    #[rstest]
    fn matrix_request_inherits_limit_options() {
        let req = DistanceMatrixRequest::new(
            points(2),
            points(3),
            &MapsLimits::ROUTES_TRAFFIC_AWARE,
        );
        assert_eq!(req.size(), 6);
        assert_eq!(req.routing_preference, RoutingPreference::TrafficAware);
        assert_eq!(req.route_modifiers, Some(RouteModifiers::AVOID_FERRIES));
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 0, 0)]
    #[case(2, 1, 0)]
    #[case(5, 4, 3)]
    fn path_request_shape(#[case] n: i32, #[case] legs: usize, #[case] middle: usize) {
        let req = PathDistanceMatrixRequest::new(points(n), &MapsLimits::ADVANCED);
        assert_eq!(req.legs(), legs);
        assert_eq!(req.intermediates().len(), middle);
    }
}
