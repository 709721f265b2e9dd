//! Point-to-point routes.

use crate::{Distance, LatLng};

/// Ordered road geometry of a route.
pub type RoutePolyline = Vec<LatLng>;

/// A route returned by a provider.
///
/// `legs` holds one distance per consecutive pair of requested waypoints;
/// `distance` is the provider's aggregate for the whole route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    /// Road geometry, in travel order.
    pub polyline: RoutePolyline,
    /// Aggregate distance.
    pub distance: Distance,
    /// Per-leg distances.
    pub legs: Vec<Distance>,
}

impl Route {
    /// Construct a route from its parts.
    #[must_use]
    pub const fn new(polyline: RoutePolyline, distance: Distance, legs: Vec<Distance>) -> Self {
        Self {
            polyline,
            distance,
            legs,
        }
    }

    /// Construct a route whose aggregate is the sum of its legs.
    #[must_use]
    pub fn from_legs(polyline: RoutePolyline, legs: Vec<Distance>) -> Self {
        let distance = legs
            .iter()
            .copied()
            .fold(Distance::ZERO, |total, leg| total + leg);
        Self {
            polyline,
            distance,
            legs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn from_legs_sums_aggregate() {
        let legs = vec![
            Distance::new(Duration::from_secs(60), 1_000),
            Distance::new(Duration::from_secs(30), 400),
        ];
        let route = Route::from_legs(vec![LatLng::from_e6(1, 1)], legs);
        assert_eq!(
            route.distance,
            Distance::new(Duration::from_secs(90), 1_400)
        );
        assert_eq!(route.legs.len(), 2);
    }
}
