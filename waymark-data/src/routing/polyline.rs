//! Encoded polyline decoding.

use waymark_core::{LatLng, MapServiceError, RoutePolyline};

/// Precision of Google encoded polylines (five decimal places).
const GOOGLE_PRECISION: u32 = 5;

/// Decode a Google encoded polyline into fixed-point coordinates.
///
/// # Errors
/// Returns [`MapServiceError::Parse`] for malformed input.
pub fn decode(encoded: &str) -> Result<RoutePolyline, MapServiceError> {
    let line = ::polyline::decode_polyline(encoded, GOOGLE_PRECISION)
        .map_err(MapServiceError::parse)?;
    Ok(line.coords().map(|coord| LatLng::from(*coord)).collect())
}
