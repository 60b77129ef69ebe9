//! Great-circle distance on a spherical Earth
//!
//! Spherical law of cosines, expressed in nautical miles (one minute of arc)
//! and converted to statute miles.

use crate::domain::types::Coordinate;

pub const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.150_779_45;

/// Nautical miles per degree of arc
const NAUTICAL_MILES_PER_DEGREE: f64 = 60.0;

/// Distance between two coordinates in statute miles.
///
/// The cosine argument is clamped to [-1, 1] so rounding at coincident or
/// antipodal points never yields NaN.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lon = (a.longitude - b.longitude).abs().to_radians();

    let cos_angle =
        (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * delta_lon.cos()).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();

    let nautical_miles = NAUTICAL_MILES_PER_DEGREE * angle.to_degrees();
    STATUTE_MILES_PER_NAUTICAL_MILE * nautical_miles
}
