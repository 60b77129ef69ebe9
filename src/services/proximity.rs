//! Proximity matching between location fixes and attractions
//!
//! The reward threshold is owned by the matcher instance (not a static), may
//! be overridden or reset at runtime, and applies to every later match.

use crate::domain::geo;
use crate::domain::{Attraction, Coordinate};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// True if `location` counts as a visit to `attraction` under `threshold_miles`
#[inline]
pub fn is_near(location: &Coordinate, attraction: &Attraction, threshold_miles: f64) -> bool {
    // Exact coincidence is a visit regardless of threshold or rounding
    if *location == attraction.location {
        return true;
    }
    geo::distance(location, &attraction.location) <= threshold_miles
}

/// Holds the reward proximity threshold and the wider attraction range
#[derive(Debug)]
pub struct ProximityMatcher {
    default_buffer_miles: f64,
    /// Current threshold, stored as f64 bits
    buffer_bits: AtomicU64,
    attraction_range_miles: f64,
}

impl ProximityMatcher {
    pub fn new(default_buffer_miles: f64, attraction_range_miles: f64) -> Self {
        Self {
            default_buffer_miles,
            buffer_bits: AtomicU64::new(default_buffer_miles.to_bits()),
            attraction_range_miles,
        }
    }

    /// Current reward proximity threshold in miles
    #[inline]
    pub fn proximity_buffer(&self) -> f64 {
        f64::from_bits(self.buffer_bits.load(Ordering::Acquire))
    }

    /// Override the threshold. Negative or NaN values are rejected and the
    /// current threshold is kept; returns whether the override was applied.
    pub fn set_proximity_buffer(&self, miles: f64) -> bool {
        if miles.is_nan() || miles < 0.0 {
            warn!(proximity_buffer_miles = %miles, "proximity_buffer_rejected");
            return false;
        }
        self.buffer_bits.store(miles.to_bits(), Ordering::Release);
        info!(proximity_buffer_miles = %miles, "proximity_buffer_set");
        true
    }

    pub fn reset_proximity_buffer(&self) {
        self.buffer_bits.store(self.default_buffer_miles.to_bits(), Ordering::Release);
        info!(proximity_buffer_miles = %self.default_buffer_miles, "proximity_buffer_reset");
    }

    pub fn default_proximity_buffer(&self) -> f64 {
        self.default_buffer_miles
    }

    pub fn attraction_range(&self) -> f64 {
        self.attraction_range_miles
    }

    /// Reward-worthiness under the current threshold
    #[inline]
    pub fn is_near(&self, location: &Coordinate, attraction: &Attraction) -> bool {
        is_near(location, attraction, self.proximity_buffer())
    }

    /// Whether a point is within general range of an attraction
    pub fn is_within_attraction_proximity(&self, attraction: &Attraction, location: &Coordinate) -> bool {
        geo::distance(&attraction.location, location) <= self.attraction_range_miles
    }
}

impl Default for ProximityMatcher {
    fn default() -> Self {
        Self::new(10.0, 200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_attraction() -> Attraction {
        Attraction::new("Origin", "Null Island", "", 0.0, 0.0)
    }

    #[test]
    fn test_coincident_is_near_regardless_of_threshold() {
        let attraction = origin_attraction();
        let here = Coordinate::new(0.0, 0.0);
        assert!(is_near(&here, &attraction, 0.0));
        assert!(is_near(&here, &attraction, -1.0));
        assert_eq!(geo::distance(&here, &attraction.location), 0.0);
    }

    #[test]
    fn test_one_degree_away() {
        let attraction = origin_attraction();
        let here = Coordinate::new(0.0, 1.0);
        assert!(!is_near(&here, &attraction, 10.0));
        assert!(is_near(&here, &attraction, 100.0));
    }

    #[test]
    fn test_threshold_monotonicity() {
        let attraction = Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008);
        let points = [
            Coordinate::new(33.9, -117.9),
            Coordinate::new(34.5, -118.5),
            Coordinate::new(40.0, -100.0),
            Coordinate::new(-33.8, 62.0),
        ];
        let thresholds = [0.0, 1.0, 10.0, 50.0, 200.0, 1000.0, 13000.0];
        for p in &points {
            let mut was_near = false;
            for t in thresholds {
                let near = is_near(p, &attraction, t);
                assert!(near || !was_near, "match lost when threshold grew to {t}");
                was_near = near;
            }
        }
    }

    #[test]
    fn test_set_and_reset_buffer() {
        let matcher = ProximityMatcher::new(10.0, 200.0);
        let attraction = origin_attraction();
        let here = Coordinate::new(0.0, 1.0);

        assert_eq!(matcher.proximity_buffer(), 10.0);
        assert!(!matcher.is_near(&here, &attraction));

        matcher.set_proximity_buffer(100.0);
        assert!(matcher.is_near(&here, &attraction));

        matcher.reset_proximity_buffer();
        assert_eq!(matcher.proximity_buffer(), 10.0);
        assert!(!matcher.is_near(&here, &attraction));
    }

    #[test]
    fn test_invalid_buffer_is_rejected() {
        let matcher = ProximityMatcher::new(10.0, 200.0);
        assert!(matcher.set_proximity_buffer(25.0));

        assert!(!matcher.set_proximity_buffer(-1.0));
        assert_eq!(matcher.proximity_buffer(), 25.0);

        assert!(!matcher.set_proximity_buffer(f64::NAN));
        assert_eq!(matcher.proximity_buffer(), 25.0);

        assert!(matcher.set_proximity_buffer(0.0));
        assert_eq!(matcher.proximity_buffer(), 0.0);
    }

    #[test]
    fn test_matchers_are_isolated() {
        let a = ProximityMatcher::new(10.0, 200.0);
        let b = ProximityMatcher::new(10.0, 200.0);
        a.set_proximity_buffer(5000.0);
        assert_eq!(b.proximity_buffer(), 10.0);
    }

    #[test]
    fn test_attraction_range() {
        let matcher = ProximityMatcher::default();
        let attraction = origin_attraction();
        // ~69 miles: outside reward buffer, inside general range
        let here = Coordinate::new(0.0, 1.0);
        assert!(!matcher.is_near(&here, &attraction));
        assert!(matcher.is_within_attraction_proximity(&attraction, &here));
        // ~345 miles: outside both
        let far = Coordinate::new(0.0, 5.0);
        assert!(!matcher.is_within_attraction_proximity(&attraction, &far));
    }
}
