//! Attraction catalog and live location fixes
//!
//! `AttractionSource` is the boundary to the GPS provider. `GpsSimulator`
//! stands in for it: a fixed catalog and uniformly random fixes.

use crate::domain::{Attraction, Coordinate, TourGuideError, UserId, VisitedLocation};
use crate::infra::config::AttractionEntry;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Latitude bounds of the Web Mercator projection used for random fixes
const MAX_LATITUDE: f64 = 85.051_128_78;
const MAX_LONGITUDE: f64 = 180.0;

/// Source of the attraction catalog and of live user location fixes
#[async_trait]
pub trait AttractionSource: Send + Sync {
    /// Full catalog, fetched fresh on every call
    async fn attractions(&self) -> Result<Vec<Attraction>, TourGuideError>;

    /// A live location fix for the user (may block on the provider)
    async fn user_location(&self, user_id: UserId) -> Result<VisitedLocation, TourGuideError>;
}

/// Built-in catalog: (name, city, state, latitude, longitude)
const DEFAULT_CATALOG: [(&str, &str, &str, f64, f64); 26] = [
    ("Disneyland", "Anaheim", "CA", 33.817595, -117.922008),
    ("Jackson Hole", "Jackson Hole", "WY", 43.582767, -110.821999),
    ("Mojave National Preserve", "Kelso", "CA", 35.141689, -115.510399),
    ("Joshua Tree National Park", "Joshua Tree National Park", "CA", 33.881866, -115.90065),
    ("Buffalo National River", "St Joe", "AR", 35.985512, -92.757652),
    ("Hot Springs National Park", "Hot Springs", "AR", 34.52153, -93.042267),
    ("Kartchner Caverns State Park", "Benson", "AZ", 31.837551, -110.347382),
    ("Legend Valley", "Thornville", "OH", 39.937778, -82.40667),
    ("Flowers Bakery of London", "Flowers Bakery of London", "KY", 37.131527, -84.07486),
    ("McKinley Tower", "Anchorage", "AK", 61.218887, -149.877502),
    ("Flatiron Building", "New York City", "NY", 40.741112, -73.989723),
    ("Fallingwater", "Mill Run", "PA", 39.906113, -79.468056),
    ("Union Station", "Washington D.C.", "CA", 38.897095, -77.006332),
    ("Roger Dean Stadium", "Jupiter", "FL", 26.890959, -80.116577),
    ("Texas Memorial Stadium", "Austin", "TX", 30.283682, -97.732536),
    ("Bryant-Denny Stadium", "Tuscaloosa", "AL", 33.208973, -87.550438),
    ("Tiger Stadium", "Baton Rouge", "LA", 30.412035, -91.183815),
    ("Neyland Stadium", "Knoxville", "TN", 35.955013, -83.925011),
    ("Kyle Field", "College Station", "TX", 30.61025, -96.339836),
    ("San Diego Zoo", "San Diego", "CA", 32.735317, -117.149048),
    ("Zoo Tampa at Lowry Park", "Tampa", "FL", 28.012804, -82.469269),
    ("Franklin Park Zoo", "Boston", "MA", 42.302601, -71.086731),
    ("El Paso Zoo", "El Paso", "TX", 31.769125, -106.44487),
    ("Kansas City Zoo", "Kansas City", "MO", 39.007504, -94.529625),
    ("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971),
    ("Cinderella Castle", "Orlando", "FL", 28.419411, -81.5812),
];

/// Build the attraction catalog from config, or the built-in list if empty
pub fn catalog_from_entries(entries: &[AttractionEntry]) -> Vec<Attraction> {
    if entries.is_empty() {
        return DEFAULT_CATALOG
            .iter()
            .map(|&(name, city, state, lat, lon)| Attraction::new(name, city, state, lat, lon))
            .collect();
    }
    entries
        .iter()
        .map(|e| Attraction::new(&e.name, &e.city, &e.state, e.latitude, e.longitude))
        .collect()
}

/// Uniformly random coordinate within the mapped latitude band
pub fn random_coordinate<R: Rng + ?Sized>(rng: &mut R) -> Coordinate {
    Coordinate::new(
        rng.random_range(-MAX_LATITUDE..=MAX_LATITUDE),
        rng.random_range(-MAX_LONGITUDE..=MAX_LONGITUDE),
    )
}

/// Simulated GPS provider
pub struct GpsSimulator {
    catalog: Vec<Attraction>,
    latency: Duration,
}

impl GpsSimulator {
    pub fn new(catalog: Vec<Attraction>, latency_ms: u64) -> Self {
        Self { catalog, latency: Duration::from_millis(latency_ms) }
    }

    /// Simulator over the built-in catalog with no added latency
    pub fn with_default_catalog() -> Self {
        Self::new(catalog_from_entries(&[]), 0)
    }
}

#[async_trait]
impl AttractionSource for GpsSimulator {
    async fn attractions(&self) -> Result<Vec<Attraction>, TourGuideError> {
        Ok(self.catalog.clone())
    }

    async fn user_location(&self, user_id: UserId) -> Result<VisitedLocation, TourGuideError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let location = random_coordinate(&mut rand::rng());
        debug!(user_id = %user_id, lat = %location.latitude, lon = %location.longitude, "gps_fix");
        Ok(VisitedLocation::new(user_id, location, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = catalog_from_entries(&[]);
        assert_eq!(catalog.len(), 26);
        assert_eq!(catalog[0].attraction_name, "Disneyland");
        assert_eq!(catalog[0].location, Coordinate::new(33.817595, -117.922008));
    }

    #[test]
    fn test_catalog_override() {
        let entries = vec![AttractionEntry {
            name: "Eiffel Tower".to_string(),
            city: "Paris".to_string(),
            state: String::new(),
            latitude: 48.8584,
            longitude: 2.2945,
        }];
        let catalog = catalog_from_entries(&entries);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].attraction_name, "Eiffel Tower");
    }

    #[tokio::test]
    async fn test_simulated_fix_is_in_range() {
        let gps = GpsSimulator::with_default_catalog();
        let user_id = UserId::new();
        for _ in 0..100 {
            let fix = gps.user_location(user_id).await.unwrap();
            assert_eq!(fix.user_id, user_id);
            assert!(fix.location.latitude.abs() <= MAX_LATITUDE);
            assert!(fix.location.longitude.abs() <= MAX_LONGITUDE);
        }
    }
}
