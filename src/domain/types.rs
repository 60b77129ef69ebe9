//! Shared types for the tour guide service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newtype wrapper for user IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for attraction IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AttractionId(pub Uuid);

impl AttractionId {
    /// Generate a new time-sortable attraction ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AttractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on the globe in WGS84-style degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A location fix recorded for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedLocation {
    pub user_id: UserId,
    pub location: Coordinate,
    pub time_visited: DateTime<Utc>,
}

impl VisitedLocation {
    pub fn new(user_id: UserId, location: Coordinate, time_visited: DateTime<Utc>) -> Self {
        Self { user_id, location, time_visited }
    }
}

/// A named point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub attraction_id: AttractionId,
    pub attraction_name: String,
    pub city: String,
    pub state: String,
    pub location: Coordinate,
}

impl Attraction {
    pub fn new(name: &str, city: &str, state: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            attraction_id: AttractionId::new(),
            attraction_name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            location: Coordinate::new(latitude, longitude),
        }
    }
}

/// One-time award for having visited near an attraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReward {
    pub visited_location: VisitedLocation,
    pub attraction: Attraction,
    pub reward_points: u32,
}

impl UserReward {
    pub fn new(visited_location: VisitedLocation, attraction: Attraction, reward_points: u32) -> Self {
        Self { visited_location, attraction, reward_points }
    }

    #[inline]
    pub fn attraction_name(&self) -> &str {
        &self.attraction.attraction_name
    }
}

/// Trip preferences, consumed by the trip pricer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub trip_duration: u32,
    pub ticket_quantity: u32,
    pub number_of_adults: u32,
    pub number_of_children: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self { trip_duration: 1, ticket_quantity: 1, number_of_adults: 1, number_of_children: 0 }
    }
}

/// A commercial offer returned by the trip pricer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub trip_id: Uuid,
    pub name: String,
    pub price: f64,
}

/// Nearby attraction as presented to API callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyAttraction {
    pub attraction_name: String,
    pub attraction_latitude: f64,
    pub attraction_longitude: f64,
    pub user_latitude: f64,
    pub user_longitude: f64,
    pub distance_in_miles: f64,
    /// None when the reward oracle could not be reached for this attraction
    pub reward_points: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attraction_ids_are_unique() {
        let a = Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008);
        let b = Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008);
        assert_ne!(a.attraction_id, b.attraction_id);
        assert_eq!(a.location, b.location);
    }

    #[test]
    fn test_visited_location_serializes() {
        let loc = VisitedLocation::new(UserId::new(), Coordinate::new(1.5, -2.5), Utc::now());
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["location"]["latitude"], 1.5);
        assert_eq!(json["location"]["longitude"], -2.5);
    }
}
