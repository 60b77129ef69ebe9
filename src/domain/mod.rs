//! Domain models - core business types
//!
//! This module contains the canonical data types used throughout the system:
//! - `User` - tracked traveller with location history and rewards
//! - `VisitedLocation` / `Coordinate` - location fixes
//! - `Attraction` - point of interest from the catalog
//! - `UserReward` - one-time award per attraction
//! - `geo` - great-circle distance
//! - `TourGuideError` - fault taxonomy

pub mod error;
pub mod geo;
pub mod types;
pub mod user;

// Re-export commonly used types at module level
pub use error::TourGuideError;
pub use types::{
    Attraction, AttractionId, Coordinate, NearbyAttraction, Provider, UserId, UserPreferences,
    UserReward, VisitedLocation,
};
pub use user::User;
