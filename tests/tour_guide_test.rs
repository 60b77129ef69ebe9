//! Integration tests for the tour guide service

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tour_guide::domain::{
    Attraction, Coordinate, TourGuideError, User, UserId, UserPreferences, VisitedLocation,
};
use tour_guide::infra::{Config, Metrics};
use tour_guide::io::trip_pricer::MAX_PROVIDERS;
use tour_guide::io::{AttractionSource, GpsSimulator, RewardCentral, TripPricerSimulator};
use tour_guide::services::{ProximityMatcher, RewardsService, TourGuideService, UserRegistry};

/// GPS whose location fixes never arrive in time
struct StalledGps {
    inner: GpsSimulator,
}

#[async_trait]
impl AttractionSource for StalledGps {
    async fn attractions(&self) -> Result<Vec<Attraction>, TourGuideError> {
        self.inner.attractions().await
    }

    async fn user_location(&self, user_id: UserId) -> Result<VisitedLocation, TourGuideError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        self.inner.user_location(user_id).await
    }
}

fn simulated_service(internal_users: usize) -> TourGuideService {
    let config = Config::default().with_internal_user_count(internal_users);
    TourGuideService::with_simulators(&config, Arc::new(Metrics::new()))
}

fn stalled_service() -> TourGuideService {
    let config = Config::default().with_internal_user_count(0).with_upstream_timeout_ms(50);
    let metrics = Arc::new(Metrics::new());
    let rewards = Arc::new(RewardsService::new(
        ProximityMatcher::default(),
        Arc::new(RewardCentral::default()),
        config.oracle_timeout_ms(),
        config.rewards_concurrency(),
        metrics.clone(),
    ));
    TourGuideService::new(
        &config,
        Arc::new(StalledGps { inner: GpsSimulator::with_default_catalog() }),
        rewards,
        Arc::new(TripPricerSimulator),
        UserRegistry::new(),
        metrics,
    )
}

fn new_user(name: &str) -> User {
    User::new(UserId::new(), name, "000", &format!("{name}@tourGuide.com"))
}

#[tokio::test]
async fn test_internal_users_are_seeded() {
    let service = simulated_service(10);
    assert_eq!(service.user_count(), 10);

    let user = service.get_user("internalUser9").unwrap();
    assert_eq!(user.visited_location_count(), 3);
    assert!(service.get_user("internalUser10").is_none());
}

#[tokio::test]
async fn test_get_location_tracks_when_history_is_empty() {
    let service = simulated_service(0);
    let user = service.add_user(new_user("jon"));

    let location = service.get_user_location(&user).await.unwrap();
    assert_eq!(location.user_id, user.user_id());
    assert_eq!(user.visited_location_count(), 1);

    // A known location is returned as-is without a new fix
    let again = service.get_user_location(&user).await.unwrap();
    assert_eq!(again, location);
    assert_eq!(user.visited_location_count(), 1);
}

#[tokio::test]
async fn test_track_user_location_appends_and_rewards() {
    let service = simulated_service(0);
    let user = service.add_user(new_user("jon"));

    let tracked = service.track_user_location(&user).await.unwrap();
    assert!(tracked.rewards.is_complete());
    assert_eq!(user.last_visited_location(), Some(tracked.location));
    assert_eq!(user.reward_count(), tracked.rewards.awarded.len());
}

#[tokio::test]
async fn test_visit_of_catalog_entry_earns_reward() {
    let service = simulated_service(0);
    let user = service.add_user(new_user("jon"));
    let attractions = service.attractions().await.unwrap();
    let first = &attractions[0];

    user.add_visited_location(VisitedLocation::new(user.user_id(), first.location, Utc::now()));
    let report = service.rewards().calculate_rewards(&user, &attractions).await;

    assert!(report.awarded.contains(&first.attraction_name));
    let rewards = service.get_user_rewards(&user);
    let reward = rewards.iter().find(|r| r.attraction_name() == first.attraction_name).unwrap();
    assert!((1..=1000).contains(&reward.reward_points));
}

#[tokio::test]
async fn test_nearby_attraction_details() {
    let service = simulated_service(0);
    let user = service.add_user(new_user("jon"));
    user.add_visited_location(VisitedLocation::new(
        user.user_id(),
        Coordinate::new(33.817595, -117.922008),
        Utc::now(),
    ));

    let nearby = service.get_nearby_attraction_details(&user).await.unwrap();
    assert_eq!(nearby.len(), 5);
    assert_eq!(nearby[0].attraction_name, "Disneyland");
    assert_eq!(nearby[0].distance_in_miles, 0.0);
    assert!(nearby.windows(2).all(|w| w[0].distance_in_miles <= w[1].distance_in_miles));
    assert!(nearby.iter().all(|n| n.user_latitude == 33.817595));
    assert!(nearby.iter().all(|n| n.reward_points.is_some()));

    let plain = service.get_nearby_attractions(&user.last_visited_location().unwrap()).await.unwrap();
    let names: Vec<_> = plain.iter().map(|a| a.attraction_name.as_str()).collect();
    let detailed: Vec<_> = nearby.iter().map(|n| n.attraction_name.as_str()).collect();
    assert_eq!(names, detailed);
}

#[tokio::test]
async fn test_trip_deals_are_stored_on_the_user() {
    let service = simulated_service(0);
    let user = service.add_user(new_user("jon"));
    user.set_preferences(UserPreferences { number_of_adults: 2, number_of_children: 1, ..Default::default() });

    let deals = service.get_trip_deals(&user).await.unwrap();
    assert!(!deals.is_empty());
    assert!(deals.len() <= MAX_PROVIDERS);
    assert!(deals.iter().all(|p| p.price >= 0.0));
    assert_eq!(user.trip_deals(), deals);
}

#[tokio::test]
async fn test_unknown_user() {
    let service = simulated_service(1);
    assert!(service.get_user("nobody").is_none());
    assert_eq!(
        service.require_user("nobody").unwrap_err(),
        TourGuideError::UserNotFound("nobody".to_string())
    );
}

#[tokio::test]
async fn test_location_timeout_leaves_history_untouched() {
    let service = stalled_service();
    let user = service.add_user(new_user("jon"));

    let err = service.track_user_location(&user).await.unwrap_err();
    assert_eq!(err, TourGuideError::UpstreamTimeout { service: "gps", timeout_ms: 50 });
    assert!(err.is_upstream());
    assert_eq!(user.visited_location_count(), 0);
    assert_eq!(service.metrics().location_failures_total(), 1);

    let err = service.get_user_location(&user).await.unwrap_err();
    assert!(err.is_upstream());
}
