//! Tour guide service: location tracking and the operations exposed to the API
//!
//! `track_user_location` is the unit the periodic tracker calls: fetch a fix,
//! append it to the history, then run a reward pass over the full catalog.

use crate::domain::{
    Attraction, NearbyAttraction, Provider, TourGuideError, User, UserReward, VisitedLocation,
};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::gps::{catalog_from_entries, GpsSimulator};
use crate::io::reward_central::RewardCentral;
use crate::io::trip_pricer::{TripPricerSimulator, TripQuoteRequest};
use crate::io::{AttractionSource, TripPricing};
use crate::services::proximity::ProximityMatcher;
use crate::services::ranker::{self, DEFAULT_NEARBY_COUNT};
use crate::services::rewards::{RewardReport, RewardsService};
use crate::services::user_registry::UserRegistry;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const GPS: &str = "gps";
const TRIP_PRICER: &str = "trip_pricer";

/// A fresh fix plus the reward pass it triggered
#[derive(Debug)]
pub struct TrackedLocation {
    pub location: VisitedLocation,
    pub rewards: RewardReport,
}

pub struct TourGuideService {
    gps: Arc<dyn AttractionSource>,
    rewards: Arc<RewardsService>,
    trip_pricer: Arc<dyn TripPricing>,
    users: UserRegistry,
    metrics: Arc<Metrics>,
    location_timeout: Duration,
    trip_pricer_timeout: Duration,
    trip_pricer_api_key: String,
}

impl TourGuideService {
    pub fn new(
        config: &Config,
        gps: Arc<dyn AttractionSource>,
        rewards: Arc<RewardsService>,
        trip_pricer: Arc<dyn TripPricing>,
        users: UserRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            gps,
            rewards,
            trip_pricer,
            users,
            metrics,
            location_timeout: Duration::from_millis(config.location_timeout_ms()),
            trip_pricer_timeout: Duration::from_millis(config.trip_pricer_timeout_ms()),
            trip_pricer_api_key: config.trip_pricer_api_key().to_string(),
        }
    }

    /// Wire the service to the simulated collaborators described by `config`
    pub fn with_simulators(config: &Config, metrics: Arc<Metrics>) -> Self {
        let gps = Arc::new(GpsSimulator::new(
            catalog_from_entries(config.attractions()),
            config.gps_latency_ms(),
        ));
        let oracle = Arc::new(RewardCentral::new(config.reward_central_latency_ms()));
        let matcher = ProximityMatcher::new(
            config.proximity_buffer_miles(),
            config.attraction_proximity_range_miles(),
        );
        let rewards = Arc::new(RewardsService::new(
            matcher,
            oracle,
            config.oracle_timeout_ms(),
            config.rewards_concurrency(),
            metrics.clone(),
        ));

        let users = if config.test_mode() {
            info!(count = %config.internal_user_count(), "test_mode_enabled");
            UserRegistry::with_internal_users(config.internal_user_count())
        } else {
            UserRegistry::new()
        };

        Self::new(config, gps, rewards, Arc::new(TripPricerSimulator), users, metrics)
    }

    pub fn rewards(&self) -> &RewardsService {
        &self.rewards
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn get_user(&self, user_name: &str) -> Option<Arc<User>> {
        self.users.get(user_name)
    }

    /// Like `get_user`, but an unknown name is a `UserNotFound` fault
    pub fn require_user(&self, user_name: &str) -> Result<Arc<User>, TourGuideError> {
        self.get_user(user_name).ok_or_else(|| TourGuideError::UserNotFound(user_name.to_string()))
    }

    pub fn get_all_users(&self) -> Vec<Arc<User>> {
        self.users.all()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn add_user(&self, user: User) -> Arc<User> {
        self.users.add_user(user)
    }

    pub fn get_user_rewards(&self, user: &User) -> Vec<UserReward> {
        user.rewards()
    }

    /// Last known location; tracks a fresh one only when the history is empty
    pub async fn get_user_location(&self, user: &User) -> Result<VisitedLocation, TourGuideError> {
        match user.last_visited_location() {
            Some(location) => Ok(location),
            None => self.track_user_location(user).await.map(|tracked| tracked.location),
        }
    }

    pub async fn attractions(&self) -> Result<Vec<Attraction>, TourGuideError> {
        self.gps.attractions().await
    }

    async fn fetch_location(&self, user: &User) -> Result<VisitedLocation, TourGuideError> {
        match tokio::time::timeout(self.location_timeout, self.gps.user_location(user.user_id())).await {
            Ok(result) => result,
            Err(_) => Err(TourGuideError::UpstreamTimeout {
                service: GPS,
                timeout_ms: self.location_timeout.as_millis() as u64,
            }),
        }
    }

    /// Fetch a fresh fix, append it, and reward newly visited attractions.
    ///
    /// A failed or timed-out fix leaves the user untouched. Oracle faults
    /// during the reward pass are carried in the returned report.
    pub async fn track_user_location(&self, user: &User) -> Result<TrackedLocation, TourGuideError> {
        let location = match self.fetch_location(user).await {
            Ok(location) => location,
            Err(e) => {
                self.metrics.record_location_failure();
                warn!(user = %user.user_name(), error = %e, "location_fetch_failed");
                return Err(e);
            }
        };

        let attractions = match self.gps.attractions().await {
            Ok(attractions) => attractions,
            Err(e) => {
                self.metrics.record_location_failure();
                warn!(user = %user.user_name(), error = %e, "attraction_catalog_failed");
                return Err(e);
            }
        };

        user.add_visited_location(location.clone());
        self.metrics.record_location_tracked();
        debug!(
            user = %user.user_name(),
            lat = %location.location.latitude,
            lon = %location.location.longitude,
            "location_tracked"
        );

        let rewards = self.rewards.calculate_rewards(user, &attractions).await;
        Ok(TrackedLocation { location, rewards })
    }

    /// The closest attractions to a location, no matter how far away
    pub async fn get_nearby_attractions(
        &self,
        visited_location: &VisitedLocation,
    ) -> Result<Vec<Attraction>, TourGuideError> {
        let attractions = self.gps.attractions().await?;
        Ok(ranker::nearest(&visited_location.location, &attractions, DEFAULT_NEARBY_COUNT))
    }

    /// Nearby attractions with distance and reward value for the user's
    /// current location. A failed points lookup yields `None` for that entry.
    pub async fn get_nearby_attraction_details(
        &self,
        user: &User,
    ) -> Result<Vec<NearbyAttraction>, TourGuideError> {
        let visited = self.get_user_location(user).await?;
        let attractions = self.gps.attractions().await?;
        let ranked = ranker::nearest_with_distance(&visited.location, &attractions, DEFAULT_NEARBY_COUNT);

        let points = join_all(ranked.iter().map(|(a, _)| self.rewards.reward_points(a, user))).await;

        Ok(ranked
            .into_iter()
            .zip(points)
            .map(|((attraction, distance), points)| NearbyAttraction {
                attraction_name: attraction.attraction_name.clone(),
                attraction_latitude: attraction.location.latitude,
                attraction_longitude: attraction.location.longitude,
                user_latitude: visited.location.latitude,
                user_longitude: visited.location.longitude,
                distance_in_miles: distance,
                reward_points: points.ok(),
            })
            .collect())
    }

    /// Quote trip deals from cumulative reward points and preferences
    pub async fn get_trip_deals(&self, user: &User) -> Result<Vec<Provider>, TourGuideError> {
        let request = TripQuoteRequest {
            api_key: self.trip_pricer_api_key.clone(),
            user_id: user.user_id(),
            preferences: user.preferences(),
            cumulative_reward_points: user.cumulative_reward_points(),
        };

        let providers = match tokio::time::timeout(self.trip_pricer_timeout, self.trip_pricer.quote(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TourGuideError::UpstreamTimeout {
                    service: TRIP_PRICER,
                    timeout_ms: self.trip_pricer_timeout.as_millis() as u64,
                })
            }
        };

        user.set_trip_deals(providers.clone());
        Ok(providers)
    }
}
