//! Reward accumulation
//!
//! For every attraction the user has not been rewarded for, the first
//! visited location within the proximity threshold earns one reward. Points
//! come from the external oracle, looked up concurrently with a timeout.
//! Rewards are recorded with `User::add_reward_if_absent`, so overlapping
//! passes for the same user can never record two rewards for one attraction,
//! while passes for different users never contend.

use crate::domain::{Attraction, TourGuideError, User, UserReward, VisitedLocation};
use crate::infra::metrics::Metrics;
use crate::io::RewardPointOracle;
use crate::services::proximity::ProximityMatcher;
use futures::stream::{self, StreamExt};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ORACLE: &str = "reward_central";

/// Outcome of one accumulation pass
#[derive(Debug, Default)]
pub struct RewardReport {
    /// Attraction names newly rewarded by this pass
    pub awarded: Vec<String>,
    /// Attractions that qualified but whose points lookup failed
    pub failures: Vec<(String, TourGuideError)>,
}

impl RewardReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of rewards recorded, or the first fault if any lookup failed
    pub fn into_result(self) -> Result<usize, TourGuideError> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.awarded.len()),
        }
    }
}

/// Computes and records rewards for users
pub struct RewardsService {
    matcher: ProximityMatcher,
    oracle: Arc<dyn RewardPointOracle>,
    oracle_timeout: Duration,
    concurrency: usize,
    metrics: Arc<Metrics>,
}

impl RewardsService {
    pub fn new(
        matcher: ProximityMatcher,
        oracle: Arc<dyn RewardPointOracle>,
        oracle_timeout_ms: u64,
        concurrency: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            matcher,
            oracle,
            oracle_timeout: Duration::from_millis(oracle_timeout_ms),
            concurrency: concurrency.max(1),
            metrics,
        }
    }

    pub fn matcher(&self) -> &ProximityMatcher {
        &self.matcher
    }

    /// Override the reward threshold; false if `miles` was rejected
    pub fn set_proximity_buffer(&self, miles: f64) -> bool {
        self.matcher.set_proximity_buffer(miles)
    }

    pub fn set_default_proximity_buffer(&self) {
        self.matcher.reset_proximity_buffer();
    }

    pub fn is_within_attraction_proximity(&self, attraction: &Attraction, location: &VisitedLocation) -> bool {
        self.matcher.is_within_attraction_proximity(attraction, &location.location)
    }

    /// Points for an (attraction, user) pair, bounded by the oracle timeout
    pub async fn reward_points(&self, attraction: &Attraction, user: &User) -> Result<u32, TourGuideError> {
        let lookup = self.oracle.attraction_reward_points(attraction.attraction_id, user.user_id());
        match tokio::time::timeout(self.oracle_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(TourGuideError::UpstreamTimeout {
                service: ORACLE,
                timeout_ms: self.oracle_timeout.as_millis() as u64,
            }),
        }
    }

    /// Qualifying (location, attraction) pairs the user holds no reward for.
    /// One pair per attraction name: the earliest qualifying location.
    fn candidates(&self, user: &User, attractions: &[Attraction]) -> Vec<(VisitedLocation, Attraction)> {
        let history = user.visited_locations();
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        attractions
            .iter()
            .filter(|a| seen.insert(a.attraction_name.as_str()))
            .filter(|a| !user.has_reward_for(&a.attraction_name))
            .filter_map(|a| {
                history
                    .iter()
                    .find(|loc| self.matcher.is_near(&loc.location, a))
                    .map(|loc| (loc.clone(), a.clone()))
            })
            .collect()
    }

    /// Reward every attraction the user has come near and not yet been
    /// rewarded for. Safe to run concurrently for the same user.
    pub async fn calculate_rewards(&self, user: &User, attractions: &[Attraction]) -> RewardReport {
        let start = Instant::now();
        let candidates = self.candidates(user, attractions);
        if candidates.is_empty() {
            return RewardReport::default();
        }

        debug!(
            user = %user.user_name(),
            candidates = %candidates.len(),
            "reward_candidates"
        );

        let lookups: Vec<_> = stream::iter(candidates)
            .map(|(visited, attraction)| async move {
                let points = self.reward_points(&attraction, user).await;
                (visited, attraction, points)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = RewardReport::default();
        for (visited, attraction, points) in lookups {
            match points {
                Ok(points) => {
                    let name = attraction.attraction_name.clone();
                    if user.add_reward_if_absent(UserReward::new(visited, attraction, points)) {
                        info!(
                            user = %user.user_name(),
                            attraction = %name,
                            points = %points,
                            "reward_awarded"
                        );
                        report.awarded.push(name);
                    }
                }
                Err(e) => {
                    warn!(
                        user = %user.user_name(),
                        attraction = %attraction.attraction_name,
                        error = %e,
                        "reward_points_lookup_failed"
                    );
                    self.metrics.record_oracle_failure();
                    report.failures.push((attraction.attraction_name, e));
                }
            }
        }

        self.metrics.record_rewards_awarded(report.awarded.len() as u64);
        debug!(
            user = %user.user_name(),
            awarded = %report.awarded.len(),
            failed = %report.failures.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "rewards_calculated"
        );
        report
    }
}
