//! User entity with append-only location history and reward ledger
//!
//! A `User` is shared as `Arc<User>` between the API, the tracker and
//! reward passes. Interior state sits behind `parking_lot` locks that are
//! never held across an await point.

use crate::domain::types::{Provider, UserId, UserPreferences, UserReward, VisitedLocation};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;

/// Rewards plus an index of rewarded attraction names, updated together
#[derive(Debug, Default)]
struct RewardLedger {
    rewarded: FxHashSet<String>,
    entries: Vec<UserReward>,
}

#[derive(Debug)]
pub struct User {
    user_id: UserId,
    user_name: String,
    phone_number: String,
    email_address: String,
    latest_location_time: RwLock<Option<DateTime<Utc>>>,
    visited_locations: RwLock<Vec<VisitedLocation>>,
    rewards: Mutex<RewardLedger>,
    preferences: RwLock<UserPreferences>,
    trip_deals: RwLock<Vec<Provider>>,
}

impl User {
    pub fn new(user_id: UserId, user_name: &str, phone_number: &str, email_address: &str) -> Self {
        Self {
            user_id,
            user_name: user_name.to_string(),
            phone_number: phone_number.to_string(),
            email_address: email_address.to_string(),
            latest_location_time: RwLock::new(None),
            visited_locations: RwLock::new(Vec::new()),
            rewards: Mutex::new(RewardLedger::default()),
            preferences: RwLock::new(UserPreferences::default()),
            trip_deals: RwLock::new(Vec::new()),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    pub fn latest_location_time(&self) -> Option<DateTime<Utc>> {
        *self.latest_location_time.read()
    }

    /// Append a location fix to the history (most recent last)
    pub fn add_visited_location(&self, location: VisitedLocation) {
        let mut latest = self.latest_location_time.write();
        match *latest {
            Some(t) if t >= location.time_visited => {}
            _ => *latest = Some(location.time_visited),
        }
        self.visited_locations.write().push(location);
    }

    /// Snapshot of the location history
    pub fn visited_locations(&self) -> Vec<VisitedLocation> {
        self.visited_locations.read().clone()
    }

    pub fn visited_location_count(&self) -> usize {
        self.visited_locations.read().len()
    }

    pub fn last_visited_location(&self) -> Option<VisitedLocation> {
        self.visited_locations.read().last().cloned()
    }

    /// Whether a reward has already been recorded for this attraction name
    pub fn has_reward_for(&self, attraction_name: &str) -> bool {
        self.rewards.lock().rewarded.contains(attraction_name)
    }

    /// Record a reward unless one already exists for the same attraction name.
    ///
    /// Check and insert happen under one lock, so concurrent callers can never
    /// both record a reward for the same attraction. Returns true if recorded.
    pub fn add_reward_if_absent(&self, reward: UserReward) -> bool {
        let mut ledger = self.rewards.lock();
        if !ledger.rewarded.insert(reward.attraction_name().to_string()) {
            return false;
        }
        ledger.entries.push(reward);
        true
    }

    /// Snapshot of all rewards in the order they were recorded
    pub fn rewards(&self) -> Vec<UserReward> {
        self.rewards.lock().entries.clone()
    }

    pub fn reward_count(&self) -> usize {
        self.rewards.lock().entries.len()
    }

    pub fn cumulative_reward_points(&self) -> u64 {
        self.rewards.lock().entries.iter().map(|r| u64::from(r.reward_points)).sum()
    }

    pub fn preferences(&self) -> UserPreferences {
        *self.preferences.read()
    }

    pub fn set_preferences(&self, preferences: UserPreferences) {
        *self.preferences.write() = preferences;
    }

    pub fn trip_deals(&self) -> Vec<Provider> {
        self.trip_deals.read().clone()
    }

    pub fn set_trip_deals(&self, deals: Vec<Provider>) {
        *self.trip_deals.write() = deals;
    }
}
