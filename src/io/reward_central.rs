//! Reward point oracle
//!
//! Converts an (attraction, user) pair into a point value. The simulator
//! returns a random value in 1..=1000.

use crate::domain::{AttractionId, TourGuideError, UserId};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

const MIN_POINTS: u32 = 1;
const MAX_POINTS: u32 = 1000;

/// External scoring service; lookups may block or fail
#[async_trait]
pub trait RewardPointOracle: Send + Sync {
    async fn attraction_reward_points(
        &self,
        attraction_id: AttractionId,
        user_id: UserId,
    ) -> Result<u32, TourGuideError>;
}

/// Simulated reward central
pub struct RewardCentral {
    latency: Duration,
}

impl RewardCentral {
    pub fn new(latency_ms: u64) -> Self {
        Self { latency: Duration::from_millis(latency_ms) }
    }
}

impl Default for RewardCentral {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl RewardPointOracle for RewardCentral {
    async fn attraction_reward_points(
        &self,
        _attraction_id: AttractionId,
        _user_id: UserId,
    ) -> Result<u32, TourGuideError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(rand::rng().random_range(MIN_POINTS..=MAX_POINTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_points_in_range() {
        let oracle = RewardCentral::default();
        for _ in 0..200 {
            let points =
                oracle.attraction_reward_points(AttractionId::new(), UserId::new()).await.unwrap();
            assert!((MIN_POINTS..=MAX_POINTS).contains(&points));
        }
    }
}
