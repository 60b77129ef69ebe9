//! Periodic location tracking
//!
//! The Tracker wakes every `interval_secs` and, for every registered user:
//! - fetches a fresh location fix
//! - appends it to the user's history
//! - runs a reward pass over the full attraction catalog
//!
//! Users are tracked concurrently, bounded by `concurrency`.


use crate::infra::config::Config;
use crate::services::tour_guide::TourGuideService;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Result of one pass over all users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingSummary {
    pub users: usize,
    pub tracked: usize,
    pub failed: usize,
    pub rewards_awarded: usize,
    pub reward_faults: usize,
}

pub struct Tracker {
    service: Arc<TourGuideService>,
    interval: Duration,
    concurrency: usize,
}

impl Tracker {
    pub fn new(service: Arc<TourGuideService>, config: &Config) -> Self {
        Self {
            service,
            interval: Duration::from_secs(config.tracking_interval_secs()),
            concurrency: config.tracking_concurrency().max(1),
        }
    }

    /// Track every registered user once and wait for all reward passes
    pub async fn track_all(&self) -> TrackingSummary {
        let start = Instant::now();
        let users = self.service.get_all_users();
        let mut summary = TrackingSummary { users: users.len(), ..Default::default() };

        let results: Vec<_> = stream::iter(users)
            .map(|user| {
                let service = &self.service;
                async move { service.track_user_location(&user).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(tracked) => {
                    summary.tracked += 1;
                    summary.rewards_awarded += tracked.rewards.awarded.len();
                    summary.reward_faults += tracked.rewards.failures.len();
                }
                Err(_) => summary.failed += 1,
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.service.metrics().record_tracking_pass(summary.users as u64, elapsed_ms);

        if summary.failed > 0 || summary.reward_faults > 0 {
            warn!(
                users = %summary.users,
                failed = %summary.failed,
                reward_faults = %summary.reward_faults,
                "tracking_pass_degraded"
            );
        }
        info!(
            users = %summary.users,
            tracked = %summary.tracked,
            rewards_awarded = %summary.rewards_awarded,
            elapsed_ms = %elapsed_ms,
            "tracking_pass_complete"
        );
        summary
    }

    /// Run tracking passes until shutdown is signalled
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick_interval = interval(self.interval);
        // A slow pass delays the next one rather than triggering a burst
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = %self.interval.as_secs(), concurrency = %self.concurrency, "tracker_started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = tick_interval.tick() => {
                    debug!("tracking_pass_start");
                    self.track_all().await;
                }
            }
        }

        info!("tracker_stopped");
    }
}
