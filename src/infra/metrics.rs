//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally: these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for tracking pass duration (milliseconds)
/// Buckets: ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, ≤5120, >5120
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];
pub const METRICS_NUM_BUCKETS: usize = 11;

/// Compute bucket index for a duration value using binary search
#[inline]
fn bucket_index(duration_ms: u64) -> usize {
    METRICS_BUCKET_BOUNDS.partition_point(|&bound| bound < duration_ms)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; METRICS_NUM_BUCKETS]) -> [u64; METRICS_NUM_BUCKETS] {
    let mut result = [0u64; METRICS_NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; METRICS_NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; METRICS_NUM_BUCKETS] =
        [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120, 10240];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[METRICS_NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Location fixes recorded (monotonic)
    locations_tracked_total: AtomicU64,
    /// Location fixes that failed or timed out (monotonic)
    location_failures_total: AtomicU64,
    /// Rewards recorded (monotonic)
    rewards_awarded_total: AtomicU64,
    /// Oracle lookups that failed or timed out (monotonic)
    oracle_failures_total: AtomicU64,
    /// Completed tracker passes (monotonic)
    tracking_passes_total: AtomicU64,
    /// Locations tracked since last report (reset on report)
    tracked_since_report: AtomicU64,
    /// Users in the most recent tracker pass
    last_pass_users: AtomicU64,
    /// Tracker pass duration histogram (reset on report)
    pass_duration_buckets: [AtomicU64; METRICS_NUM_BUCKETS],
    /// Sum of pass durations in ms (reset on report)
    pass_duration_sum_ms: AtomicU64,
    /// Max pass duration in ms (reset on report)
    pass_duration_max_ms: AtomicU64,
    /// Passes since last report (reset on report)
    passes_since_report: AtomicU64,
    /// Tracker pass duration histogram since start (never reset)
    pass_duration_buckets_total: [AtomicU64; METRICS_NUM_BUCKETS],
    /// Sum of pass durations in ms since start (never reset)
    pass_duration_total_ms: AtomicU64,
    /// Max pass duration in ms since start (never reset)
    pass_duration_max_total_ms: AtomicU64,
    /// Process start, for lifetime rates
    started: Instant,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            locations_tracked_total: AtomicU64::new(0),
            location_failures_total: AtomicU64::new(0),
            rewards_awarded_total: AtomicU64::new(0),
            oracle_failures_total: AtomicU64::new(0),
            tracking_passes_total: AtomicU64::new(0),
            tracked_since_report: AtomicU64::new(0),
            last_pass_users: AtomicU64::new(0),
            pass_duration_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            pass_duration_sum_ms: AtomicU64::new(0),
            pass_duration_max_ms: AtomicU64::new(0),
            passes_since_report: AtomicU64::new(0),
            pass_duration_buckets_total: std::array::from_fn(|_| AtomicU64::new(0)),
            pass_duration_total_ms: AtomicU64::new(0),
            pass_duration_max_total_ms: AtomicU64::new(0),
            started: Instant::now(),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_location_tracked(&self) {
        self.locations_tracked_total.fetch_add(1, Ordering::Relaxed);
        self.tracked_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_location_failure(&self) {
        self.location_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rewards_awarded(&self, count: u64) {
        self.rewards_awarded_total.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_oracle_failure(&self) {
        self.oracle_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed tracker pass over `users` users
    pub fn record_tracking_pass(&self, users: u64, duration_ms: u64) {
        self.tracking_passes_total.fetch_add(1, Ordering::Relaxed);
        self.passes_since_report.fetch_add(1, Ordering::Relaxed);
        self.last_pass_users.store(users, Ordering::Relaxed);
        self.pass_duration_sum_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.pass_duration_buckets[bucket_index(duration_ms)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.pass_duration_max_ms, duration_ms);
        self.pass_duration_total_ms.fetch_add(duration_ms, Ordering::Relaxed);
        self.pass_duration_buckets_total[bucket_index(duration_ms)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.pass_duration_max_total_ms, duration_ms);
    }

    #[inline]
    pub fn locations_tracked_total(&self) -> u64 {
        self.locations_tracked_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn location_failures_total(&self) -> u64 {
        self.location_failures_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rewards_awarded_total(&self) -> u64 {
        self.rewards_awarded_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn oracle_failures_total(&self) -> u64 {
        self.oracle_failures_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn tracking_passes_total(&self) -> u64 {
        self.tracking_passes_total.load(Ordering::Relaxed)
    }

    /// Generate a report and reset the per-interval counters
    pub fn report(&self, registered_users: usize) -> MetricsSummary {
        let now = Instant::now();
        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *last = now;
            elapsed
        };

        let tracked = self.tracked_since_report.swap(0, Ordering::Relaxed);
        let passes = self.passes_since_report.swap(0, Ordering::Relaxed);
        let duration_sum = self.pass_duration_sum_ms.swap(0, Ordering::Relaxed);
        let duration_max = self.pass_duration_max_ms.swap(0, Ordering::Relaxed);
        let buckets = swap_buckets(&self.pass_duration_buckets);

        MetricsSummary {
            registered_users,
            locations_tracked_total: self.locations_tracked_total(),
            location_failures_total: self.location_failures_total(),
            rewards_awarded_total: self.rewards_awarded_total(),
            oracle_failures_total: self.oracle_failures_total(),
            tracking_passes_total: self.tracking_passes_total(),
            last_pass_users: self.last_pass_users.load(Ordering::Relaxed),
            locations_per_sec: if elapsed_secs > 0.0 { tracked as f64 / elapsed_secs } else { 0.0 },
            pass_avg_ms: if passes > 0 { duration_sum / passes } else { 0 },
            pass_sum_ms: duration_sum,
            pass_max_ms: duration_max,
            pass_p99_ms: percentile_from_buckets(&buckets, 0.99),
            pass_buckets: buckets,
        }
    }

    /// Cumulative view since start. Reads only, so scrapes never disturb
    /// the interval counters consumed by `report`.
    pub fn snapshot(&self, registered_users: usize) -> MetricsSummary {
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        let passes = self.tracking_passes_total();
        let duration_sum = self.pass_duration_total_ms.load(Ordering::Relaxed);
        let buckets: [u64; METRICS_NUM_BUCKETS] =
            std::array::from_fn(|i| self.pass_duration_buckets_total[i].load(Ordering::Relaxed));
        let tracked = self.locations_tracked_total();

        MetricsSummary {
            registered_users,
            locations_tracked_total: tracked,
            location_failures_total: self.location_failures_total(),
            rewards_awarded_total: self.rewards_awarded_total(),
            oracle_failures_total: self.oracle_failures_total(),
            tracking_passes_total: passes,
            last_pass_users: self.last_pass_users.load(Ordering::Relaxed),
            locations_per_sec: if elapsed_secs > 0.0 { tracked as f64 / elapsed_secs } else { 0.0 },
            pass_avg_ms: if passes > 0 { duration_sum / passes } else { 0 },
            pass_sum_ms: duration_sum,
            pass_max_ms: self.pass_duration_max_total_ms.load(Ordering::Relaxed),
            pass_p99_ms: percentile_from_buckets(&buckets, 0.99),
            pass_buckets: buckets,
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub registered_users: usize,
    pub locations_tracked_total: u64,
    pub location_failures_total: u64,
    pub rewards_awarded_total: u64,
    pub oracle_failures_total: u64,
    pub tracking_passes_total: u64,
    pub last_pass_users: u64,
    pub locations_per_sec: f64,
    pub pass_avg_ms: u64,
    pub pass_sum_ms: u64,
    pub pass_max_ms: u64,
    pub pass_p99_ms: u64,
    pub pass_buckets: [u64; METRICS_NUM_BUCKETS],
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            users = %self.registered_users,
            locations_tracked = %self.locations_tracked_total,
            location_failures = %self.location_failures_total,
            rewards_awarded = %self.rewards_awarded_total,
            oracle_failures = %self.oracle_failures_total,
            passes = %self.tracking_passes_total,
            last_pass_users = %self.last_pass_users,
            locations_per_sec = %format!("{:.2}", self.locations_per_sec),
            pass_avg_ms = %self.pass_avg_ms,
            pass_max_ms = %self.pass_max_ms,
            pass_p99_ms = %self.pass_p99_ms,
            "metrics"
        );
    }
}
