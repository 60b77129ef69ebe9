//! High-volume load harness
//!
//! Builds the service with N simulated internal users, then times:
//! 1. one tracking pass over every user
//! 2. one reward pass over every user, after each has visited the first attraction
//!
//! Usage:
//!   cargo run --release --bin load_test -- --users 100000 --concurrency 1024

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tour_guide::domain::VisitedLocation;
use tour_guide::infra::{Config, Metrics};
use tour_guide::services::{TourGuideService, Tracker};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "load_test", about = "Tracking and reward throughput harness")]
struct Args {
    /// Number of internal users to create
    #[arg(long, default_value = "100")]
    users: usize,

    /// Users processed concurrently in each pass
    #[arg(long, default_value = "256")]
    concurrency: usize,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_internal_user_count(args.users)
    .with_tracking_concurrency(args.concurrency);

    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(TourGuideService::with_simulators(&config, metrics.clone()));
    println!("users: {}", service.user_count());

    // Pass 1: track every user once
    let tracker = Tracker::new(service.clone(), &config);
    let start = Instant::now();
    let summary = tracker.track_all().await;
    let elapsed = start.elapsed();
    println!(
        "tracking pass: {} tracked, {} failed in {:.3}s",
        summary.tracked,
        summary.failed,
        elapsed.as_secs_f64()
    );

    // Pass 2: every user visits the first attraction, then rewards are computed
    let attractions = service.attractions().await?;
    let Some(first) = attractions.first().cloned() else {
        warn!("attraction catalog is empty; skipping reward pass");
        return Ok(());
    };

    let users = service.get_all_users();
    for user in &users {
        user.add_visited_location(VisitedLocation::new(
            user.user_id(),
            first.location,
            chrono::Utc::now(),
        ));
    }

    let start = Instant::now();
    let rewards = service.rewards();
    let reports: Vec<_> = stream::iter(users.iter())
        .map(|user| rewards.calculate_rewards(user, &attractions))
        .buffer_unordered(args.concurrency.max(1))
        .collect()
        .await;
    let elapsed = start.elapsed();

    let faults: usize = reports.iter().map(|r| r.failures.len()).sum();
    let missing = users.iter().filter(|u| !u.has_reward_for(&first.attraction_name)).count();
    println!(
        "reward pass: {} users, {} oracle faults, {} without '{}' reward in {:.3}s",
        users.len(),
        faults,
        missing,
        first.attraction_name,
        elapsed.as_secs_f64()
    );

    let report = metrics.report(service.user_count());
    info!(
        locations_tracked = %report.locations_tracked_total,
        rewards_awarded = %report.rewards_awarded_total,
        "load_test_complete"
    );
    report.log();
    Ok(())
}
