//! Tour guide - location tracking and attraction rewards service
//!
//! Module structure:
//! - `domain/` - Core types (User, VisitedLocation, Attraction, distance)
//! - `io/` - External interfaces (GPS, reward oracle, trip pricer, HTTP API)
//! - `services/` - Business logic (TourGuideService, RewardsService, Tracker)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tour_guide::infra::{Config, Metrics};
use tour_guide::io::start_api_server;
use tour_guide::services::{TourGuideService, Tracker};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Tour guide - tracks users and rewards attraction visits
#[derive(Parser, Debug)]
#[command(name = "tour-guide", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default: INFO, use RUST_LOG=debug for per-user tracking events
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "tour-guide starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        bind_address = %config.bind_address(),
        server_port = %config.server_port(),
        tracker_enabled = %config.tracker_enabled(),
        tracking_interval_secs = %config.tracking_interval_secs(),
        proximity_buffer_miles = %config.proximity_buffer_miles(),
        attraction_proximity_range_miles = %config.attraction_proximity_range_miles(),
        test_mode = %config.test_mode(),
        internal_user_count = %config.internal_user_count(),
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(TourGuideService::with_simulators(&config, metrics.clone()));

    let mut tasks = Vec::new();

    if config.tracker_enabled() {
        let tracker = Tracker::new(service.clone(), &config);
        tasks.push(tokio::spawn(tracker.run(shutdown_rx.clone())));
    }

    // Start HTTP API (if port > 0)
    let server_port = config.server_port();
    if server_port > 0 {
        let addr: SocketAddr = format!("{}:{}", config.bind_address(), server_port).parse()?;
        let api_service = service.clone();
        let api_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = start_api_server(addr, api_service, api_shutdown).await {
                tracing::error!(error = %e, "API server error");
            }
        }));
    }

    // Periodic metrics summary
    let reporter_service = service.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    let mut reporter_shutdown = shutdown_rx;
    tasks.push(tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    metrics.report(reporter_service.user_count()).log();
                }
                _ = reporter_shutdown.changed() => {
                    if *reporter_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }));

    tokio::signal::ctrl_c().await?;
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        let _ = task.await;
    }

    info!("tour-guide shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_precedence() {
        std::env::set_var("CONFIG_FILE", "config/from_env.toml");
        let args = Args::try_parse_from(["tour-guide", "--config", "config/cli.toml"]).unwrap();
        assert_eq!(args.config, "config/cli.toml");

        let args = Args::try_parse_from(["tour-guide"]).unwrap();
        assert_eq!(args.config, "config/from_env.toml");

        std::env::remove_var("CONFIG_FILE");
        let args = Args::try_parse_from(["tour-guide"]).unwrap();
        assert_eq!(args.config, "config/dev.toml");
    }
}
