//! Configuration loading from TOML files
//!
//! The binary picks the file from `--config`, then the `CONFIG_FILE`
//! environment variable, then `config/dev.toml`.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// HTTP API port (0 to disable)
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address(), port: default_server_port() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between tracking passes over all users
    #[serde(default = "default_tracking_interval")]
    pub interval_secs: u64,
    /// Users tracked concurrently within one pass
    #[serde(default = "default_tracking_concurrency")]
    pub concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_tracking_interval() -> u64 {
    300
}

fn default_tracking_concurrency() -> usize {
    64
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_tracking_interval(),
            concurrency: default_tracking_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardsConfig {
    /// Default reward proximity threshold (statute miles)
    #[serde(default = "default_proximity_buffer")]
    pub proximity_buffer_miles: f64,
    /// Wider "in range of an attraction" threshold (statute miles)
    #[serde(default = "default_attraction_range")]
    pub attraction_proximity_range_miles: f64,
    #[serde(default = "default_upstream_timeout_ms")]
    pub oracle_timeout_ms: u64,
    /// Oracle calls in flight per reward pass
    #[serde(default = "default_rewards_concurrency")]
    pub concurrency: usize,
}

fn default_proximity_buffer() -> f64 {
    10.0
}

fn default_attraction_range() -> f64 {
    200.0
}

fn default_upstream_timeout_ms() -> u64 {
    5000
}

fn default_rewards_concurrency() -> usize {
    16
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            proximity_buffer_miles: default_proximity_buffer(),
            attraction_proximity_range_miles: default_attraction_range(),
            oracle_timeout_ms: default_upstream_timeout_ms(),
            concurrency: default_rewards_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpsConfig {
    #[serde(default = "default_upstream_timeout_ms")]
    pub location_timeout_ms: u64,
    /// Artificial delay added by the simulator to each location fix
    #[serde(default)]
    pub simulated_latency_ms: u64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self { location_timeout_ms: default_upstream_timeout_ms(), simulated_latency_ms: 0 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RewardCentralConfig {
    /// Artificial delay added by the simulator to each points lookup
    #[serde(default)]
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripPricerConfig {
    #[serde(default = "default_trip_pricer_api_key")]
    pub api_key: String,
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_trip_pricer_api_key() -> String {
    "test-server-api-key".to_string()
}

impl Default for TripPricerConfig {
    fn default() -> Self {
        Self { api_key: default_trip_pricer_api_key(), timeout_ms: default_upstream_timeout_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// Seed the registry with synthetic internal users
    #[serde(default = "default_true")]
    pub test_mode: bool,
    #[serde(default = "default_internal_user_count")]
    pub internal_user_count: usize,
}

fn default_internal_user_count() -> usize {
    100
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self { test_mode: true, internal_user_count: default_internal_user_count() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

/// Catalog entry overriding the built-in attraction list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttractionEntry {
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub gps: GpsConfig,
    #[serde(default)]
    pub reward_central: RewardCentralConfig,
    #[serde(default)]
    pub trip_pricer: TripPricerConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub attractions: Vec<AttractionEntry>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    config_file: String,
    bind_address: String,
    server_port: u16,
    tracker_enabled: bool,
    tracking_interval_secs: u64,
    tracking_concurrency: usize,
    proximity_buffer_miles: f64,
    attraction_proximity_range_miles: f64,
    oracle_timeout_ms: u64,
    rewards_concurrency: usize,
    location_timeout_ms: u64,
    gps_latency_ms: u64,
    reward_central_latency_ms: u64,
    trip_pricer_api_key: String,
    trip_pricer_timeout_ms: u64,
    test_mode: bool,
    internal_user_count: usize,
    metrics_interval_secs: u64,
    attractions: Vec<AttractionEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            config_file,
            bind_address: toml_config.server.bind_address,
            server_port: toml_config.server.port,
            tracker_enabled: toml_config.tracker.enabled,
            tracking_interval_secs: toml_config.tracker.interval_secs.max(1),
            tracking_concurrency: toml_config.tracker.concurrency.max(1),
            proximity_buffer_miles: toml_config.rewards.proximity_buffer_miles,
            attraction_proximity_range_miles: toml_config.rewards.attraction_proximity_range_miles,
            oracle_timeout_ms: toml_config.rewards.oracle_timeout_ms,
            rewards_concurrency: toml_config.rewards.concurrency.max(1),
            location_timeout_ms: toml_config.gps.location_timeout_ms,
            gps_latency_ms: toml_config.gps.simulated_latency_ms,
            reward_central_latency_ms: toml_config.reward_central.simulated_latency_ms,
            trip_pricer_api_key: toml_config.trip_pricer.api_key,
            trip_pricer_timeout_ms: toml_config.trip_pricer.timeout_ms,
            test_mode: toml_config.users.test_mode,
            internal_user_count: toml_config.users.internal_user_count,
            metrics_interval_secs: toml_config.metrics.interval_secs.max(1),
            attractions: toml_config.attractions,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::parse(&content, path.display().to_string())
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str, config_file: String) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)?;

        if toml_config.rewards.proximity_buffer_miles < 0.0 {
            anyhow::bail!("rewards.proximity_buffer_miles must not be negative");
        }
        if toml_config.rewards.attraction_proximity_range_miles
            < toml_config.rewards.proximity_buffer_miles
        {
            anyhow::bail!(
                "rewards.attraction_proximity_range_miles must be at least proximity_buffer_miles"
            );
        }

        Ok(Self::from_toml(toml_config, config_file))
    }

    /// Load configuration from a path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn tracker_enabled(&self) -> bool {
        self.tracker_enabled
    }

    pub fn tracking_interval_secs(&self) -> u64 {
        self.tracking_interval_secs
    }

    pub fn tracking_concurrency(&self) -> usize {
        self.tracking_concurrency
    }

    pub fn proximity_buffer_miles(&self) -> f64 {
        self.proximity_buffer_miles
    }

    pub fn attraction_proximity_range_miles(&self) -> f64 {
        self.attraction_proximity_range_miles
    }

    pub fn oracle_timeout_ms(&self) -> u64 {
        self.oracle_timeout_ms
    }

    pub fn rewards_concurrency(&self) -> usize {
        self.rewards_concurrency
    }

    pub fn location_timeout_ms(&self) -> u64 {
        self.location_timeout_ms
    }

    pub fn gps_latency_ms(&self) -> u64 {
        self.gps_latency_ms
    }

    pub fn reward_central_latency_ms(&self) -> u64 {
        self.reward_central_latency_ms
    }

    pub fn trip_pricer_api_key(&self) -> &str {
        &self.trip_pricer_api_key
    }

    pub fn trip_pricer_timeout_ms(&self) -> u64 {
        self.trip_pricer_timeout_ms
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn internal_user_count(&self) -> usize {
        self.internal_user_count
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    /// Configured catalog override (empty means use the built-in catalog)
    pub fn attractions(&self) -> &[AttractionEntry] {
        &self.attractions
    }

    /// Builder method to set the number of internal users
    pub fn with_internal_user_count(mut self, count: usize) -> Self {
        self.internal_user_count = count;
        self
    }

    /// Builder method to set the tracking interval
    pub fn with_tracking_interval_secs(mut self, secs: u64) -> Self {
        self.tracking_interval_secs = secs.max(1);
        self
    }

    /// Builder method to set how many users one tracking pass runs at once
    pub fn with_tracking_concurrency(mut self, concurrency: usize) -> Self {
        self.tracking_concurrency = concurrency.max(1);
        self
    }

    /// Builder method for upstream timeouts (location fix and oracle)
    pub fn with_upstream_timeout_ms(mut self, ms: u64) -> Self {
        self.location_timeout_ms = ms;
        self.oracle_timeout_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1");
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.proximity_buffer_miles(), 10.0);
        assert_eq!(config.attraction_proximity_range_miles(), 200.0);
        assert_eq!(config.tracking_interval_secs(), 300);
        assert_eq!(config.internal_user_count(), 100);
        assert_eq!(config.trip_pricer_api_key(), "test-server-api-key");
        assert!(config.test_mode());
        assert!(config.tracker_enabled());
        assert!(config.attractions().is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::parse("", "inline".to_string()).unwrap();
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.rewards_concurrency(), 16);
        assert_eq!(config.config_file(), "inline");
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = Config::parse("[tracker]\nconcurrency = 0\n", "inline".to_string()).unwrap();
        assert_eq!(config.tracking_concurrency(), 1);
    }

    #[test]
    fn test_range_below_buffer_is_rejected() {
        let toml = "[rewards]\nproximity_buffer_miles = 50.0\nattraction_proximity_range_miles = 20.0\n";
        assert!(Config::parse(toml, "inline".to_string()).is_err());
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_internal_user_count(3)
            .with_tracking_interval_secs(0)
            .with_upstream_timeout_ms(25);
        assert_eq!(config.internal_user_count(), 3);
        assert_eq!(config.tracking_interval_secs(), 1);
        assert_eq!(config.location_timeout_ms(), 25);
        assert_eq!(config.oracle_timeout_ms(), 25);
    }
}
