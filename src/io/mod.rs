//! IO modules - external system interfaces
//!
//! - `gps` - Location fixes and the attraction catalog
//! - `reward_central` - Reward point oracle
//! - `trip_pricer` - Trip deal quotes
//! - `api` - HTTP API over the tour guide service
//! - `prometheus` - Prometheus text rendering for `/metrics`

pub mod api;
pub mod gps;
pub mod prometheus;
pub mod reward_central;
pub mod trip_pricer;

pub use api::start_api_server;
pub use gps::{AttractionSource, GpsSimulator};
pub use reward_central::{RewardCentral, RewardPointOracle};
pub use trip_pricer::{TripPricerSimulator, TripPricing};
