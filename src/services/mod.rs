//! Services - business logic and state management
//!
//! - `tour_guide` - User-facing operations and per-user location tracking
//! - `tracker` - Periodic tracking passes over all registered users
//! - `rewards` - Reward calculation against the attraction catalog
//! - `proximity` - Distance thresholds for visits and attraction range
//! - `ranker` - Nearest-attraction ranking
//! - `user_registry` - In-memory user store

pub mod proximity;
pub mod ranker;
pub mod rewards;
pub mod tour_guide;
pub mod tracker;
pub mod user_registry;

pub use proximity::ProximityMatcher;
pub use rewards::{RewardReport, RewardsService};
pub use tour_guide::{TourGuideService, TrackedLocation};
pub use tracker::{Tracker, TrackingSummary};
pub use user_registry::UserRegistry;
