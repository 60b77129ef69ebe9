//! In-memory user store
//!
//! Users live for the whole process. In test mode the registry is seeded with
//! synthetic `internalUser{i}` accounts, each carrying a short random history.

use crate::domain::{User, UserId, VisitedLocation};
use crate::io::gps::random_coordinate;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Locations generated per internal user
const INTERNAL_HISTORY_LEN: usize = 3;
/// Internal history spans this many past days
const INTERNAL_HISTORY_DAYS: i64 = 30;

#[derive(Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<String, Arc<User>>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with `count` internal test users
    pub fn with_internal_users(count: usize) -> Self {
        let registry = Self::new();
        let mut rng = rand::rng();
        for i in 0..count {
            let user_name = format!("internalUser{i}");
            let user = User::new(UserId::new(), &user_name, "000", &format!("{user_name}@tourGuide.com"));
            for _ in 0..INTERNAL_HISTORY_LEN {
                let days_ago = rng.random_range(0..INTERNAL_HISTORY_DAYS);
                user.add_visited_location(VisitedLocation::new(
                    user.user_id(),
                    random_coordinate(&mut rng),
                    Utc::now() - Duration::days(days_ago),
                ));
            }
            registry.add_user(user);
        }
        debug!(count = %count, "internal_users_created");
        registry
    }

    pub fn get(&self, user_name: &str) -> Option<Arc<User>> {
        self.users.read().get(user_name).cloned()
    }

    /// Register a user; an existing user with the same name is kept
    pub fn add_user(&self, user: User) -> Arc<User> {
        let mut users = self.users.write();
        users.entry(user.user_name().to_string()).or_insert_with(|| Arc::new(user)).clone()
    }

    pub fn all(&self) -> Vec<Arc<User>> {
        self.users.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_users() {
        let registry = UserRegistry::with_internal_users(5);
        assert_eq!(registry.len(), 5);

        let user = registry.get("internalUser3").unwrap();
        assert_eq!(user.email_address(), "internalUser3@tourGuide.com");
        assert_eq!(user.phone_number(), "000");
        assert_eq!(user.visited_location_count(), INTERNAL_HISTORY_LEN);
        assert!(registry.get("internalUser5").is_none());
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = UserRegistry::new();
        let first = registry.add_user(User::new(UserId::new(), "jon", "000", "jon@tourGuide.com"));
        let second = registry.add_user(User::new(UserId::new(), "jon", "111", "other@tourGuide.com"));

        assert_eq!(registry.len(), 1);
        assert_eq!(first.user_id(), second.user_id());
        assert_eq!(registry.get("jon").unwrap().phone_number(), "000");
    }

    #[test]
    fn test_unknown_user() {
        let registry = UserRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("nobody").is_none());
    }
}
