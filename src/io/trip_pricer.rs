//! Trip pricing: turns reward points and preferences into offers

use crate::domain::{Provider, TourGuideError, UserId, UserPreferences};
use async_trait::async_trait;
use rand::Rng;
use uuid::Uuid;

/// Upper bound on offers returned for one quote
pub const MAX_PROVIDERS: usize = 10;

const PROVIDER_NAMES: [&str; MAX_PROVIDERS] = [
    "Holiday Travels",
    "Enterprize Ventures Limited",
    "Sunny Days",
    "FlyAway Trips",
    "United Partners Vacations",
    "Dream Trips",
    "Live Free",
    "Dancing Waves Cruselines and Partners",
    "AdventureCo",
    "Cure-Your-Blues",
];

/// One-shot quote request
#[derive(Debug, Clone)]
pub struct TripQuoteRequest {
    pub api_key: String,
    pub user_id: UserId,
    pub preferences: UserPreferences,
    pub cumulative_reward_points: u64,
}

#[async_trait]
pub trait TripPricing: Send + Sync {
    async fn quote(&self, request: &TripQuoteRequest) -> Result<Vec<Provider>, TourGuideError>;
}

/// Simulated trip pricer
#[derive(Debug, Default)]
pub struct TripPricerSimulator;

#[async_trait]
impl TripPricing for TripPricerSimulator {
    async fn quote(&self, request: &TripQuoteRequest) -> Result<Vec<Provider>, TourGuideError> {
        if request.api_key.is_empty() {
            return Err(TourGuideError::unavailable("trip_pricer", "missing api key"));
        }

        let prefs = &request.preferences;
        let nights = f64::from(prefs.trip_duration.max(1));
        let adults = f64::from(prefs.number_of_adults);
        let children = f64::from(prefs.number_of_children);
        let discount = request.cumulative_reward_points as f64;

        let mut rng = rand::rng();
        let providers = PROVIDER_NAMES
            .iter()
            .map(|name| {
                let nightly: f64 = rng.random_range(100.0..1100.0);
                let price = (nightly * adults + nightly * children / 2.0) * nights - discount;
                Provider { trip_id: Uuid::new_v4(), name: (*name).to_string(), price: price.max(0.0) }
            })
            .collect();
        Ok(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(points: u64) -> TripQuoteRequest {
        TripQuoteRequest {
            api_key: "test-server-api-key".to_string(),
            user_id: UserId::new(),
            preferences: UserPreferences { number_of_adults: 2, ..Default::default() },
            cumulative_reward_points: points,
        }
    }

    #[tokio::test]
    async fn test_quote_is_bounded() {
        let offers = TripPricerSimulator.quote(&request(0)).await.unwrap();
        assert_eq!(offers.len(), MAX_PROVIDERS);
        assert!(offers.iter().all(|p| p.price >= 200.0));
    }

    #[tokio::test]
    async fn test_price_never_negative() {
        let offers = TripPricerSimulator.quote(&request(1_000_000)).await.unwrap();
        assert!(offers.iter().all(|p| p.price == 0.0));
    }

    #[tokio::test]
    async fn test_missing_key_is_upstream_fault() {
        let mut req = request(0);
        req.api_key.clear();
        let err = TripPricerSimulator.quote(&req).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
