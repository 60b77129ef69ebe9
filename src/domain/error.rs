//! Fault taxonomy for tour guide operations
//!
//! Distance and matching never fail; every fault originates at the
//! boundary to an external collaborator or at a user lookup.

/// Errors surfaced by tracking, reward and lookup operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TourGuideError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("{service} unavailable: {detail}")]
    UpstreamUnavailable { service: &'static str, detail: String },

    #[error("{service} timed out after {timeout_ms}ms")]
    UpstreamTimeout { service: &'static str, timeout_ms: u64 },
}

impl TourGuideError {
    pub fn unavailable(service: &'static str, detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { service, detail: detail.into() }
    }

    /// True for faults raised by an external collaborator, timeouts included
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. } | Self::UpstreamTimeout { .. })
    }
}
