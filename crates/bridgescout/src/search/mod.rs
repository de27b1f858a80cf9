//! Search execution: the provider seam, per-provider rate limiting, retry
//! with backoff, quota fail-fast, and the replay transport used by the
//! offline evaluation harness.
//!
//! Providers (Serper, Brave, platform-native APIs) implement
//! [`SearchProvider`]; the [`SearchExecutor`] owns the only mutable shared
//! state in a worker process — the per-provider token buckets and quota
//! snapshots — and exposes no mutable configuration after construction.

mod executor;
mod rate;
mod replay;

pub use executor::{RetryPolicy, SearchExecutor, SearchExecutorBuilder};
pub use rate::{RateLimit, TokenBucket};
pub use replay::{ReplayFixtures, ReplayTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result URL.
    pub url: String,
    /// Result title.
    pub title: String,
    /// Result snippet.
    pub snippet: String,
    /// 1-based position in the provider's ranking.
    pub position: u32,
}

/// Remaining-quota snapshot parsed from provider response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// When the window resets.
    pub resets_at: SystemTime,
}

impl Quota {
    /// Fail-fast predicate: almost out of quota and the reset is far away.
    /// Once true, no further requests go to the provider within the run.
    #[must_use]
    pub fn should_fail_fast(&self, now: SystemTime) -> bool {
        const MIN_REMAINING: u32 = 5;
        const FAR_RESET: Duration = Duration::from_secs(5 * 60);
        self.remaining <= MIN_REMAINING
            && self
                .resets_at
                .duration_since(now)
                .is_ok_and(|d| d > FAR_RESET)
    }
}

/// A page of results plus any quota information the provider surfaced.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Result rows, in provider ranking order.
    pub hits: Vec<SearchHit>,
    /// Quota parsed from response headers, when available.
    pub quota: Option<Quota>,
}

impl SearchPage {
    /// A page with hits and no quota information.
    #[must_use]
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self { hits, quota: None }
    }
}

/// Typed search failure.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// 429 (or quota-style 403). Retried honoring `retry_after`.
    #[error("rate limited")]
    RateLimited {
        /// Parsed `Retry-After`, when the provider sent one.
        retry_after: Option<Duration>,
        /// Quota snapshot, when headers carried one.
        quota: Option<Quota>,
    },
    /// Connection-level failure. Retried.
    #[error("network error: {0}")]
    Network(String),
    /// Credentials rejected. Never retried.
    #[error("auth error: {0}")]
    Auth(String),
    /// Resource does not exist. Never retried.
    #[error("not found")]
    NotFound,
    /// Server-side failure (5xx). Retried.
    #[error("transient error: {0}")]
    Transient(String),
    /// Anything that should abort immediately.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl SearchError {
    /// True for kinds the executor retries with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network(_) | Self::Transient(_)
        )
    }
}

/// The provider seam. Implementations live in the integration crates;
/// the replay transport implements it over fixtures.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable provider name used in traces and metrics.
    fn name(&self) -> &str;

    /// Execute one query, returning up to `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<SearchPage, SearchError>;
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_fast_requires_low_remaining_and_far_reset() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let quota = Quota {
            remaining: 3,
            resets_at: now + Duration::from_secs(600),
        };
        assert!(quota.should_fail_fast(now));

        // Plenty remaining.
        let quota = Quota {
            remaining: 50,
            resets_at: now + Duration::from_secs(600),
        };
        assert!(!quota.should_fail_fast(now));

        // Reset is imminent.
        let quota = Quota {
            remaining: 2,
            resets_at: now + Duration::from_secs(30),
        };
        assert!(!quota.should_fail_fast(now));
    }

    #[test]
    fn retryable_kinds() {
        assert!(SearchError::RateLimited {
            retry_after: None,
            quota: None
        }
        .is_retryable());
        assert!(SearchError::Network("reset".into()).is_retryable());
        assert!(SearchError::Transient("502".into()).is_retryable());
        assert!(!SearchError::Auth("bad key".into()).is_retryable());
        assert!(!SearchError::NotFound.is_retryable());
        assert!(!SearchError::Fatal("boom".into()).is_retryable());
    }
}
