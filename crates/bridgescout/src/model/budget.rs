//! Resource budget for one enrichment run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::platform::Platform;

/// Limits a single resolution run must respect. Exceeding any of them yields
/// a partial result with `EarlyStopReason::BudgetExhausted` rather than an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichmentBudget {
    /// Total queries across all phases and platforms.
    pub max_queries: u32,
    /// Platforms that may be attempted.
    pub max_platforms: u32,
    /// Identities kept per platform before aggregation.
    pub max_identities_per_platform: u32,
    /// Overall wall-clock timeout for the run, in seconds on the wire.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Platform adapters allowed in flight at once.
    pub max_parallel_platforms: u32,
    /// Confidence at which a persistable identity triggers an early stop.
    pub min_confidence_for_early_stop: f64,
}

impl Default for EnrichmentBudget {
    fn default() -> Self {
        Self {
            max_queries: 30,
            max_platforms: Platform::DISCOVERABLE.len() as u32,
            max_identities_per_platform: 5,
            timeout: Duration::from_secs(60),
            max_parallel_platforms: 3,
            min_confidence_for_early_stop: 0.90,
        }
    }
}

impl EnrichmentBudget {
    /// Cap `max_queries`, used by callers that want a cheaper run.
    #[must_use]
    pub fn with_max_queries(mut self, max_queries: u32) -> Self {
        self.max_queries = max_queries;
        self
    }

    /// Cap the platform fan-out.
    #[must_use]
    pub fn with_max_platforms(mut self, max_platforms: u32) -> Self {
        self.max_platforms = max_platforms;
        self
    }

    /// Override the run timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serialize the timeout as integer seconds, matching the stored job payload.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let budget = EnrichmentBudget::default();
        assert_eq!(budget.max_queries, 30);
        assert_eq!(budget.max_identities_per_platform, 5);
        assert_eq!(budget.timeout, Duration::from_secs(60));
        assert_eq!(budget.max_parallel_platforms, 3);
        assert_eq!(budget.min_confidence_for_early_stop, 0.90);
    }

    #[test]
    fn timeout_round_trips_as_seconds() {
        let budget = EnrichmentBudget::default().with_timeout(Duration::from_secs(15));
        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(json["timeout"], 15);
        let back: EnrichmentBudget = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Duration::from_secs(15));
    }
}
