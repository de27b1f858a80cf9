//! Platform source adapters.
//!
//! Each discoverable platform implements [`PlatformSource`]: given the hint
//! snapshot and a per-source budget, return raw profile observations plus
//! the diagnostics fragment for the run trace. Adapters never score —
//! scoring and gating are centralized in the pipeline so every platform is
//! judged identically.

pub mod github;
mod linkscan;
mod route;
mod search_backed;

pub use github::{
    discover_github, CommitEvidence, GithubApi, GithubDiscoveryConfig, GithubUser,
    GithubUserSummary, ReplayGithubApi,
};
pub use linkscan::{iterative_decode, scan_profile_for_bridge, text_mentions_profile};
pub use route::{is_lead_gen_domain, route_url};
pub use search_backed::SearchBackedSource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::Platform;
use crate::score::ProfileObservation;
use crate::search::SearchExecutor;

/// Per-source slice of the run budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBudget {
    /// Observations to keep.
    pub max_results: u32,
    /// Queries the adapter may issue.
    pub max_queries: u32,
}

impl Default for SourceBudget {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_queries: 3,
        }
    }
}

/// What one platform attempt produced.
#[derive(Debug, Default)]
pub struct SourceOutcome {
    /// Profile observations, unscored.
    pub observations: Vec<ProfileObservation>,
    /// Queries actually issued, with their variant ids.
    pub executed: Vec<(String, String)>,
    /// Raw result rows seen.
    pub raw_results: u32,
    /// Rows that routed to a platform identity.
    pub matched_results: u32,
    /// Provider that served the queries.
    pub provider: Option<String>,
    /// True when a provider rate-limited during the attempt.
    pub rate_limited: bool,
    /// Error string when the platform failed (the outcome still counts,
    /// with an empty observation list).
    pub error: Option<String>,
    /// Bounded sample of unrouteable URLs.
    pub unmatched_urls: Vec<String>,
}

impl SourceOutcome {
    /// Record an executed query.
    pub fn record_query(&mut self, text: &str, variant_id: &str) {
        self.executed.push((text.to_string(), variant_id.to_string()));
    }

    /// Number of executed queries.
    #[must_use]
    pub fn queries_executed(&self) -> u32 {
        self.executed.len() as u32
    }
}

/// The adapter seam for the multi-platform fan-out.
#[async_trait]
pub trait PlatformSource: Send + Sync {
    /// Which platform this adapter discovers.
    fn platform(&self) -> Platform;

    /// Run discovery. Errors are reported inside the outcome, not raised;
    /// a failing platform contributes an empty result set.
    async fn discover(&self, hints: &crate::model::EnrichedHints, budget: SourceBudget)
        -> SourceOutcome;
}

/// The default fan-out set: every discoverable platform except GitHub,
/// which the pipeline handles in its dedicated direct phase.
#[must_use]
pub fn default_sources(executor: Arc<SearchExecutor>) -> Vec<Arc<dyn PlatformSource>> {
    Platform::DISCOVERABLE
        .iter()
        .filter(|p| **p != Platform::Github)
        .map(|p| {
            Arc::new(SearchBackedSource::new(*p, Arc::clone(&executor))) as Arc<dyn PlatformSource>
        })
        .collect()
}
