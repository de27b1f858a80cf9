//! Structured run traces (observability and CI gating).
//!
//! A [`RunTrace`] is assembled incrementally by the discovery pipeline and
//! emitted verbatim into the session record. It carries per-platform
//! diagnostics, a variant-statistics histogram, and the funnel
//! `found → aboveMinConfidence → passingPersistGuard → persisted` that the
//! offline evaluation gates assert over.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{EnrichedHints, Platform};

/// Cap on unmatched-URL samples kept per platform.
pub const UNMATCHED_URL_SAMPLE_LIMIT: usize = 5;

/// The four-stage funnel. Invariant (checked by the eval gates):
/// `persisted ≤ passing_persist_guard ≤ above_min_confidence ≤ found`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funnel {
    /// Identities produced by scoring, before any filtering.
    pub identities_found_total: u32,
    /// Of those, identities at or above the minimum confidence.
    pub above_min_confidence: u32,
    /// Of those, identities accepted by the persistence gate.
    pub passing_persist_guard: u32,
    /// Of those, identities actually written.
    pub persisted: u32,
}

impl Funnel {
    /// True when the monotone-narrowing invariant holds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.persisted <= self.passing_persist_guard
            && self.passing_persist_guard <= self.above_min_confidence
            && self.above_min_confidence <= self.identities_found_total
    }
}

/// Executed/rejected counts for one query-variant id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStat {
    pub executed: u32,
    pub rejected: u32,
}

/// Diagnostics for one platform attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTrace {
    /// Queries issued against this platform.
    pub queries_executed: u32,
    /// Raw results returned by the provider.
    pub raw_results: u32,
    /// Results that survived platform routing / matching.
    pub matched_results: u32,
    /// Identities the adapter produced.
    pub identities_found: u32,
    /// Best confidence among them.
    pub best_confidence: Option<f64>,
    pub duration_ms: u64,
    /// Error string when the platform failed; it still contributes an empty
    /// result set rather than failing the run.
    pub error: Option<String>,
    /// True when the provider rate-limited us during this attempt.
    pub rate_limited: bool,
    /// Provider that served the queries (serper, brave, github-api, replay).
    pub provider: Option<String>,
    /// Scoring version used for this platform's identities.
    pub scoring_version: String,
    /// Bounded sample of URLs that did not match any routing rule.
    pub unmatched_url_sample: Vec<String>,
}

impl PlatformTrace {
    /// Record an unmatched URL, keeping at most
    /// [`UNMATCHED_URL_SAMPLE_LIMIT`] samples.
    pub fn sample_unmatched_url(&mut self, url: &str) {
        if self.unmatched_url_sample.len() < UNMATCHED_URL_SAMPLE_LIMIT {
            self.unmatched_url_sample.push(url.to_string());
        }
    }
}

/// Summary of the shadow dynamic scorer, observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowScoringSummary {
    /// Identities where the shadow total crossed a bucket boundary the
    /// static total did not.
    pub bucket_divergences: u32,
    /// Mean absolute difference between static and shadow totals.
    pub mean_abs_delta: f64,
    /// Identities the shadow scorer evaluated.
    pub scored: u32,
}

/// Aggregate section of the trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTotals {
    pub queries_planned: u32,
    pub queries_executed: u32,
    pub platforms_queried: u32,
    pub platforms_with_hits: u32,
    pub funnel: Funnel,
    pub persist_errors: u32,
    pub best_confidence: Option<f64>,
    pub providers_used: Vec<String>,
    pub rate_limited_providers: Vec<String>,
    /// Histogram keyed by variant id.
    pub variant_stats: BTreeMap<String, VariantStat>,
    pub shadow_scoring: ShadowScoringSummary,
}

/// The full structured trace attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTrace {
    /// Echo of the resolution input.
    pub candidate_id: String,
    pub linkedin_url: String,
    /// The hint snapshot the run used.
    pub seed_hints: EnrichedHints,
    /// Per-platform diagnostics, keyed by platform name.
    pub platforms: BTreeMap<Platform, PlatformTrace>,
    pub totals: TraceTotals,
    /// Single reason string when the run failed.
    pub failure_reason: Option<String>,
    /// Optional freeform summary metadata.
    pub summary: Option<serde_json::Value>,
}

/// Incremental builder the pipeline threads through its phases.
#[derive(Debug)]
pub struct TraceBuilder {
    trace: RunTrace,
}

impl TraceBuilder {
    /// Start a trace for one run.
    pub fn new(candidate_id: impl Into<String>, hints: EnrichedHints) -> Self {
        let linkedin_url = hints.linkedin_url.clone();
        Self {
            trace: RunTrace {
                candidate_id: candidate_id.into(),
                linkedin_url,
                seed_hints: hints,
                platforms: BTreeMap::new(),
                totals: TraceTotals::default(),
                failure_reason: None,
                summary: None,
            },
        }
    }

    /// Mutable access to (and creation of) one platform's diagnostics.
    pub fn platform(&mut self, platform: Platform) -> &mut PlatformTrace {
        self.trace.platforms.entry(platform).or_default()
    }

    /// Record a planned-query count.
    pub fn add_planned(&mut self, n: u32) {
        self.trace.totals.queries_planned += n;
    }

    /// Record executed queries, attributed to a variant id.
    pub fn record_executed(&mut self, variant_id: &str, n: u32) {
        self.trace.totals.queries_executed += n;
        self.trace
            .totals
            .variant_stats
            .entry(variant_id.to_string())
            .or_default()
            .executed += n;
    }

    /// Record a variant rejected by dedup or budget truncation.
    pub fn record_rejected_variant(&mut self, variant_id: &str) {
        self.trace
            .totals
            .variant_stats
            .entry(variant_id.to_string())
            .or_default()
            .rejected += 1;
    }

    /// Note a provider as used, once.
    pub fn note_provider(&mut self, provider: &str) {
        if !self
            .trace
            .totals
            .providers_used
            .iter()
            .any(|p| p == provider)
        {
            self.trace.totals.providers_used.push(provider.to_string());
        }
    }

    /// Note a provider as rate-limited, once.
    pub fn note_rate_limited(&mut self, provider: &str) {
        if !self
            .trace
            .totals
            .rate_limited_providers
            .iter()
            .any(|p| p == provider)
        {
            self.trace
                .totals
                .rate_limited_providers
                .push(provider.to_string());
        }
    }

    /// Funnel counters.
    pub fn funnel_mut(&mut self) -> &mut Funnel {
        &mut self.trace.totals.funnel
    }

    /// Shadow-scoring summary.
    pub fn shadow_mut(&mut self) -> &mut ShadowScoringSummary {
        &mut self.trace.totals.shadow_scoring
    }

    /// Record a persist error.
    pub fn record_persist_error(&mut self) {
        self.trace.totals.persist_errors += 1;
    }

    /// Record a run-level failure reason.
    pub fn set_failure(&mut self, reason: impl Into<String>) {
        self.trace.failure_reason = Some(reason.into());
    }

    /// Track the best confidence seen across the run.
    pub fn observe_confidence(&mut self, confidence: f64) {
        let best = self.trace.totals.best_confidence.get_or_insert(confidence);
        if confidence > *best {
            *best = confidence;
        }
    }

    /// Finalize: fill derived aggregate fields and return the trace.
    #[must_use]
    pub fn finish(mut self) -> RunTrace {
        self.trace.totals.platforms_queried = self.trace.platforms.len() as u32;
        self.trace.totals.platforms_with_hits = self
            .trace
            .platforms
            .values()
            .filter(|p| p.identities_found > 0)
            .count() as u32;
        self.trace
    }
}
