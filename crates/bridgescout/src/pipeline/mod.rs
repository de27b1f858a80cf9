//! The discovery pipeline (per-candidate resolution).
//!
//! A strict forward state machine:
//! load → reverse-link → GitHub direct → multi-platform fan-out →
//! aggregate → persist → trace. Every phase checks the deadline and the
//! cancellation flag at its boundary; platform failures are isolated and
//! recorded, never raised. The result is deterministic for identical
//! inputs: scoring is pure and the final ordering breaks ties on
//! (tier, rounded confidence, SERP position).

mod aggregate;
mod reverse_link;

pub use aggregate::{
    gate_identities, merge_observations, score_observation, sort_identities, GatedIdentity,
};
pub use reverse_link::{reverse_link_pass, ReverseLinkFinding, ReverseLinkOutcome};

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::hints::extract_hints;
use crate::model::{
    BridgeTier, EarlyStopReason, EnrichmentSession, EnrichmentStatus, IdentityCandidate,
    IdentityOrigin, JobType, Platform,
};
use crate::plan::plan_reverse_link_queries;
use crate::progress::{ProgressBus, ProgressKind};
use crate::score::{
    apply_tier1_boost, classify_bridge, compute_breakdown, detect_contradiction, GateConfig,
    ProfileObservation,
};
use crate::search::SearchExecutor;
use crate::sources::{
    discover_github, GithubApi, GithubDiscoveryConfig, PlatformSource, SourceBudget,
    SourceOutcome,
};
use crate::store::Store;
use crate::trace::{RunTrace, TraceBuilder};

/// Everything a pipeline needs, injected at worker construction.
pub struct PipelineDeps {
    pub store: Arc<dyn Store>,
    pub executor: Arc<SearchExecutor>,
    pub github: Arc<dyn GithubApi>,
    pub sources: Vec<Arc<dyn PlatformSource>>,
    pub gate: GateConfig,
    pub github_config: GithubDiscoveryConfig,
    /// Queries allotted to the reverse-link pass.
    pub reverse_link_budget: u32,
    pub progress: ProgressBus,
}

/// The per-candidate resolution engine.
pub struct DiscoveryPipeline {
    deps: PipelineDeps,
}

/// What one resolution produced.
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub persisted: Vec<IdentityCandidate>,
    pub trace: RunTrace,
}

impl DiscoveryPipeline {
    /// Build a pipeline over injected dependencies.
    #[must_use]
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Resolve one candidate, mutating the session record in place. The
    /// caller (the worker) persists the session afterwards.
    ///
    /// # Errors
    /// Only unrecoverable pipeline errors are returned (`candidate_not_found`,
    /// store failures on the critical path). Platform failures are recorded
    /// in the trace instead.
    pub async fn resolve(
        &self,
        session: &mut EnrichmentSession,
        cancelled: &AtomicBool,
    ) -> Result<ResolutionOutcome> {
        let deadline = Instant::now() + session.budget.timeout;
        let started = std::time::Instant::now();

        // --- Load -----------------------------------------------------
        self.emit_node(session, ProgressKind::NodeStart, "load", None);
        let candidate = self
            .deps
            .store
            .get_candidate(&session.tenant_id, &session.candidate_id)
            .await?
            .ok_or_else(|| Error::candidate_not_found(&session.candidate_id))?;

        // Best-effort status advance; a failure here must not kill the run.
        if let Err(e) = self
            .deps
            .store
            .update_candidate_enrichment(
                &session.tenant_id,
                &session.candidate_id,
                EnrichmentStatus::InProgress,
                None,
            )
            .await
        {
            warn!(candidate_id = %session.candidate_id, error = %e,
                "failed to mark candidate in_progress");
        }

        let mut hints = extract_hints(&candidate);
        hints.role_type = session.role_type;
        let mut trace = TraceBuilder::new(&session.candidate_id, hints.clone());
        self.emit_node(session, ProgressKind::NodeComplete, "load", None);

        if session.job_type == JobType::SummaryOnly {
            return self.summarize_only(session, trace).await;
        }

        let max_queries = session.budget.max_queries;
        let mut queries_used: u32 = 0;
        let mut early_stop: Option<EarlyStopReason> = None;
        let mut observations: Vec<ProfileObservation> = Vec::new();

        // --- Reverse link ---------------------------------------------
        let mut reverse_github: Vec<(String, BTreeSet<crate::model::BridgeSignal>, Option<String>)> =
            Vec::new();
        if self.check_boundary(session, cancelled, deadline, &mut early_stop) {
            self.emit_node(session, ProgressKind::NodeStart, "reverse_link", None);
            let allowance = self
                .deps
                .reverse_link_budget
                .min(max_queries.saturating_sub(queries_used));
            let planned = plan_reverse_link_queries(&hints, allowance as usize);
            trace.add_planned(planned.len() as u32);
            session.planned_queries += planned.len() as u32;

            let outcome =
                reverse_link_pass(&self.deps.executor, &hints, &planned, &mut trace).await;
            queries_used += outcome.queries_executed;
            if outcome.rate_limited {
                trace.platform(Platform::Web).rate_limited = true;
            }

            for finding in outcome.findings {
                if finding.platform == Platform::Github {
                    reverse_github.push((
                        finding.platform_id,
                        finding.signals,
                        Some(finding.bridge_url),
                    ));
                } else {
                    let mut observation = ProfileObservation::new(
                        finding.platform,
                        finding.platform_id,
                        finding.profile_url,
                        IdentityOrigin::ReverseLink,
                    );
                    observation.signals = finding.signals;
                    observation.serp_position = Some(finding.serp_position);
                    observation.evidence.push(crate::model::Evidence::new(
                        finding.bridge_url,
                        crate::model::EvidenceType::PageMention,
                    ));
                    observations.push(observation);
                }
            }
            self.emit_node(session, ProgressKind::NodeComplete, "reverse_link", None);
        }

        // --- GitHub direct --------------------------------------------
        if early_stop.is_none()
            && self.check_boundary(session, cancelled, deadline, &mut early_stop)
        {
            self.emit_node(
                session,
                ProgressKind::NodeStart,
                "github_direct",
                Some(Platform::Github),
            );
            let phase_started = std::time::Instant::now();
            let budget = SourceBudget {
                max_results: session.budget.max_identities_per_platform,
                max_queries: max_queries.saturating_sub(queries_used).min(5),
            };
            let outcome = discover_github(
                &self.deps.github,
                &hints,
                &reverse_github,
                budget,
                self.deps.github_config,
            )
            .await;

            queries_used += outcome.queries_executed();
            session.planned_queries += outcome.queries_executed();
            session.executed_sources.push(Platform::Github);
            self.record_source_outcome(
                &mut trace,
                Platform::Github,
                &outcome,
                phase_started.elapsed().as_millis() as u64,
            );
            observations.extend(outcome.observations);
            self.emit_node(
                session,
                ProgressKind::NodeComplete,
                "github_direct",
                Some(Platform::Github),
            );

            // Provisional peek: a Tier-1 or early-stop-confidence identity
            // makes the remaining fan-out unnecessary.
            early_stop = early_stop.or_else(|| self.peek_early_stop(&hints, &observations, session));
            if queries_used >= max_queries {
                early_stop.get_or_insert(EarlyStopReason::BudgetExhausted);
            }
        }

        // --- Multi-platform fan-out -----------------------------------
        if early_stop.is_none()
            && self.check_boundary(session, cancelled, deadline, &mut early_stop)
        {
            self.emit_node(session, ProgressKind::NodeStart, "fan_out", None);
            let fan_out = self
                .fan_out(session, &hints, deadline, max_queries, &mut queries_used, &mut trace)
                .await;
            match fan_out {
                Ok(mut fanned) => observations.append(&mut fanned),
                Err(reason) => {
                    early_stop.get_or_insert(reason);
                }
            }
            if queries_used >= max_queries {
                early_stop.get_or_insert(EarlyStopReason::BudgetExhausted);
            }
            self.emit_node(session, ProgressKind::NodeComplete, "fan_out", None);
        }

        // --- Aggregate -------------------------------------------------
        self.emit_node(session, ProgressKind::NodeStart, "aggregate", None);
        let now = Utc::now();
        let merged = merge_observations(observations);
        let scored: Vec<IdentityCandidate> = merged
            .iter()
            .map(|obs| {
                score_observation(
                    &hints,
                    obs,
                    &session.tenant_id,
                    &session.candidate_id,
                    &session.id,
                    now,
                    &mut trace,
                )
            })
            .collect();
        let gated = gate_identities(scored, &self.deps.gate, &mut trace);
        self.emit_node(session, ProgressKind::NodeComplete, "aggregate", None);

        // --- Persist ---------------------------------------------------
        self.emit_node(session, ProgressKind::NodeStart, "persist", None);
        let mut persisted = Vec::new();
        for gated_identity in &gated {
            if !gated_identity.decision.is_persist() {
                debug!(
                    platform = %gated_identity.identity.platform,
                    platform_id = %gated_identity.identity.platform_id,
                    reason = gated_identity.decision.reason(),
                    "identity dropped by persistence gate"
                );
                continue;
            }
            let identity = &gated_identity.identity;
            match self.deps.store.upsert_identity(identity).await {
                Ok(_) => {
                    trace.funnel_mut().persisted += 1;
                    persisted.push(identity.clone());
                    self.deps.progress.emit(
                        &session.id,
                        ProgressKind::IdentityFound,
                        "persist",
                        Some(identity.platform),
                        serde_json::json!({
                            "platformId": identity.platform_id,
                            "confidence": identity.confidence,
                            "bridgeTier": identity.bridge_tier.as_u8(),
                        }),
                    );
                    if identity.bridge_tier == BridgeTier::Tier1 {
                        early_stop.get_or_insert(EarlyStopReason::Tier1Found);
                    }
                }
                Err(e) => {
                    // Conflicts and store hiccups are per-identity, logged
                    // and sampled; the job carries on.
                    warn!(
                        candidate_id = %session.candidate_id,
                        platform = %identity.platform,
                        platform_id = %identity.platform_id,
                        error = %e,
                        "identity persist failed"
                    );
                    trace.record_persist_error();
                }
            }
        }

        if let Err(e) = self
            .deps
            .store
            .update_candidate_enrichment(
                &session.tenant_id,
                &session.candidate_id,
                EnrichmentStatus::Completed,
                Some(now),
            )
            .await
        {
            warn!(candidate_id = %session.candidate_id, error = %e,
                "failed to update candidate after enrichment");
        }
        self.emit_node(session, ProgressKind::NodeComplete, "persist", None);

        // --- Trace -----------------------------------------------------
        session.executed_queries = queries_used;
        session.early_stop_reason = early_stop;
        session.identities_found = trace.funnel_mut().identities_found_total;
        session.final_confidence = persisted
            .iter()
            .map(|i| i.confidence)
            .fold(None, |best: Option<f64>, c| {
                Some(best.map_or(c, |b| b.max(c)))
            });
        session.duration_ms = Some(started.elapsed().as_millis() as u64);

        for provider in self.deps.executor.rate_limited_providers() {
            trace.note_rate_limited(&provider);
        }
        let run_trace = trace.finish();
        session.run_trace = Some(serde_json::to_value(&run_trace)?);

        self.deps.progress.emit(
            &session.id,
            ProgressKind::Complete,
            "trace",
            None,
            serde_json::json!({
                "persisted": persisted.len(),
                "earlyStopReason": early_stop.map(|r| r.to_string()),
            }),
        );
        info!(
            candidate_id = %session.candidate_id,
            session_id = %session.id,
            persisted = persisted.len(),
            queries = queries_used,
            early_stop = ?early_stop,
            "resolution finished"
        );

        Ok(ResolutionOutcome {
            persisted,
            trace: run_trace,
        })
    }

    /// The `summary_only` job type: re-aggregate persisted identities
    /// without any discovery.
    async fn summarize_only(
        &self,
        session: &mut EnrichmentSession,
        trace: TraceBuilder,
    ) -> Result<ResolutionOutcome> {
        let mut identities = self
            .deps
            .store
            .list_identities(&session.tenant_id, &session.candidate_id)
            .await?;
        sort_identities(&mut identities);
        session.identities_found = identities.len() as u32;
        session.identities_confirmed = identities
            .iter()
            .filter(|i| i.status == crate::model::IdentityStatus::Confirmed)
            .count() as u32;
        session.final_confidence = identities.first().map(|i| i.confidence);
        let run_trace = trace.finish();
        session.run_trace = Some(serde_json::to_value(&run_trace)?);
        Ok(ResolutionOutcome {
            persisted: identities,
            trace: run_trace,
        })
    }

    /// Bounded-parallel platform fan-out with a collect barrier.
    async fn fan_out(
        &self,
        session: &mut EnrichmentSession,
        hints: &crate::model::EnrichedHints,
        deadline: Instant,
        max_queries: u32,
        queries_used: &mut u32,
        trace: &mut TraceBuilder,
    ) -> std::result::Result<Vec<ProfileObservation>, EarlyStopReason> {
        // One platform slot is already spent on GitHub.
        let remaining_platforms = session.budget.max_platforms.saturating_sub(1) as usize;
        let semaphore = Arc::new(Semaphore::new(
            session.budget.max_parallel_platforms.max(1) as usize,
        ));
        let mut join_set: JoinSet<(Platform, SourceOutcome, u64, u32)> = JoinSet::new();

        // Deterministic sequential budget allocation, then parallel execution.
        let mut planned_platforms = Vec::new();
        for source in self.deps.sources.iter().take(remaining_platforms) {
            let allowance = max_queries.saturating_sub(*queries_used).min(3);
            if allowance == 0 {
                break;
            }
            *queries_used += allowance;
            session.planned_queries += allowance;
            planned_platforms.push((Arc::clone(source), allowance));
        }

        for (source, allowance) in planned_platforms {
            let platform = source.platform();
            session.planned_sources.push(platform);
            let hints = hints.clone();
            let semaphore = Arc::clone(&semaphore);
            let budget = SourceBudget {
                max_results: session.budget.max_identities_per_platform,
                max_queries: allowance,
            };
            join_set.spawn(async move {
                // Acquire failure only happens when the semaphore is closed,
                // which cannot occur while the JoinSet is alive.
                let _permit = semaphore.acquire_owned().await;
                let started = std::time::Instant::now();
                let outcome = source.discover(&hints, budget).await;
                (platform, outcome, started.elapsed().as_millis() as u64, allowance)
            });
        }

        let mut observations = Vec::new();
        let mut unused: u32 = 0;
        loop {
            let next = tokio::time::timeout_at(deadline, join_set.join_next()).await;
            match next {
                Err(_) => {
                    // Deadline: abort in-flight platform tasks; their
                    // results are discarded by dropping the set.
                    join_set.abort_all();
                    return Err(EarlyStopReason::Timeout);
                }
                Ok(None) => break,
                Ok(Some(Err(join_err))) => {
                    warn!(error = %join_err, "platform task panicked");
                }
                Ok(Some(Ok((platform, outcome, duration_ms, allowance)))) => {
                    session.executed_sources.push(platform);
                    // Return unexercised allowance to the pool.
                    unused += allowance.saturating_sub(outcome.queries_executed());
                    self.record_source_outcome(trace, platform, &outcome, duration_ms);
                    self.deps.progress.emit(
                        &session.id,
                        ProgressKind::PlatformResult,
                        "fan_out",
                        Some(platform),
                        serde_json::json!({
                            "observations": outcome.observations.len(),
                            "queries": outcome.queries_executed(),
                        }),
                    );
                    observations.extend(outcome.observations);
                }
            }
        }
        *queries_used = queries_used.saturating_sub(unused);

        Ok(observations)
    }

    /// Provisional post-GitHub check for early-stop conditions, computed
    /// with the same pure scoring the aggregation phase will use.
    fn peek_early_stop(
        &self,
        hints: &crate::model::EnrichedHints,
        observations: &[ProfileObservation],
        session: &EnrichmentSession,
    ) -> Option<EarlyStopReason> {
        for obs in observations {
            let mut breakdown = compute_breakdown(hints, obs);
            let bridge = classify_bridge(&obs.signals, None);
            let contradiction = detect_contradiction(hints, obs, &bridge);
            apply_tier1_boost(&mut breakdown, &bridge, contradiction.detected);
            if bridge.tier == BridgeTier::Tier1 {
                return Some(EarlyStopReason::Tier1Found);
            }
            if breakdown.total >= session.budget.min_confidence_for_early_stop {
                let decision =
                    crate::score::decide(obs.platform, &breakdown, &bridge, 0, &self.deps.gate);
                if decision.is_persist() {
                    return Some(EarlyStopReason::ConfidenceReached);
                }
            }
        }
        None
    }

    /// Check deadline and cancellation at a phase boundary. Returns false
    /// when the pipeline must stop before the next phase.
    fn check_boundary(
        &self,
        session: &EnrichmentSession,
        cancelled: &AtomicBool,
        deadline: Instant,
        early_stop: &mut Option<EarlyStopReason>,
    ) -> bool {
        if cancelled.load(Ordering::Relaxed) {
            debug!(session_id = %session.id, "cancellation observed at phase boundary");
            return false;
        }
        if Instant::now() >= deadline {
            early_stop.get_or_insert(EarlyStopReason::Timeout);
            return false;
        }
        true
    }

    fn record_source_outcome(
        &self,
        trace: &mut TraceBuilder,
        platform: Platform,
        outcome: &SourceOutcome,
        duration_ms: u64,
    ) {
        trace.add_planned(outcome.queries_executed());
        for (_, variant_id) in &outcome.executed {
            trace.record_executed(variant_id, 1);
        }
        if let Some(provider) = &outcome.provider {
            trace.note_provider(provider);
        }
        let platform_trace = trace.platform(platform);
        platform_trace.queries_executed += outcome.queries_executed();
        platform_trace.raw_results += outcome.raw_results;
        platform_trace.matched_results += outcome.matched_results;
        platform_trace.identities_found += outcome.observations.len() as u32;
        platform_trace.duration_ms += duration_ms;
        platform_trace.rate_limited |= outcome.rate_limited;
        platform_trace.scoring_version = crate::model::SCORING_VERSION.to_string();
        if platform_trace.provider.is_none() {
            platform_trace.provider.clone_from(&outcome.provider);
        }
        if let Some(error) = &outcome.error {
            platform_trace.error = Some(error.clone());
        }
        for url in &outcome.unmatched_urls {
            platform_trace.sample_unmatched_url(url);
        }
    }

    fn emit_node(
        &self,
        session: &EnrichmentSession,
        kind: ProgressKind,
        node: &str,
        platform: Option<Platform>,
    ) {
        self.deps.progress.emit(
            &session.id,
            kind,
            node,
            platform,
            serde_json::json!({}),
        );
    }
}
