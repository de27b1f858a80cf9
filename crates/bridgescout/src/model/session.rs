//! Enrichment sessions: one durable record per resolution run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::budget::EnrichmentBudget;
use super::hint::RoleType;
use super::platform::Platform;

/// What a queued job should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Full discovery run.
    Enrich,
    /// Re-aggregate already persisted identities without new discovery.
    SummaryOnly,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Why a run stopped before exhausting all platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopReason {
    /// A Tier-1 match was persisted.
    Tier1Found,
    /// The query budget ran out.
    BudgetExhausted,
    /// Every planned platform was attempted.
    AllPlatformsDone,
    /// A persistable identity reached the early-stop confidence.
    ConfidenceReached,
    /// The overall run deadline expired.
    Timeout,
}

impl fmt::Display for EarlyStopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tier1Found => "tier1_found",
            Self::BudgetExhausted => "budget_exhausted",
            Self::AllPlatformsDone => "all_platforms_done",
            Self::ConfidenceReached => "confidence_reached",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// One resolution run, owned by `(tenant, candidate)` and keyed by id.
///
/// The session owns its run trace; identity candidates reference the session
/// through `discovered_by` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSession {
    pub id: String,
    pub tenant_id: String,
    pub candidate_id: String,
    pub status: SessionStatus,
    pub job_type: JobType,
    /// Role type the run was planned with.
    pub role_type: RoleType,
    /// Budget the run was planned with.
    pub budget: EnrichmentBudget,
    /// Platforms the planner intended to query.
    pub planned_sources: Vec<Platform>,
    /// Platforms actually attempted.
    pub executed_sources: Vec<Platform>,
    /// Queries the planner produced within budget.
    pub planned_queries: u32,
    /// Queries actually issued.
    pub executed_queries: u32,
    pub early_stop_reason: Option<EarlyStopReason>,
    pub identities_found: u32,
    pub identities_confirmed: u32,
    /// Best confidence among persisted identities.
    pub final_confidence: Option<f64>,
    pub error_message: Option<String>,
    /// Structured failure details, when the run failed.
    pub error_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    /// The structured run trace (see [`crate::trace::RunTrace`]).
    pub run_trace: Option<serde_json::Value>,
}

impl EnrichmentSession {
    /// A freshly enqueued session.
    pub fn queued(
        id: impl Into<String>,
        tenant_id: impl Into<String>,
        candidate_id: impl Into<String>,
        job_type: JobType,
        role_type: RoleType,
        budget: EnrichmentBudget,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            candidate_id: candidate_id.into(),
            status: SessionStatus::Queued,
            job_type,
            role_type,
            budget,
            planned_sources: Vec::new(),
            executed_sources: Vec::new(),
            planned_queries: 0,
            executed_queries: 0,
            early_stop_reason: None,
            identities_found: 0,
            identities_confirmed: 0,
            final_confidence: None,
            error_message: None,
            error_details: None,
            created_at: now,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            run_trace: None,
        }
    }

    /// True once the session reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }
}
