//! The input anchor: a tenant-scoped LinkedIn candidate seed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hint::RoleType;

/// Enrichment lifecycle state of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    #[default]
    None,
    InProgress,
    Completed,
    Failed,
}

/// A LinkedIn candidate seed.
///
/// Created by ingestion outside this engine; the worker only advances
/// `enrichment_status` and `last_enriched_at`. The SERP fields are the
/// engine's sole view of the person — LinkedIn itself is never fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Owning tenant.
    pub tenant_id: String,
    /// Immutable identifier.
    pub id: String,
    /// LinkedIn URL slug (e.g. `jane-doe-12345`).
    pub linkedin_slug: String,
    /// Full LinkedIn profile URL.
    pub linkedin_url: String,
    /// Stored SERP result title.
    pub serp_title: String,
    /// Stored SERP snippet.
    pub serp_snippet: String,
    /// Search-engine knowledge-graph / answer-box blob, when captured.
    pub serp_metadata: Option<serde_json::Value>,
    /// Role category, when known at ingestion.
    pub role_type: Option<RoleType>,
    /// Lifecycle state.
    pub enrichment_status: EnrichmentStatus,
    /// Timestamp of the last completed enrichment.
    pub last_enriched_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Effective role type, defaulting to `General`.
    #[must_use]
    pub fn role(&self) -> RoleType {
        self.role_type.unwrap_or_default()
    }
}
