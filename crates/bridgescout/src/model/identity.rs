//! Platform identity candidates — the engine's output rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::bridge::{BridgeSignal, BridgeTier};
use super::platform::Platform;
use super::score::{ConfidenceBucket, ScoreBreakdown};

/// How an identity candidate entered the pipeline. Handle-match weight only
/// applies to handle-shaped origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityOrigin {
    /// Routed out of a reverse-link search result URL.
    ReverseLink,
    /// Returned by a platform-native search API.
    PlatformSearch,
    /// Looked up directly by a handle-shaped query.
    HandleLookup,
}

/// Review status of a persisted identity candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    #[default]
    Unconfirmed,
    Confirmed,
    Rejected,
}

/// Kind of evidence pointer attached to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    ProfileBio,
    ProfileBlog,
    PageMention,
    TeamPage,
    CommitMetadata,
    SearchResult,
    SpeakerPage,
}

/// An opaque URL-and-type pointer. Never carries emails or other raw PII.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Publicly reachable URL the evidence was observed at.
    pub url: String,
    /// What the pointer is.
    pub evidence_type: EvidenceType,
}

impl Evidence {
    pub fn new(url: impl Into<String>, evidence_type: EvidenceType) -> Self {
        Self {
            url: url.into(),
            evidence_type,
        }
    }
}

/// A scored platform profile proposed as the same person as the seed.
///
/// Uniqueness invariant: `(tenant_id, candidate_id, platform, platform_id)`.
/// Upserts merge updates under last-writer semantics for mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCandidate {
    pub tenant_id: String,
    pub candidate_id: String,
    pub platform: Platform,
    /// Platform-scoped id (login, package author handle, ORCID iD, ...).
    pub platform_id: String,
    /// Canonical profile URL.
    pub profile_url: String,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
    /// Discretised band of `confidence`.
    pub confidence_bucket: ConfidenceBucket,
    /// Weighted component breakdown.
    pub score_breakdown: ScoreBreakdown,
    /// Evidence pointers backing the score.
    pub evidence: Vec<Evidence>,
    /// True when the contradiction detector fired.
    pub has_contradiction: bool,
    /// Human-readable note explaining the contradiction.
    pub contradiction_note: Option<String>,
    /// Assigned bridge tier.
    pub bridge_tier: BridgeTier,
    /// Signals that produced the tier (sorted set, stable serialization).
    pub bridge_signals: BTreeSet<BridgeSignal>,
    /// Human-readable reason the persistence gate accepted this row.
    pub persist_reason: String,
    /// Session that discovered this identity.
    pub discovered_by: String,
    /// Review status.
    pub status: IdentityStatus,
    /// How the candidate entered the pipeline.
    pub origin: IdentityOrigin,
    /// SERP position of the search hit that surfaced it, for tie-breaking.
    pub serp_position: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdentityCandidate {
    /// The upsert key.
    #[must_use]
    pub fn unique_key(&self) -> (String, String, Platform, String) {
        (
            self.tenant_id.clone(),
            self.candidate_id.clone(),
            self.platform,
            self.platform_id.clone(),
        )
    }

    /// Confidence rounded to two decimals, the precision the aggregation
    /// sort breaks ties at.
    #[must_use]
    pub fn confidence_rounded(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }
}
