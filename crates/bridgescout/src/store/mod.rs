//! Persistence: candidates, identity candidates, and sessions.
//!
//! One [`Store`] trait with two implementations: [`MemoryStore`] for tests
//! and replay evaluation, and `PostgresStore` (behind the
//! `postgres-store` feature) for production. Identity writes are upserts
//! on `(tenant_id, candidate_id, platform, platform_id)` with last-writer
//! semantics for mutable fields.

mod memory;
#[cfg(feature = "postgres-store")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres-store")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    Candidate, EnrichmentSession, EnrichmentStatus, IdentityCandidate, IdentityStatus, Platform,
};

/// What an identity upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// The persistence seam.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a candidate within a tenant.
    async fn get_candidate(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Option<Candidate>>;

    /// Insert or replace a candidate (ingestion path and test setup).
    async fn put_candidate(&self, candidate: &Candidate) -> Result<()>;

    /// Advance a candidate's enrichment status and timestamp.
    async fn update_candidate_enrichment(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        status: EnrichmentStatus,
        last_enriched_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Upsert one identity candidate by its unique key.
    async fn upsert_identity(&self, identity: &IdentityCandidate) -> Result<UpsertOutcome>;

    /// All identities for a candidate, unordered.
    async fn list_identities(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Vec<IdentityCandidate>>;

    /// Review-inbox transition: confirm or reject one identity.
    async fn set_identity_status(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        platform: Platform,
        platform_id: &str,
        status: IdentityStatus,
    ) -> Result<()>;

    /// Insert or replace a session record.
    async fn put_session(&self, session: &EnrichmentSession) -> Result<()>;

    /// Fetch a session by id.
    async fn get_session(&self, session_id: &str) -> Result<Option<EnrichmentSession>>;

    /// Most recent sessions for a candidate, newest first.
    async fn recent_sessions(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<EnrichmentSession>>;
}
