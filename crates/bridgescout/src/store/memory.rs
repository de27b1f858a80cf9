//! In-memory store for tests and replay evaluation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{Store, UpsertOutcome};
use crate::error::{Error, Result};
use crate::model::{
    Candidate, EnrichmentSession, EnrichmentStatus, IdentityCandidate, IdentityStatus, Platform,
};

type IdentityKey = (String, String, Platform, String);

/// HashMap-backed [`Store`]. Cheap to clone handles around via `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    candidates: RwLock<HashMap<(String, String), Candidate>>,
    identities: RwLock<HashMap<IdentityKey, IdentityCandidate>>,
    sessions: RwLock<HashMap<String, EnrichmentSession>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities (test helper).
    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.identities.read().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_candidate(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Option<Candidate>> {
        Ok(self
            .candidates
            .read()
            .get(&(tenant_id.to_string(), candidate_id.to_string()))
            .cloned())
    }

    async fn put_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.candidates.write().insert(
            (candidate.tenant_id.clone(), candidate.id.clone()),
            candidate.clone(),
        );
        Ok(())
    }

    async fn update_candidate_enrichment(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        status: EnrichmentStatus,
        last_enriched_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut candidates = self.candidates.write();
        let candidate = candidates
            .get_mut(&(tenant_id.to_string(), candidate_id.to_string()))
            .ok_or_else(|| Error::candidate_not_found(candidate_id))?;
        candidate.enrichment_status = status;
        if last_enriched_at.is_some() {
            candidate.last_enriched_at = last_enriched_at;
        }
        Ok(())
    }

    async fn upsert_identity(&self, identity: &IdentityCandidate) -> Result<UpsertOutcome> {
        let mut identities = self.identities.write();
        let key = identity.unique_key();
        match identities.get_mut(&key) {
            Some(existing) => {
                let created_at = existing.created_at;
                let status = existing.status;
                *existing = identity.clone();
                // Creation time and review status survive updates.
                existing.created_at = created_at;
                if status != IdentityStatus::Unconfirmed {
                    existing.status = status;
                }
                Ok(UpsertOutcome::Updated)
            }
            None => {
                identities.insert(key, identity.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn list_identities(
        &self,
        tenant_id: &str,
        candidate_id: &str,
    ) -> Result<Vec<IdentityCandidate>> {
        Ok(self
            .identities
            .read()
            .values()
            .filter(|i| i.tenant_id == tenant_id && i.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn set_identity_status(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        platform: Platform,
        platform_id: &str,
        status: IdentityStatus,
    ) -> Result<()> {
        let key = (
            tenant_id.to_string(),
            candidate_id.to_string(),
            platform,
            platform_id.to_string(),
        );
        let mut identities = self.identities.write();
        let identity = identities
            .get_mut(&key)
            .ok_or_else(|| Error::store(format!("identity not found: {platform}/{platform_id}")))?;
        identity.status = status;
        identity.updated_at = Utc::now();
        Ok(())
    }

    async fn put_session(&self, session: &EnrichmentSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<EnrichmentSession>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn recent_sessions(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<EnrichmentSession>> {
        let mut sessions: Vec<EnrichmentSession> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.candidate_id == candidate_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}
