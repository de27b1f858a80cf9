//! The enqueue and session-read service surface.
//!
//! The HTTP layer and the CLI both go through [`EnrichmentService`]; it
//! owns tenant checks and session-id minting so every entry point behaves
//! identically.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{EnrichmentBudget, EnrichmentSession, JobType, RoleType};
use crate::queue::{EnrichmentJob, JobQueue};
use crate::store::Store;

/// Options accepted on enqueue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichOptions {
    pub role_type: Option<RoleType>,
    pub budget: Option<EnrichmentBudget>,
    pub priority: Option<i32>,
}

/// What enqueue returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueReceipt {
    pub session_id: String,
    pub job_id: String,
}

/// Enqueue + session reads over the store and queue.
pub struct EnrichmentService {
    store: Arc<dyn Store>,
    queue: Arc<dyn JobQueue>,
}

impl EnrichmentService {
    /// Build the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Enqueue a full enrichment run.
    ///
    /// # Errors
    /// `candidate_not_found` when the candidate does not exist under the
    /// calling tenant.
    pub async fn enrich(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        options: EnrichOptions,
    ) -> Result<EnqueueReceipt> {
        self.submit(tenant_id, candidate_id, JobType::Enrich, options)
            .await
    }

    /// Enqueue a summary-only pass.
    pub async fn summarize(&self, tenant_id: &str, candidate_id: &str) -> Result<EnqueueReceipt> {
        self.submit(
            tenant_id,
            candidate_id,
            JobType::SummaryOnly,
            EnrichOptions::default(),
        )
        .await
    }

    async fn submit(
        &self,
        tenant_id: &str,
        candidate_id: &str,
        job_type: JobType,
        options: EnrichOptions,
    ) -> Result<EnqueueReceipt> {
        // Candidate reads are tenant-scoped, so a candidate under another
        // tenant is indistinguishable from a missing one.
        let candidate = self
            .store
            .get_candidate(tenant_id, candidate_id)
            .await?
            .ok_or_else(|| Error::candidate_not_found(candidate_id))?;

        let session_id = format!("ses_{}", Uuid::new_v4().simple());
        let role_type = options
            .role_type
            .or(candidate.role_type)
            .unwrap_or_default();
        let budget = options.budget.clone().unwrap_or_default();

        let session = EnrichmentSession::queued(
            &session_id,
            tenant_id,
            candidate_id,
            job_type,
            role_type,
            budget.clone(),
            Utc::now(),
        );
        self.store.put_session(&session).await?;

        let job_id = self
            .queue
            .enqueue(EnrichmentJob {
                session_id: session_id.clone(),
                candidate_id: candidate_id.to_string(),
                tenant_id: tenant_id.to_string(),
                job_type,
                role_type: Some(role_type),
                budget: Some(budget),
                priority: options.priority.unwrap_or(0),
            })
            .await?;

        Ok(EnqueueReceipt { session_id, job_id })
    }

    /// Fetch one session.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<EnrichmentSession>> {
        self.store.get_session(session_id).await
    }

    /// Most recent sessions for a candidate.
    pub async fn recent_sessions(
        &self,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Vec<EnrichmentSession>> {
        self.store.recent_sessions(candidate_id, limit).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, EnrichmentStatus};
    use crate::queue::MemoryQueue;
    use crate::store::MemoryStore;

    fn candidate(tenant: &str, id: &str) -> Candidate {
        Candidate {
            tenant_id: tenant.into(),
            id: id.into(),
            linkedin_slug: "jane-doe-12345".into(),
            linkedin_url: "https://www.linkedin.com/in/jane-doe-12345".into(),
            serp_title: "Jane Doe - SWE | LinkedIn".into(),
            serp_snippet: String::new(),
            serp_metadata: None,
            role_type: None,
            enrichment_status: EnrichmentStatus::None,
            last_enriched_at: None,
        }
    }

    async fn service_with_candidate() -> EnrichmentService {
        let store = Arc::new(MemoryStore::new());
        store.put_candidate(&candidate("t1", "c1")).await.unwrap();
        EnrichmentService::new(store, Arc::new(MemoryQueue::new()))
    }

    #[tokio::test]
    async fn enrich_creates_session_and_job() {
        let service = service_with_candidate().await;
        let receipt = service
            .enrich("t1", "c1", EnrichOptions::default())
            .await
            .unwrap();
        assert_eq!(receipt.session_id, receipt.job_id);

        let session = service.get_session(&receipt.session_id).await.unwrap().unwrap();
        assert_eq!(session.candidate_id, "c1");
    }

    #[tokio::test]
    async fn unknown_candidate_is_not_found() {
        let service = service_with_candidate().await;
        let err = service
            .enrich("t1", "missing", EnrichOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "candidate_not_found");
    }

    #[tokio::test]
    async fn cross_tenant_candidate_is_hidden() {
        let service = service_with_candidate().await;
        let err = service
            .enrich("t2", "c1", EnrichOptions::default())
            .await
            .unwrap_err();
        // The candidate exists in another tenant, but reading through the
        // tenant-scoped accessor hides it entirely.
        assert_eq!(err.kind(), "candidate_not_found");
    }
}
