//! The durable job queue and the worker pool that drains it.
//!
//! Enqueue is idempotent: the session id doubles as the job id, so
//! re-submitting a session is a no-op while the first submission is
//! anywhere in the system. Jobs get three attempts with exponential
//! backoff starting at five seconds; completed jobs are retained for a
//! day, failed ones for a week (backend-enforced).

mod memory;
#[cfg(feature = "redis-queue")]
mod redis;
mod worker;

pub use memory::MemoryQueue;
#[cfg(feature = "redis-queue")]
pub use redis::RedisQueue;
pub use worker::{Worker, WorkerHandle};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::model::{EnrichmentBudget, JobType, RoleType};

/// Default attempts per job.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// First retry delay; doubles per attempt.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(5);
/// Completed-job retention.
pub const COMPLETED_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
/// Failed-job retention.
pub const FAILED_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Payload of one enrichment job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentJob {
    /// Session id; also the job id.
    pub session_id: String,
    pub candidate_id: String,
    pub tenant_id: String,
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<RoleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<EnrichmentBudget>,
    /// Higher runs first. Default 0.
    #[serde(default)]
    pub priority: i32,
}

/// A popped job with its attempt count (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct LeasedJob {
    pub job: EnrichmentJob,
    pub attempt: u32,
}

/// Retry delay for a 1-based attempt number.
#[must_use]
pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Terminal disposition reported on ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDisposition {
    Completed,
    Failed,
}

/// The durable queue seam.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job; returns the job id. Idempotent on the session id:
    /// re-enqueueing a live or retained job is a no-op.
    async fn enqueue(&self, job: EnrichmentJob) -> Result<String>;

    /// Pop the highest-priority ready job, waiting up to `timeout`.
    async fn pop(&self, timeout: Duration) -> Result<Option<LeasedJob>>;

    /// Acknowledge a leased job as terminally done (completed or failed).
    async fn ack(&self, job_id: &str, disposition: JobDisposition) -> Result<()>;

    /// Return a leased job for retry after a delay; once attempts are
    /// exhausted the backend moves it to failed instead.
    async fn nack(&self, job_id: &str) -> Result<()>;

    /// Ready + delayed job count, for `/health`.
    async fn depth(&self) -> Result<u64>;
}
