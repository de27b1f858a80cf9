//! The worker pool: drains the queue, drives the pipeline, owns the
//! session lifecycle.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::{EnrichmentJob, JobDisposition, JobQueue, LeasedJob};
use crate::error::Result;
use crate::model::{EnrichmentSession, RoleType, SessionStatus};
use crate::pipeline::DiscoveryPipeline;
use crate::store::Store;

/// Poll interval for the queue when idle.
const POP_TIMEOUT: Duration = Duration::from_secs(1);

/// Shutdown signal shared between the worker loop and in-flight jobs.
/// Setting it stops new pops immediately and cancels running pipelines at
/// their next phase checkpoint.
#[derive(Clone, Default)]
pub struct WorkerHandle {
    flag: Arc<AtomicBool>,
}

impl WorkerHandle {
    /// Request a graceful drain.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// The worker pool.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn Store>,
    pipeline: Arc<DiscoveryPipeline>,
    concurrency: usize,
    handle: WorkerHandle,
}

impl Worker {
    /// Build a worker over injected dependencies.
    #[must_use]
    pub fn new(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn Store>,
        pipeline: Arc<DiscoveryPipeline>,
        concurrency: usize,
    ) -> Self {
        Self {
            queue,
            store,
            pipeline,
            concurrency: concurrency.max(1),
            handle: WorkerHandle::default(),
        }
    }

    /// The shutdown handle; clone it into a signal listener.
    #[must_use]
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Drain the queue until shutdown. Jobs run concurrently up to the
    /// configured limit; the loop blocks on a free slot before popping so a
    /// drained shutdown never strands leased jobs.
    pub async fn run(&self) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<()> = JoinSet::new();
        info!(concurrency = self.concurrency, "worker started");

        while !self.handle.is_shutdown() {
            // Reap finished jobs without blocking.
            while join_set.try_join_next().is_some() {}

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let leased = match self.queue.pop(POP_TIMEOUT).await {
                Ok(Some(leased)) => leased,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "queue pop failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let queue = Arc::clone(&self.queue);
            let store = Arc::clone(&self.store);
            let pipeline = Arc::clone(&self.pipeline);
            let cancelled = self.handle.flag();
            join_set.spawn(async move {
                let _permit = permit;
                process_job(queue, store, pipeline, leased, cancelled).await;
            });
        }

        // Graceful drain: no new pops; in-flight jobs finish at their next
        // pipeline checkpoint.
        info!("worker draining, waiting for in-flight jobs");
        while join_set.join_next().await.is_some() {}
        info!("worker stopped");
        Ok(())
    }
}

/// Load or create the session record for a job.
async fn load_session(
    store: &Arc<dyn Store>,
    job: &EnrichmentJob,
) -> Result<EnrichmentSession> {
    if let Some(session) = store.get_session(&job.session_id).await? {
        return Ok(session);
    }
    Ok(EnrichmentSession::queued(
        &job.session_id,
        &job.tenant_id,
        &job.candidate_id,
        job.job_type,
        job.role_type.unwrap_or(RoleType::General),
        job.budget.clone().unwrap_or_default(),
        Utc::now(),
    ))
}

async fn process_job(
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn Store>,
    pipeline: Arc<DiscoveryPipeline>,
    leased: LeasedJob,
    cancelled: Arc<AtomicBool>,
) {
    let job_id = leased.job.session_id.clone();
    let mut session = match load_session(&store, &leased.job).await {
        Ok(session) => session,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to load session");
            let _ = queue.nack(&job_id).await;
            return;
        }
    };

    session.status = SessionStatus::Running;
    session.started_at = Some(Utc::now());
    if let Err(e) = store.put_session(&session).await {
        warn!(job_id = %job_id, error = %e, "failed to record running session");
    }

    let started = std::time::Instant::now();
    match pipeline.resolve(&mut session, &cancelled).await {
        Ok(outcome) => {
            session.status = if cancelled.load(Ordering::SeqCst) {
                SessionStatus::Cancelled
            } else {
                SessionStatus::Completed
            };
            session.finished_at = Some(Utc::now());
            session
                .duration_ms
                .get_or_insert(started.elapsed().as_millis() as u64);
            info!(
                job_id = %job_id,
                attempt = leased.attempt,
                persisted = outcome.persisted.len(),
                "job completed"
            );
            if let Err(e) = store.put_session(&session).await {
                error!(job_id = %job_id, error = %e, "failed to persist session");
            }
            let _ = queue.ack(&job_id, JobDisposition::Completed).await;
        }
        Err(e) => {
            // Recoverable failures go back for retry; fatal ones terminate
            // the job immediately.
            warn!(
                job_id = %job_id,
                candidate_id = %session.candidate_id,
                attempt = leased.attempt,
                kind = e.kind(),
                error = %e,
                "job failed"
            );
            if e.is_job_fatal() || leased.attempt >= super::DEFAULT_MAX_ATTEMPTS {
                session.status = SessionStatus::Failed;
                session.finished_at = Some(Utc::now());
                session.error_message = Some(e.to_string());
                session.error_details =
                    Some(serde_json::json!({ "kind": e.kind(), "attempt": leased.attempt }));
                if let Err(persist_err) = store.put_session(&session).await {
                    error!(job_id = %job_id, error = %persist_err,
                        "failed to persist failed session");
                }
                let _ = queue.ack(&job_id, JobDisposition::Failed).await;
            } else {
                session.error_message = Some(e.to_string());
                if let Err(persist_err) = store.put_session(&session).await {
                    error!(job_id = %job_id, error = %persist_err,
                        "failed to persist retrying session");
                }
                let _ = queue.nack(&job_id).await;
            }
        }
    }
}
