//! Worker-pool integration: jobs drain end to end, fatal errors terminate
//! without retry, shutdown stops the loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bridgescout::api::{EnrichOptions, EnrichmentService};
use bridgescout::model::{Candidate, EnrichmentStatus, JobType, SessionStatus};
use bridgescout::pipeline::{DiscoveryPipeline, PipelineDeps};
use bridgescout::progress::ProgressBus;
use bridgescout::queue::{
    EnrichmentJob, JobQueue, MemoryQueue, Worker,
};
use bridgescout::score::GateConfig;
use bridgescout::search::{RateLimit, ReplayFixtures, ReplayTransport, SearchExecutor};
use bridgescout::sources::{default_sources, GithubDiscoveryConfig, ReplayGithubApi};
use bridgescout::store::{MemoryStore, Store};

fn pipeline(store: Arc<MemoryStore>) -> Arc<DiscoveryPipeline> {
    let executor = Arc::new(
        SearchExecutor::builder()
            .provider(
                Arc::new(ReplayTransport::new(
                    "replay",
                    ReplayFixtures {
                        queries: HashMap::new(),
                    },
                )),
                RateLimit {
                    requests_per_second: 10_000.0,
                    burst_capacity: 10_000,
                },
            )
            .build(),
    );
    Arc::new(DiscoveryPipeline::new(PipelineDeps {
        store: store as Arc<dyn Store>,
        executor: executor.clone(),
        github: Arc::new(ReplayGithubApi::default()),
        sources: default_sources(executor),
        gate: GateConfig::default(),
        github_config: GithubDiscoveryConfig::default(),
        reverse_link_budget: 5,
        progress: ProgressBus::default(),
    }))
}

fn candidate() -> Candidate {
    Candidate {
        tenant_id: "t1".into(),
        id: "c1".into(),
        linkedin_slug: "jane-doe-12345".into(),
        linkedin_url: "https://www.linkedin.com/in/jane-doe-12345".into(),
        serp_title: "Jane Doe - SWE at Acme | LinkedIn".into(),
        serp_snippet: String::new(),
        serp_metadata: None,
        role_type: None,
        enrichment_status: EnrichmentStatus::None,
        last_enriched_at: None,
    }
}

async fn wait_for_status(
    store: &Arc<MemoryStore>,
    session_id: &str,
    wanted: SessionStatus,
) -> bool {
    for _ in 0..100 {
        if let Some(session) = store.get_session(session_id).await.unwrap() {
            if session.status == wanted {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn worker_completes_enqueued_job() {
    let store = Arc::new(MemoryStore::new());
    store.put_candidate(&candidate()).await.unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let service = EnrichmentService::new(store.clone(), queue.clone());

    let worker = Worker::new(queue, store.clone(), pipeline(store.clone()), 2);
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    let receipt = service
        .enrich("t1", "c1", EnrichOptions::default())
        .await
        .unwrap();

    assert!(wait_for_status(&store, &receipt.session_id, SessionStatus::Completed).await);
    let session = store
        .get_session(&receipt.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(session.started_at.is_some());
    assert!(session.finished_at.is_some());
    assert!(session.run_trace.is_some());

    let seed = store.get_candidate("t1", "c1").await.unwrap().unwrap();
    assert_eq!(seed.enrichment_status, EnrichmentStatus::Completed);
    assert!(seed.last_enriched_at.is_some());

    handle.shutdown();
    worker_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_candidate_fails_without_retry() {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(MemoryQueue::new());

    // Enqueue a job directly; the candidate does not exist.
    queue
        .enqueue(EnrichmentJob {
            session_id: "ses_ghost".into(),
            candidate_id: "missing".into(),
            tenant_id: "t1".into(),
            job_type: JobType::Enrich,
            role_type: None,
            budget: None,
            priority: 0,
        })
        .await
        .unwrap();

    let worker = Worker::new(queue.clone(), store.clone(), pipeline(store.clone()), 1);
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    assert!(wait_for_status(&store, "ses_ghost", SessionStatus::Failed).await);
    let session = store.get_session("ses_ghost").await.unwrap().unwrap();
    assert!(session
        .error_message
        .as_deref()
        .unwrap()
        .contains("candidate not found"));
    // Terminal: nothing left in the queue to retry.
    assert_eq!(queue.depth().await.unwrap(), 0);

    handle.shutdown();
    worker_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn summary_only_job_reaggregates() {
    let store = Arc::new(MemoryStore::new());
    store.put_candidate(&candidate()).await.unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let service = EnrichmentService::new(store.clone(), queue.clone());

    let worker = Worker::new(queue, store.clone(), pipeline(store.clone()), 1);
    let handle = worker.handle();
    let worker_task = tokio::spawn(async move { worker.run().await });

    let receipt = service.summarize("t1", "c1").await.unwrap();
    assert!(wait_for_status(&store, &receipt.session_id, SessionStatus::Completed).await);
    let session = store
        .get_session(&receipt.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.job_type, JobType::SummaryOnly);
    assert_eq!(session.identities_found, 0);

    handle.shutdown();
    worker_task.await.unwrap().unwrap();
}
