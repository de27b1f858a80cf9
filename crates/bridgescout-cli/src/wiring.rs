//! Dependency wiring: environment config → stores, queue, transports,
//! pipeline, service. The only place real and replay implementations meet.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use bridgescout::api::EnrichmentService;
use bridgescout::config::Config;
use bridgescout::pipeline::{DiscoveryPipeline, PipelineDeps};
use bridgescout::progress::ProgressBus;
use bridgescout::queue::{JobQueue, MemoryQueue, RedisQueue, Worker};
use bridgescout::search::{RateLimit, ReplayTransport, SearchExecutor, SearchProvider};
use bridgescout::sources::{default_sources, GithubApi, ReplayGithubApi};
use bridgescout::store::{MemoryStore, PostgresStore, Store};
use bridgescout_brave::BraveProvider;
use bridgescout_evals::ReplayBundle;
use bridgescout_github::GithubClient;
use bridgescout_serper::SerperProvider;

/// Everything a process needs, wired once at startup.
pub struct Runtime {
    pub store: Arc<dyn Store>,
    pub queue: Arc<dyn JobQueue>,
    pub service: Arc<EnrichmentService>,
    pub progress: ProgressBus,
    pub pipeline: Arc<DiscoveryPipeline>,
    pub config: Config,
}

impl Runtime {
    /// Build a worker over this runtime.
    #[must_use]
    pub fn worker(&self) -> Worker {
        Worker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.store),
            Arc::clone(&self.pipeline),
            self.config.worker_concurrency,
        )
    }
}

/// Wire a runtime from the environment.
pub async fn build_runtime() -> Result<Runtime> {
    let config = Config::from_env().context("invalid configuration")?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresStore::connect(url)
                .await
                .context("postgres connection failed")?,
        ),
        None => {
            warn!("DATABASE_URL not set; using a non-durable in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let queue: Arc<dyn JobQueue> = match &config.queue_url {
        Some(url) => Arc::new(
            RedisQueue::connect(url, "bridgescout:enrichment")
                .await
                .context("redis connection failed")?,
        ),
        None => {
            warn!("QUEUE_URL not set; using a non-durable in-memory queue");
            Arc::new(MemoryQueue::new())
        }
    };

    let (executor, github) = build_transports(&config).await?;
    let progress = ProgressBus::default();

    let pipeline = Arc::new(DiscoveryPipeline::new(PipelineDeps {
        store: Arc::clone(&store),
        executor: Arc::clone(&executor),
        github,
        sources: default_sources(executor),
        gate: config.gate,
        github_config: config.github,
        reverse_link_budget: config.reverse_link_budget,
        progress: progress.clone(),
    }));

    let service = Arc::new(EnrichmentService::new(
        Arc::clone(&store),
        Arc::clone(&queue),
    ));

    Ok(Runtime {
        store,
        queue,
        service,
        progress,
        pipeline,
        config,
    })
}

async fn build_transports(
    config: &Config,
) -> Result<(Arc<SearchExecutor>, Arc<dyn GithubApi>)> {
    if let Some(path) = &config.replay_fixtures_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read replay fixtures at {path}"))?;
        let bundle = ReplayBundle::from_json(&raw).context("invalid replay fixtures")?;
        info!(path, "replay mode: all transports are fixture-backed");
        let executor = Arc::new(
            SearchExecutor::builder()
                .provider(
                    Arc::new(ReplayTransport::new("replay", bundle.web)),
                    RateLimit {
                        requests_per_second: 10_000.0,
                        burst_capacity: 10_000,
                    },
                )
                .build(),
        );
        return Ok((executor, Arc::new(bundle.github)));
    }

    let mut builder = SearchExecutor::builder();
    let mut any_provider = false;
    if let Some(key) = &config.serper_api_key {
        let serper =
            SerperProvider::new(key.clone()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        builder = builder.provider(
            Arc::new(serper) as Arc<dyn SearchProvider>,
            RateLimit {
                requests_per_second: 5.0,
                burst_capacity: 10,
            },
        );
        any_provider = true;
    }
    if let Some(key) = &config.brave_api_key {
        let brave = BraveProvider::new(key.clone()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        builder = builder.provider(
            Arc::new(brave) as Arc<dyn SearchProvider>,
            RateLimit {
                requests_per_second: 1.0,
                burst_capacity: 2,
            },
        );
        any_provider = true;
    }
    if !any_provider {
        warn!("no web-search provider configured; reverse-link and fan-out will find nothing");
    }
    let executor = Arc::new(builder.build());

    let github: Arc<dyn GithubApi> = match &config.github_token {
        Some(token) => Arc::new(
            GithubClient::with_token(token.clone()).map_err(|e| anyhow::anyhow!(e.to_string()))?,
        ),
        None => {
            warn!("GITHUB_TOKEN not set; using the anonymous 60 req/h quota");
            Arc::new(GithubClient::new().map_err(|e| anyhow::anyhow!(e.to_string()))?)
        }
    };

    Ok((executor, github))
}
