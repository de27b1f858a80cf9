//! Environment-driven worker configuration.
//!
//! Every tunable has a named default; the environment only overrides.
//! Provider tokens are optional — a worker with no Serper or Brave key
//! simply runs without that provider (or entirely in replay mode).

use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::EnrichmentBudget;
use crate::score::GateConfig;
use crate::sources::GithubDiscoveryConfig;

/// Worker configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: Option<String>,
    /// Redis URL for the durable queue.
    pub queue_url: Option<String>,
    /// Serper.dev API key.
    pub serper_api_key: Option<String>,
    /// Brave Search API key.
    pub brave_api_key: Option<String>,
    /// GitHub token.
    pub github_token: Option<String>,
    /// Worker concurrency.
    pub worker_concurrency: usize,
    /// Default run budget.
    pub budget: EnrichmentBudget,
    /// Persistence-gate thresholds.
    pub gate: GateConfig,
    /// Queries allotted to the reverse-link pass.
    pub reverse_link_budget: u32,
    /// GitHub direct-phase settings.
    pub github: GithubDiscoveryConfig,
    /// Path to replay fixtures; set implies replay mode.
    pub replay_fixtures_path: Option<String>,
    /// HTTP bind address for the server.
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            queue_url: None,
            serper_api_key: None,
            brave_api_key: None,
            github_token: None,
            worker_concurrency: 3,
            budget: EnrichmentBudget::default(),
            gate: GateConfig::default(),
            reverse_link_budget: 5,
            github: GithubDiscoveryConfig::default(),
            replay_fixtures_path: None,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("invalid value for {key}: {raw}"))),
    }
}

fn env_flag(key: &str) -> bool {
    env_string(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Config {
    /// Assemble from the process environment.
    ///
    /// # Errors
    /// Returns a config error when a set variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            database_url: env_string("DATABASE_URL"),
            queue_url: env_string("QUEUE_URL"),
            serper_api_key: env_string("SERPER_API_KEY"),
            brave_api_key: env_string("BRAVE_API_KEY"),
            github_token: env_string("GITHUB_TOKEN"),
            replay_fixtures_path: env_string("BRIDGESCOUT_REPLAY_FIXTURES"),
            ..Self::default()
        };

        if let Some(concurrency) = env_parse::<usize>("WORKER_CONCURRENCY")? {
            config.worker_concurrency = concurrency.max(1);
        }
        if let Some(max_queries) = env_parse::<u32>("BRIDGESCOUT_MAX_QUERIES")? {
            config.budget.max_queries = max_queries;
        }
        if let Some(max_platforms) = env_parse::<u32>("BRIDGESCOUT_MAX_PLATFORMS")? {
            config.budget.max_platforms = max_platforms;
        }
        if let Some(parallel) = env_parse::<u32>("BRIDGESCOUT_MAX_PARALLEL_PLATFORMS")? {
            config.budget.max_parallel_platforms = parallel.max(1);
        }
        if let Some(secs) = env_parse::<u64>("BRIDGESCOUT_TIMEOUT_SECS")? {
            config.budget.timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = env_parse::<f64>("BRIDGESCOUT_EARLY_STOP_CONFIDENCE")? {
            config.budget.min_confidence_for_early_stop = threshold;
        }
        if let Some(min) = env_parse::<f64>("BRIDGESCOUT_MIN_CONFIDENCE")? {
            config.gate.min_confidence = min;
        }
        if let Some(cap) = env_parse::<u32>("BRIDGESCOUT_TIER2_CAP")? {
            config.gate.tier2_cap = cap;
        }
        if let Some(budget) = env_parse::<u32>("BRIDGESCOUT_REVERSE_LINK_BUDGET")? {
            config.reverse_link_budget = budget;
        }
        config.github.commit_evidence_enabled = env_flag("BRIDGESCOUT_COMMIT_EVIDENCE");
        if let Some(repos) = env_parse::<u32>("BRIDGESCOUT_COMMIT_EVIDENCE_REPOS")? {
            config.github.commit_evidence_max_repos = repos;
        }
        if let Some(addr) = env_string("BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }

    /// True when the worker should intercept all transports with fixtures.
    #[must_use]
    pub fn replay_mode(&self) -> bool {
        self.replay_fixtures_path.is_some()
    }
}
