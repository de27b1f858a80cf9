//! The search executor: provider pool with rate limiting, retry with
//! jittered exponential backoff, quota tracking, and fail-fast.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use super::rate::{RateLimit, TokenBucket};
use super::{Quota, SearchError, SearchHit, SearchProvider};

/// Retry configuration. Defaults: base 1 s, cap 30 s, 3 attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// First backoff delay.
    pub base_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Jittered exponential delay for a zero-based retry index.
    fn delay_for(&self, retry_index: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(retry_index))
            .min(self.max_delay);
        // Full jitter in [exp/2, exp].
        let half = exp / 2;
        let jitter = rand::thread_rng().gen_range(0.0..=1.0);
        half + Duration::from_secs_f64(half.as_secs_f64() * jitter)
    }
}

struct ProviderSlot {
    provider: Arc<dyn SearchProvider>,
    bucket: TokenBucket,
    /// Latest quota snapshot from response headers.
    quota: Mutex<Option<Quota>>,
    /// True once any rate-limit response was observed.
    rate_limited: Mutex<bool>,
}

impl ProviderSlot {
    fn failed_fast(&self, now: SystemTime) -> bool {
        self.quota
            .lock()
            .is_some_and(|quota| quota.should_fail_fast(now))
    }

    fn record_quota(&self, quota: Option<Quota>) {
        if let Some(quota) = quota {
            *self.quota.lock() = Some(quota);
        }
    }
}

/// Builder for [`SearchExecutor`].
pub struct SearchExecutorBuilder {
    providers: Vec<(Arc<dyn SearchProvider>, RateLimit)>,
    retry: RetryPolicy,
}

impl SearchExecutorBuilder {
    /// Register a provider with its rate limit. Registration order is the
    /// priority order for merged web search.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn SearchProvider>, limit: RateLimit) -> Self {
        self.providers.push((provider, limit));
        self
    }

    /// Override the retry policy (tests use short delays).
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the executor.
    #[must_use]
    pub fn build(self) -> SearchExecutor {
        let mut order = Vec::with_capacity(self.providers.len());
        let mut slots = HashMap::new();
        for (provider, limit) in self.providers {
            let name = provider.name().to_string();
            order.push(name.clone());
            slots.insert(
                name,
                ProviderSlot {
                    provider,
                    bucket: TokenBucket::new(limit),
                    quota: Mutex::new(None),
                    rate_limited: Mutex::new(false),
                },
            );
        }
        SearchExecutor {
            order,
            slots,
            retry: self.retry,
        }
    }
}

/// Provider pool with rate limiting and retry. Stateful only at the pool
/// level; configuration is frozen at construction.
pub struct SearchExecutor {
    order: Vec<String>,
    slots: HashMap<String, ProviderSlot>,
    retry: RetryPolicy,
}

impl SearchExecutor {
    /// Start building an executor.
    #[must_use]
    pub fn builder() -> SearchExecutorBuilder {
        SearchExecutorBuilder {
            providers: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Registered provider names, in priority order.
    #[must_use]
    pub fn provider_names(&self) -> &[String] {
        &self.order
    }

    /// Providers that reported a rate limit at any point.
    #[must_use]
    pub fn rate_limited_providers(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| {
                self.slots
                    .get(*name)
                    .is_some_and(|slot| *slot.rate_limited.lock())
            })
            .cloned()
            .collect()
    }

    /// Execute a query against one named provider, with rate limiting,
    /// retries and quota fail-fast.
    pub async fn execute(
        &self,
        provider_name: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let slot = self
            .slots
            .get(provider_name)
            .ok_or_else(|| SearchError::Fatal(format!("unknown provider: {provider_name}")))?;
        self.execute_slot(slot, query, limit).await
    }

    /// Execute a query against the providers in priority order, returning
    /// the first success. Failed-fast and erroring providers are skipped.
    pub async fn search_web(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<(String, Vec<SearchHit>), SearchError> {
        let mut last_err = SearchError::Fatal("no search providers configured".to_string());
        for name in &self.order {
            let Some(slot) = self.slots.get(name) else {
                continue;
            };
            match self.execute_slot(slot, query, limit).await {
                Ok(hits) => return Ok((name.clone(), hits)),
                Err(e) => {
                    debug!(provider = %name, query, error = %e, "web search provider failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn execute_slot(
        &self,
        slot: &ProviderSlot,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let name = slot.provider.name().to_string();
        if slot.failed_fast(SystemTime::now()) {
            *slot.rate_limited.lock() = true;
            return Err(SearchError::RateLimited {
                retry_after: None,
                quota: *slot.quota.lock(),
            });
        }

        let mut attempt = 0;
        loop {
            slot.bucket.acquire().await;
            match slot.provider.search(query, limit).await {
                Ok(page) => {
                    slot.record_quota(page.quota);
                    return Ok(page.hits);
                }
                Err(err) => {
                    if let SearchError::RateLimited { quota, .. } = &err {
                        *slot.rate_limited.lock() = true;
                        slot.record_quota(*quota);
                        if slot.failed_fast(SystemTime::now()) {
                            warn!(
                                provider = %name,
                                "provider nearly exhausted with distant reset, failing fast"
                            );
                            return Err(err);
                        }
                    }
                    attempt += 1;
                    if !err.is_retryable() || attempt >= self.retry.max_attempts {
                        return Err(err);
                    }
                    let delay = match &err {
                        SearchError::RateLimited {
                            retry_after: Some(after),
                            ..
                        } => (*after).min(self.retry.max_delay),
                        _ => self.retry.delay_for(attempt - 1),
                    };
                    warn!(
                        provider = %name,
                        query,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying search after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Provider scripted to fail `failures` times, then succeed.
    struct FlakyProvider {
        name: String,
        failures: u32,
        calls: AtomicU32,
        error_kind: fn() -> SearchError,
    }

    #[async_trait]
    impl SearchProvider for FlakyProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, query: &str, _limit: usize) -> Result<SearchPage, SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error_kind)());
            }
            Ok(SearchPage::from_hits(vec![SearchHit {
                url: format!("https://example.com/{query}"),
                title: query.to_string(),
                snippet: String::new(),
                position: 1,
            }]))
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_attempts: 3,
        }
    }

    fn generous() -> RateLimit {
        RateLimit {
            requests_per_second: 1000.0,
            burst_capacity: 1000,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let provider = Arc::new(FlakyProvider {
            name: "flaky".into(),
            failures: 2,
            calls: AtomicU32::new(0),
            error_kind: || SearchError::Transient("503".into()),
        });
        let executor = SearchExecutor::builder()
            .provider(provider.clone(), generous())
            .retry_policy(fast_retry())
            .build();

        let hits = executor.execute("flaky", "jane doe", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_auth_errors() {
        let provider = Arc::new(FlakyProvider {
            name: "locked".into(),
            failures: 5,
            calls: AtomicU32::new(0),
            error_kind: || SearchError::Auth("bad key".into()),
        });
        let executor = SearchExecutor::builder()
            .provider(provider.clone(), generous())
            .retry_policy(fast_retry())
            .build();

        let err = executor.execute("locked", "q", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::Auth(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let provider = Arc::new(FlakyProvider {
            name: "down".into(),
            failures: 10,
            calls: AtomicU32::new(0),
            error_kind: || SearchError::Transient("502".into()),
        });
        let executor = SearchExecutor::builder()
            .provider(provider.clone(), generous())
            .retry_policy(fast_retry())
            .build();

        let err = executor.execute("down", "q", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::Transient(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    /// Provider that always rate-limits with an exhausted, far-reset quota.
    struct ExhaustedProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SearchProvider for ExhaustedProvider {
        fn name(&self) -> &str {
            "exhausted"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<SearchPage, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SearchError::RateLimited {
                retry_after: Some(Duration::from_millis(1)),
                quota: Some(Quota {
                    remaining: 2,
                    resets_at: SystemTime::now() + Duration::from_secs(3600),
                }),
            })
        }
    }

    #[tokio::test]
    async fn fail_fast_stops_further_requests() {
        let provider = Arc::new(ExhaustedProvider {
            calls: AtomicU32::new(0),
        });
        let executor = SearchExecutor::builder()
            .provider(provider.clone(), generous())
            .retry_policy(fast_retry())
            .build();

        let err = executor.execute("exhausted", "q1", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimited { .. }));
        // First call tripped the fail-fast predicate; no retries happened.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // A second query never reaches the provider.
        let _ = executor.execute("exhausted", "q2", 10).await.unwrap_err();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(executor.rate_limited_providers(), vec!["exhausted"]);
    }

    #[tokio::test]
    async fn merged_search_falls_through_to_next_provider() {
        let broken = Arc::new(FlakyProvider {
            name: "primary".into(),
            failures: 10,
            calls: AtomicU32::new(0),
            error_kind: || SearchError::Auth("expired".into()),
        });
        let healthy = Arc::new(FlakyProvider {
            name: "secondary".into(),
            failures: 0,
            calls: AtomicU32::new(0),
            error_kind: || SearchError::Fatal("unused".into()),
        });
        let executor = SearchExecutor::builder()
            .provider(broken, generous())
            .provider(healthy, generous())
            .retry_policy(fast_retry())
            .build();

        let (provider, hits) = executor.search_web("jane doe", 10).await.unwrap();
        assert_eq!(provider, "secondary");
        assert_eq!(hits.len(), 1);
    }
}
