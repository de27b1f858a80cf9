//! Generic search-backed platform adapter.
//!
//! Covers the platforms without a native API integration: plan `site:` and
//! name queries, run them through the merged web search, route result URLs
//! to platform ids, and emit one observation per distinct id.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::route::route_url;
use super::{PlatformSource, SourceBudget, SourceOutcome};
use crate::model::{EnrichedHints, IdentityOrigin, Platform, QueryType};
use crate::plan::plan_platform_queries;
use crate::score::ProfileObservation;
use crate::search::{SearchError, SearchExecutor};

/// Results requested per query; generous enough to survive routing losses.
const RESULTS_PER_QUERY: usize = 10;

/// A [`PlatformSource`] backed entirely by web search.
pub struct SearchBackedSource {
    platform: Platform,
    executor: Arc<SearchExecutor>,
}

impl SearchBackedSource {
    /// Build an adapter for one platform.
    pub fn new(platform: Platform, executor: Arc<SearchExecutor>) -> Self {
        Self { platform, executor }
    }
}

#[async_trait]
impl PlatformSource for SearchBackedSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn discover(&self, hints: &EnrichedHints, budget: SourceBudget) -> SourceOutcome {
        let mut outcome = SourceOutcome::default();
        let queries = plan_platform_queries(self.platform, hints, budget.max_queries as usize);
        let mut seen_ids: HashSet<String> = HashSet::new();

        for query in queries {
            if outcome.observations.len() >= budget.max_results as usize {
                break;
            }
            outcome.record_query(&query.text, &query.variant_id);
            match self.executor.search_web(&query.text, RESULTS_PER_QUERY).await {
                Ok((provider, hits)) => {
                    outcome.provider.get_or_insert(provider);
                    outcome.raw_results += hits.len() as u32;
                    for hit in hits {
                        let Some((platform, platform_id)) = route_url(&hit.url) else {
                            if outcome.unmatched_urls.len() < 5 {
                                outcome.unmatched_urls.push(hit.url.clone());
                            }
                            continue;
                        };
                        if platform != self.platform {
                            continue;
                        }
                        outcome.matched_results += 1;
                        if !seen_ids.insert(platform_id.clone()) {
                            continue;
                        }
                        if outcome.observations.len() >= budget.max_results as usize {
                            break;
                        }
                        let origin = if query.query_type == QueryType::HandleBased {
                            IdentityOrigin::HandleLookup
                        } else {
                            IdentityOrigin::PlatformSearch
                        };
                        let mut observation = ProfileObservation::new(
                            platform,
                            platform_id,
                            hit.url.clone(),
                            origin,
                        );
                        observation.display_name = Some(hit.title.clone());
                        observation.bio = Some(hit.snippet.clone());
                        observation.serp_position = Some(hit.position);
                        outcome.observations.push(observation);
                    }
                }
                Err(err) => {
                    if matches!(err, SearchError::RateLimited { .. }) {
                        outcome.rate_limited = true;
                    }
                    debug!(
                        platform = %self.platform,
                        query = %query.text,
                        error = %err,
                        "platform query failed"
                    );
                    outcome.error = Some(err.to_string());
                }
            }
        }

        outcome
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hint, HintSource};
    use crate::search::{RateLimit, ReplayFixtures, ReplayTransport, SearchHit};
    use std::collections::HashMap;

    fn hints() -> EnrichedHints {
        let mut hints = EnrichedHints::empty(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
        );
        hints.name = Hint::present("Jane Doe", 0.95, HintSource::SerpTitle);
        hints
    }

    fn executor_with(queries: HashMap<String, Vec<SearchHit>>) -> Arc<SearchExecutor> {
        let transport = ReplayTransport::new("replay", ReplayFixtures { queries });
        Arc::new(
            SearchExecutor::builder()
                .provider(
                    Arc::new(transport),
                    RateLimit {
                        requests_per_second: 1000.0,
                        burst_capacity: 1000,
                    },
                )
                .build(),
        )
    }

    #[tokio::test]
    async fn routes_hits_to_observations() {
        let mut queries = HashMap::new();
        queries.insert(
            "site:npmjs.com/~janedoe".to_string(),
            vec![SearchHit {
                url: "https://www.npmjs.com/~janedoe".to_string(),
                title: "janedoe - npm".to_string(),
                snippet: "Packages by janedoe".to_string(),
                position: 1,
            }],
        );
        let source = SearchBackedSource::new(Platform::Npm, executor_with(queries));
        let outcome = source.discover(&hints(), SourceBudget::default()).await;

        assert_eq!(outcome.observations.len(), 1);
        let obs = &outcome.observations[0];
        assert_eq!(obs.platform, Platform::Npm);
        assert_eq!(obs.platform_id, "janedoe");
        assert_eq!(obs.origin, IdentityOrigin::HandleLookup);
        assert!(outcome.queries_executed() >= 1);
        assert_eq!(outcome.provider.as_deref(), Some("replay"));
    }

    #[tokio::test]
    async fn cross_platform_hits_are_ignored() {
        let mut queries = HashMap::new();
        queries.insert(
            "site:kaggle.com/janedoe".to_string(),
            vec![SearchHit {
                url: "https://github.com/janedoe".to_string(),
                title: "wrong platform".to_string(),
                snippet: String::new(),
                position: 1,
            }],
        );
        let source = SearchBackedSource::new(Platform::Kaggle, executor_with(queries));
        let outcome = source.discover(&hints(), SourceBudget::default()).await;
        assert!(outcome.observations.is_empty());
        assert_eq!(outcome.raw_results, 1);
        assert_eq!(outcome.matched_results, 0);
    }

    #[tokio::test]
    async fn respects_max_results() {
        let mut queries = HashMap::new();
        queries.insert(
            "site:dribbble.com/janedoe".to_string(),
            (1..=8)
                .map(|i| SearchHit {
                    url: format!("https://dribbble.com/user{i}"),
                    title: format!("user{i}"),
                    snippet: String::new(),
                    position: i,
                })
                .collect(),
        );
        let source = SearchBackedSource::new(Platform::Dribbble, executor_with(queries));
        let outcome = source
            .discover(
                &hints(),
                SourceBudget {
                    max_results: 2,
                    max_queries: 3,
                },
            )
            .await;
        assert_eq!(outcome.observations.len(), 2);
    }
}
