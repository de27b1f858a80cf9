//! End-to-end resolution scenarios over replay fixtures.
//!
//! Each test wires the pipeline with an in-memory store, a fixture-backed
//! web search transport and a fixture-backed GitHub API, then drives a full
//! resolution and asserts on the persisted identities and the run trace.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use bridgescout::model::{
    BridgeSignal, BridgeTier, Candidate, ConfidenceBucket, EnrichmentBudget, EnrichmentStatus,
    EnrichmentSession, JobType, Platform, RoleType,
};
use bridgescout::pipeline::{DiscoveryPipeline, PipelineDeps, ResolutionOutcome};
use bridgescout::plan::plan_reverse_link_queries;
use bridgescout::progress::ProgressBus;
use bridgescout::score::GateConfig;
use bridgescout::search::{
    RateLimit, ReplayFixtures, ReplayTransport, SearchExecutor, SearchHit,
};
use bridgescout::sources::{
    default_sources, GithubDiscoveryConfig, GithubUser, GithubUserSummary, ReplayGithubApi,
};
use bridgescout::store::{MemoryStore, Store};

fn candidate(slug: &str, title: &str, snippet: &str, meta: Option<serde_json::Value>) -> Candidate {
    Candidate {
        tenant_id: "t1".into(),
        id: "c1".into(),
        linkedin_slug: slug.into(),
        linkedin_url: format!("https://www.linkedin.com/in/{slug}"),
        serp_title: title.into(),
        serp_snippet: snippet.into(),
        serp_metadata: meta,
        role_type: None,
        enrichment_status: EnrichmentStatus::None,
        last_enriched_at: None,
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    pipeline: DiscoveryPipeline,
}

impl Harness {
    fn new(
        web_fixtures: HashMap<String, Vec<SearchHit>>,
        github: ReplayGithubApi,
        gate: GateConfig,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let executor = Arc::new(
            SearchExecutor::builder()
                .provider(
                    Arc::new(ReplayTransport::new(
                        "replay",
                        ReplayFixtures {
                            queries: web_fixtures,
                        },
                    )),
                    RateLimit {
                        requests_per_second: 10_000.0,
                        burst_capacity: 10_000,
                    },
                )
                .build(),
        );
        let pipeline = DiscoveryPipeline::new(PipelineDeps {
            store: store.clone() as Arc<dyn Store>,
            executor: executor.clone(),
            github: Arc::new(github),
            sources: default_sources(executor),
            gate,
            github_config: GithubDiscoveryConfig::default(),
            reverse_link_budget: 5,
            progress: ProgressBus::default(),
        });
        Self { store, pipeline }
    }

    async fn resolve(
        &self,
        candidate: Candidate,
        role: RoleType,
        budget: EnrichmentBudget,
    ) -> (EnrichmentSession, ResolutionOutcome) {
        self.store.put_candidate(&candidate).await.unwrap();
        let mut session = EnrichmentSession::queued(
            "ses_test",
            &candidate.tenant_id,
            &candidate.id,
            JobType::Enrich,
            role,
            budget,
            Utc::now(),
        );
        let outcome = self
            .pipeline
            .resolve(&mut session, &AtomicBool::new(false))
            .await
            .unwrap();
        (session, outcome)
    }
}

fn jane_candidate() -> Candidate {
    candidate(
        "jane-doe-12345",
        "Jane Doe - Senior SWE at Acme | LinkedIn",
        "Location: Seattle, WA · 500+ connections",
        None,
    )
}

/// S1: a GitHub profile whose blog field links back to the seed is a Tier-1
/// auto-merge.
#[tokio::test]
async fn s1_blog_bridge_auto_merges() {
    let github = ReplayGithubApi::default()
        .with_search(
            "\"Jane Doe\"",
            vec![GithubUserSummary {
                login: "janedoe".into(),
                html_url: "https://github.com/janedoe".into(),
            }],
        )
        .with_user(GithubUser {
            login: "janedoe".into(),
            html_url: "https://github.com/janedoe".into(),
            name: Some("Jane Doe".into()),
            bio: Some("Distributed systems at Acme".into()),
            blog: Some("https://linkedin.com/in/jane-doe-12345".into()),
            company: Some("Acme".into()),
            location: Some("Seattle, WA".into()),
            followers: 150,
            public_repos: 24,
        });

    let harness = Harness::new(HashMap::new(), github, GateConfig::default());
    let (session, outcome) = harness
        .resolve(jane_candidate(), RoleType::Engineer, EnrichmentBudget::default())
        .await;

    assert_eq!(outcome.persisted.len(), 1);
    let identity = &outcome.persisted[0];
    assert_eq!(identity.platform, Platform::Github);
    assert_eq!(identity.platform_id, "janedoe");
    assert_eq!(identity.bridge_tier, BridgeTier::Tier1);
    assert!(identity
        .bridge_signals
        .contains(&BridgeSignal::LinkedinUrlInBlog));
    assert_eq!(identity.confidence_bucket, ConfidenceBucket::AutoMerge);
    assert!(identity.confidence >= 0.90);
    assert!(identity
        .persist_reason
        .starts_with("Tier-1 bridge, auto-merge eligible"));
    // The Tier-1 find stopped the run before the fan-out.
    assert!(session.early_stop_reason.is_some());
}

/// S2: name-only GitHub matches without corroboration are found but never
/// persisted — the platform guard drops them.
#[tokio::test]
async fn s2_name_only_matches_hit_the_github_guard() {
    let meta = json!({"knowledgeGraph": {"company": "Acme"}});
    let seed = candidate(
        "j-smith-7788",
        "Senior Software Engineer | LinkedIn",
        "",
        Some(meta),
    );

    let mut github = ReplayGithubApi::default().with_search(
        "J Smith",
        (1..=3)
            .map(|i| GithubUserSummary {
                login: format!("jsmith{i}"),
                html_url: format!("https://github.com/jsmith{i}"),
            })
            .collect(),
    );
    for (i, company) in ["Initech", "Globex", "Hooli"].iter().enumerate() {
        github = github.with_user(GithubUser {
            login: format!("jsmith{}", i + 1),
            html_url: format!("https://github.com/jsmith{}", i + 1),
            name: Some("J Smith".into()),
            bio: Some("Writes a lot of software".into()),
            blog: None,
            company: Some((*company).into()),
            location: None,
            followers: 40,
            public_repos: 12,
        });
    }

    let harness = Harness::new(HashMap::new(), github, GateConfig::default());
    let (session, outcome) = harness
        .resolve(seed, RoleType::Engineer, EnrichmentBudget::default())
        .await;

    assert!(outcome.persisted.is_empty());
    assert_eq!(session.early_stop_reason, None);
    let funnel = outcome.trace.totals.funnel;
    assert!(funnel.above_min_confidence >= 1);
    assert_eq!(funnel.passing_persist_guard, 0);
    assert_eq!(funnel.persisted, 0);
}

/// S3: a conference speakers page linking the seed to a GitHub login is a
/// Tier-2 suggestion.
#[tokio::test]
async fn s3_conference_page_is_tier2_suggest() {
    let seed = jane_candidate();
    let hints = bridgescout::hints::extract_hints(&seed);
    let planned = plan_reverse_link_queries(&hints, 5);

    let mut web = HashMap::new();
    web.insert(
        planned[0].text.clone(),
        vec![SearchHit {
            url: "https://github.com/alice".into(),
            title: "DevSummit speakers".into(),
            snippet: "Full speaker lineup. linkedin.com/in/jane-doe-12345".into(),
            position: 1,
        }],
    );

    let github = ReplayGithubApi::default().with_user(GithubUser {
        login: "alice".into(),
        html_url: "https://github.com/alice".into(),
        name: Some("Jane Doe".into()),
        bio: None,
        blog: None,
        company: Some("Acme".into()),
        location: None,
        followers: 5,
        public_repos: 0,
    });

    let harness = Harness::new(web, github, GateConfig::default());
    let (_, outcome) = harness
        .resolve(seed, RoleType::General, EnrichmentBudget::default())
        .await;

    let identity = outcome
        .persisted
        .iter()
        .find(|i| i.platform_id == "alice")
        .expect("alice persisted");
    assert_eq!(identity.bridge_tier, BridgeTier::Tier2);
    let expected: BTreeSet<BridgeSignal> = [
        BridgeSignal::LinkedinUrlInPage,
        BridgeSignal::ConferenceSpeaker,
    ]
    .into_iter()
    .collect();
    assert_eq!(identity.bridge_signals, expected);
    assert_eq!(identity.confidence_bucket, ConfidenceBucket::Suggest);
}

/// S4: an explicit bridge with a contradictory name keeps its tier but
/// loses the boost, and the contradiction is carried as metadata.
#[tokio::test]
async fn s4_contradiction_suppresses_boost() {
    let github = ReplayGithubApi::default()
        .with_search(
            "\"Jane Doe\"",
            vec![GithubUserSummary {
                login: "bobtan".into(),
                html_url: "https://github.com/bobtan".into(),
            }],
        )
        .with_user(GithubUser {
            login: "bobtan".into(),
            html_url: "https://github.com/bobtan".into(),
            name: Some("Bob Tan".into()),
            bio: None,
            blog: Some("https://linkedin.com/in/jane-doe-12345".into()),
            company: None,
            location: None,
            followers: 3,
            public_repos: 1,
        });

    let harness = Harness::new(HashMap::new(), github, GateConfig::default());
    let (_, outcome) = harness
        .resolve(jane_candidate(), RoleType::General, EnrichmentBudget::default())
        .await;

    assert_eq!(outcome.persisted.len(), 1);
    let identity = &outcome.persisted[0];
    assert_eq!(identity.bridge_tier, BridgeTier::Tier1);
    assert!(identity.has_contradiction);
    let note = identity.contradiction_note.as_deref().unwrap();
    assert!(note.contains("Jane Doe") && note.contains("Bob Tan"));
    // Bridge 0.40 + completeness only; no boost applied.
    assert!(identity.confidence < 0.85);
    assert_ne!(identity.confidence_bucket, ConfidenceBucket::AutoMerge);
}

/// S5: the global Tier-2 cap admits three and drops the fourth.
#[tokio::test]
async fn s5_tier2_cap_drops_the_fourth() {
    let seed = jane_candidate();
    let hints = bridgescout::hints::extract_hints(&seed);
    let planned = plan_reverse_link_queries(&hints, 5);

    let mut web = HashMap::new();
    web.insert(
        planned[0].text.clone(),
        (1..=4)
            .map(|i| SearchHit {
                url: format!("https://corp{i}.example.com/team"),
                title: format!("Corp{i} team"),
                snippet: "Our people. linkedin.com/in/jane-doe-12345".into(),
                position: i,
            })
            .collect(),
    );

    let harness = Harness::new(web, ReplayGithubApi::default(), GateConfig::default());
    let (_, outcome) = harness
        .resolve(seed, RoleType::General, EnrichmentBudget::default())
        .await;

    let team_pages: Vec<_> = outcome
        .persisted
        .iter()
        .filter(|i| i.platform == Platform::CompanyTeam)
        .collect();
    assert_eq!(team_pages.len(), 3);

    let funnel = outcome.trace.totals.funnel;
    assert_eq!(funnel.identities_found_total, 4);
    assert_eq!(funnel.above_min_confidence, 4);
    assert_eq!(funnel.passing_persist_guard, 3);
    assert_eq!(funnel.persisted, 3);
}

/// S6: a four-query budget is exhausted by the reverse-link pass.
#[tokio::test]
async fn s6_budget_exhaustion_is_reported() {
    let harness = Harness::new(
        HashMap::new(),
        ReplayGithubApi::default(),
        GateConfig::default(),
    );
    let budget = EnrichmentBudget::default().with_max_queries(4);
    let (session, outcome) = harness
        .resolve(jane_candidate(), RoleType::Engineer, budget)
        .await;

    assert!(outcome.persisted.is_empty());
    assert_eq!(session.executed_queries, 4);
    assert_eq!(
        session.early_stop_reason,
        Some(bridgescout::model::EarlyStopReason::BudgetExhausted)
    );
}

/// Property 5: re-running the same resolution produces the same rows.
#[tokio::test]
async fn rerun_is_idempotent() {
    let github = || {
        ReplayGithubApi::default()
            .with_search(
                "\"Jane Doe\"",
                vec![GithubUserSummary {
                    login: "janedoe".into(),
                    html_url: "https://github.com/janedoe".into(),
                }],
            )
            .with_user(GithubUser {
                login: "janedoe".into(),
                html_url: "https://github.com/janedoe".into(),
                name: Some("Jane Doe".into()),
                bio: None,
                blog: Some("https://linkedin.com/in/jane-doe-12345".into()),
                company: Some("Acme".into()),
                location: Some("Seattle, WA".into()),
                followers: 150,
                public_repos: 24,
            })
    };

    let harness = Harness::new(HashMap::new(), github(), GateConfig::default());
    let (_, first) = harness
        .resolve(jane_candidate(), RoleType::Engineer, EnrichmentBudget::default())
        .await;

    // Second run against the same store and fixtures.
    let mut session = EnrichmentSession::queued(
        "ses_test_2",
        "t1",
        "c1",
        JobType::Enrich,
        RoleType::Engineer,
        EnrichmentBudget::default(),
        Utc::now(),
    );
    let second = harness
        .pipeline
        .resolve(&mut session, &AtomicBool::new(false))
        .await
        .unwrap();

    assert_eq!(harness.store.identity_count(), 1);
    assert_eq!(first.persisted.len(), second.persisted.len());
    assert_eq!(
        first.persisted[0].unique_key(),
        second.persisted[0].unique_key()
    );
    assert_eq!(first.persisted[0].confidence, second.persisted[0].confidence);
}

/// Property 4: budgets bound executed queries and platforms in every run.
#[tokio::test]
async fn budgets_are_respected() {
    let harness = Harness::new(
        HashMap::new(),
        ReplayGithubApi::default(),
        GateConfig::default(),
    );
    for max_queries in [1, 4, 10, 30] {
        let budget = EnrichmentBudget::default()
            .with_max_queries(max_queries)
            .with_max_platforms(4);
        let seed = jane_candidate();
        harness.store.put_candidate(&seed).await.unwrap();
        let mut session = EnrichmentSession::queued(
            format!("ses_budget_{max_queries}"),
            "t1",
            "c1",
            JobType::Enrich,
            RoleType::Engineer,
            budget,
            Utc::now(),
        );
        harness
            .pipeline
            .resolve(&mut session, &AtomicBool::new(false))
            .await
            .unwrap();

        assert!(session.executed_queries <= max_queries);
        assert!(session.executed_sources.len() <= 4);
        let planned: BTreeSet<_> = session
            .planned_sources
            .iter()
            .chain([Platform::Github].iter())
            .collect();
        assert!(session.executed_sources.iter().all(|p| planned.contains(p)));
    }
}

/// Property 6: funnel counts narrow monotonically in every trace.
#[tokio::test]
async fn funnel_is_consistent_across_scenarios() {
    let harness = Harness::new(
        HashMap::new(),
        ReplayGithubApi::default(),
        GateConfig::default(),
    );
    let (_, outcome) = harness
        .resolve(jane_candidate(), RoleType::General, EnrichmentBudget::default())
        .await;
    assert!(outcome.trace.totals.funnel.is_consistent());
}
