//! Golden dataset structures and the built-in cases.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use bridgescout::model::{Candidate, ConfidenceBucket, EnrichmentStatus, RoleType};
use bridgescout::search::{ReplayFixtures, SearchHit};
use bridgescout::sources::{GithubUser, GithubUserSummary, ReplayGithubApi};

/// Replay fixtures for one case: web search plus the GitHub API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayBundle {
    /// Web-search fixtures, keyed by exact query.
    #[serde(default)]
    pub web: ReplayFixtures,
    /// GitHub API fixtures.
    #[serde(default)]
    pub github: ReplayGithubApi,
}

impl ReplayBundle {
    /// Parse a bundle from JSON (the on-disk fixture format).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What a case is expected to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseExpectation {
    /// Exact persisted-identity count.
    pub persisted: u32,
    /// Whether a Tier-1 identity must be among them.
    pub tier1: bool,
    /// Whether the top identity must be auto-merge bucketed.
    pub auto_merge: bool,
}

/// One golden case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub candidate: Candidate,
    pub role_type: RoleType,
    pub fixtures: ReplayBundle,
    pub expect: CaseExpectation,
}

/// A whole dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenDataset {
    pub cases: Vec<GoldenCase>,
}

impl GoldenDataset {
    /// Parse a dataset from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn candidate(slug: &str, title: &str, snippet: &str) -> Candidate {
    Candidate {
        tenant_id: "eval".into(),
        id: format!("cand_{slug}"),
        linkedin_slug: slug.into(),
        linkedin_url: format!("https://www.linkedin.com/in/{slug}"),
        serp_title: title.into(),
        serp_snippet: snippet.into(),
        serp_metadata: None,
        role_type: None,
        enrichment_status: EnrichmentStatus::None,
        last_enriched_at: None,
    }
}

/// The built-in dataset: a Tier-1 blog bridge, a name-only negative, and a
/// reverse-link team-page case. Small on purpose; real deployments append
/// labeled production cases to it.
#[must_use]
pub fn builtin_dataset() -> GoldenDataset {
    let mut cases = Vec::new();

    // Positive: blog field links back, expect auto-merge.
    {
        let mut github = ReplayGithubApi::default();
        github = github
            .with_search(
                "\"Maya Lindqvist\"",
                vec![GithubUserSummary {
                    login: "mayalindqvist".into(),
                    html_url: "https://github.com/mayalindqvist".into(),
                }],
            )
            .with_user(GithubUser {
                login: "mayalindqvist".into(),
                html_url: "https://github.com/mayalindqvist".into(),
                name: Some("Maya Lindqvist".into()),
                bio: Some("Compilers and coffee at Initech".into()),
                blog: Some("https://linkedin.com/in/maya-lindqvist-7a3f21".into()),
                company: Some("Initech".into()),
                location: Some("Stockholm, Sweden".into()),
                followers: 80,
                public_repos: 15,
            });
        cases.push(GoldenCase {
            name: "tier1-blog-bridge".into(),
            candidate: candidate(
                "maya-lindqvist-7a3f21",
                "Maya Lindqvist - Compiler Engineer at Initech | LinkedIn",
                "Location: Stockholm, Sweden · 500+ connections",
            ),
            role_type: RoleType::Engineer,
            fixtures: ReplayBundle {
                web: ReplayFixtures::default(),
                github,
            },
            expect: CaseExpectation {
                persisted: 1,
                tier1: true,
                auto_merge: true,
            },
        });
    }

    // Negative: common-name search hits with nothing linking back.
    {
        let mut github = ReplayGithubApi::default().with_search(
            "\"Alex Chen\"",
            (1..=2)
                .map(|i| GithubUserSummary {
                    login: format!("alexchen{i}"),
                    html_url: format!("https://github.com/alexchen{i}"),
                })
                .collect(),
        );
        for i in 1..=2 {
            github = github.with_user(GithubUser {
                login: format!("alexchen{i}"),
                html_url: format!("https://github.com/alexchen{i}"),
                name: Some("Alex Chen".into()),
                bio: Some("Building things on the internet".into()),
                blog: None,
                company: Some(["Globex", "Umbrella"][i - 1].into()),
                location: None,
                followers: 30,
                public_repos: 9,
            });
        }
        cases.push(GoldenCase {
            name: "name-only-negative".into(),
            candidate: candidate(
                "alex-chen-99aa0b",
                "Alex Chen - Product Engineer | LinkedIn",
                "",
            ),
            role_type: RoleType::Engineer,
            fixtures: ReplayBundle {
                web: ReplayFixtures::default(),
                github,
            },
            expect: CaseExpectation {
                persisted: 0,
                tier1: false,
                auto_merge: false,
            },
        });
    }

    // Reverse-link: a company team page mentions the profile.
    {
        let mut web_queries = HashMap::new();
        web_queries.insert(
            "\"https://www.linkedin.com/in/priya-raman-4412cc\"".to_string(),
            vec![SearchHit {
                url: "https://hooli.example.com/team".into(),
                title: "Hooli — Our team".into(),
                snippet: "Priya Raman, Staff Engineer. linkedin.com/in/priya-raman-4412cc"
                    .into(),
                position: 1,
            }],
        );
        cases.push(GoldenCase {
            name: "team-page-reverse-link".into(),
            candidate: candidate(
                "priya-raman-4412cc",
                "Priya Raman - Staff Engineer at Hooli | LinkedIn",
                "",
            ),
            role_type: RoleType::Engineer,
            fixtures: ReplayBundle {
                web: ReplayFixtures {
                    queries: web_queries,
                },
                github: ReplayGithubApi::default(),
            },
            expect: CaseExpectation {
                persisted: 1,
                tier1: false,
                auto_merge: false,
            },
        });
    }

    GoldenDataset { cases }
}
