//! GitHub-specific discovery.
//!
//! GitHub is the one platform with a native API integration: user search,
//! profile fetch, and optional commit-evidence gathering. The API itself is
//! behind the [`GithubApi`] trait so the worker can wire the real client
//! (the `bridgescout-github` crate) and the evaluation harness a
//! fixture-backed [`ReplayGithubApi`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::linkscan::scan_profile_for_bridge;
use super::{SourceBudget, SourceOutcome};
use crate::model::{
    BridgeSignal, EnrichedHints, Evidence, EvidenceType, IdentityOrigin, Platform,
};
use crate::plan::plan_github_queries;
use crate::score::ProfileObservation;
use crate::search::SearchError;

/// A row from GitHub user search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUserSummary {
    pub login: String,
    pub html_url: String,
}

/// A fetched GitHub user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub public_repos: u32,
}

/// Commit-evidence result: a match count and commit URL pointers. Never
/// carries addresses — matching happens inside the API client and only the
/// counts and pointers leave it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvidence {
    /// Commits whose author metadata tied to the hinted company domain.
    pub domain_matches: u32,
    /// Commit URLs usable as evidence pointers.
    pub commit_urls: Vec<String>,
}

/// The GitHub API seam.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Search users by free-text query.
    async fn search_users(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GithubUserSummary>, SearchError>;

    /// Fetch one user profile; `Ok(None)` when the login does not exist.
    async fn get_user(&self, login: &str) -> Result<Option<GithubUser>, SearchError>;

    /// Gather commit evidence for a login against a company name, looking
    /// at up to `max_repos` recent non-fork repositories.
    async fn commit_evidence(
        &self,
        login: &str,
        company: &str,
        max_repos: u32,
    ) -> Result<CommitEvidence, SearchError>;
}

/// Settings for the GitHub direct phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GithubDiscoveryConfig {
    /// Operator opt-in for commit-evidence gathering.
    pub commit_evidence_enabled: bool,
    /// Recent non-fork repos inspected per login.
    pub commit_evidence_max_repos: u32,
}

impl Default for GithubDiscoveryConfig {
    fn default() -> Self {
        Self {
            commit_evidence_enabled: false,
            commit_evidence_max_repos: 3,
        }
    }
}

/// Run the GitHub direct fan-out: profile-fetch every login discovered by
/// the reverse-link pass plus every login returned from name-based user
/// search, scan bios/blogs for bridge links, and optionally gather commit
/// evidence.
pub async fn discover_github(
    api: &Arc<dyn GithubApi>,
    hints: &EnrichedHints,
    reverse_logins: &[(String, BTreeSet<BridgeSignal>, Option<String>)],
    budget: SourceBudget,
    config: GithubDiscoveryConfig,
) -> SourceOutcome {
    let mut outcome = SourceOutcome {
        provider: Some("github-api".to_string()),
        ..SourceOutcome::default()
    };

    // Logins to fetch, keeping reverse-link provenance.
    let mut pending: Vec<(String, IdentityOrigin, BTreeSet<BridgeSignal>, Option<String>)> =
        Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (login, signals, bridge_url) in reverse_logins {
        let login = login.to_lowercase();
        if seen.contains_key(&login) {
            continue;
        }
        seen.insert(login.clone(), pending.len());
        pending.push((
            login,
            IdentityOrigin::ReverseLink,
            signals.clone(),
            bridge_url.clone(),
        ));
    }

    // Name-based native user search.
    let queries = plan_github_queries(hints, budget.max_queries as usize);
    for query in &queries {
        if pending.len() >= (budget.max_results as usize) * 2 {
            break;
        }
        outcome.record_query(&query.text, &query.variant_id);
        match api.search_users(&query.text, budget.max_results as usize).await {
            Ok(rows) => {
                outcome.raw_results += rows.len() as u32;
                for row in rows {
                    let login = row.login.to_lowercase();
                    if seen.contains_key(&login) {
                        continue;
                    }
                    outcome.matched_results += 1;
                    seen.insert(login.clone(), pending.len());
                    pending.push((login, IdentityOrigin::PlatformSearch, BTreeSet::new(), None));
                }
            }
            Err(err) => {
                if matches!(err, SearchError::RateLimited { .. }) {
                    outcome.rate_limited = true;
                }
                debug!(query = %query.text, error = %err, "github user search failed");
                outcome.error = Some(err.to_string());
                if !err.is_retryable() {
                    break;
                }
            }
        }
    }

    // Profile fetch per login, bounded by the result budget.
    for (login, origin, signals, bridge_url) in
        pending.into_iter().take(budget.max_results as usize)
    {
        let user = match api.get_user(&login).await {
            Ok(Some(user)) => user,
            Ok(None) => continue,
            Err(err) => {
                if matches!(err, SearchError::RateLimited { .. }) {
                    outcome.rate_limited = true;
                }
                debug!(login, error = %err, "github profile fetch failed");
                outcome.error = Some(err.to_string());
                continue;
            }
        };

        let mut observation = ProfileObservation::new(
            Platform::Github,
            user.login.clone(),
            user.html_url.clone(),
            origin,
        );
        observation.display_name = user.name.clone();
        observation.bio = user.bio.clone();
        observation.blog = user.blog.clone();
        observation.company = user.company.clone();
        observation.location = user.location.clone();
        observation.followers = Some(user.followers);
        observation.public_repos = Some(user.public_repos);
        observation.signals = signals;
        if let Some(url) = bridge_url {
            observation
                .evidence
                .push(Evidence::new(url, EvidenceType::PageMention));
        }

        scan_profile_for_bridge(&mut observation, &hints.linkedin_id);

        if config.commit_evidence_enabled {
            if let Some(company) = hints.company.as_str() {
                match api
                    .commit_evidence(&login, company, config.commit_evidence_max_repos)
                    .await
                {
                    Ok(evidence) if evidence.domain_matches > 0 => {
                        observation.commit_email_matches = evidence.domain_matches;
                        observation.signals.insert(BridgeSignal::CommitEmailDomain);
                        for url in evidence.commit_urls {
                            observation
                                .evidence
                                .push(Evidence::new(url, EvidenceType::CommitMetadata));
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!(login, error = %err, "commit evidence gathering failed");
                    }
                }
            }
        }

        outcome.observations.push(observation);
    }

    outcome
}

/// Fixture-backed [`GithubApi`] for replay runs and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayGithubApi {
    /// Query → search rows.
    #[serde(default)]
    pub searches: HashMap<String, Vec<GithubUserSummary>>,
    /// Login → profile.
    #[serde(default)]
    pub users: HashMap<String, GithubUser>,
    /// Login → commit evidence.
    #[serde(default)]
    pub commits: HashMap<String, CommitEvidence>,
}

impl ReplayGithubApi {
    /// Parse fixtures from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Register a user profile fixture.
    #[must_use]
    pub fn with_user(mut self, user: GithubUser) -> Self {
        self.users.insert(user.login.to_lowercase(), user);
        self
    }

    /// Register a search fixture.
    #[must_use]
    pub fn with_search(
        mut self,
        query: impl Into<String>,
        rows: Vec<GithubUserSummary>,
    ) -> Self {
        self.searches.insert(query.into(), rows);
        self
    }
}

#[async_trait]
impl GithubApi for ReplayGithubApi {
    async fn search_users(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GithubUserSummary>, SearchError> {
        Ok(self
            .searches
            .get(query)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn get_user(&self, login: &str) -> Result<Option<GithubUser>, SearchError> {
        Ok(self.users.get(&login.to_lowercase()).cloned())
    }

    async fn commit_evidence(
        &self,
        login: &str,
        _company: &str,
        _max_repos: u32,
    ) -> Result<CommitEvidence, SearchError> {
        Ok(self
            .commits
            .get(&login.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hint, HintSource};

    fn hints() -> EnrichedHints {
        let mut hints = EnrichedHints::empty(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
        );
        hints.name = Hint::present("Jane Doe", 0.95, HintSource::SerpTitle);
        hints
    }

    fn jane() -> GithubUser {
        GithubUser {
            login: "janedoe".to_string(),
            html_url: "https://github.com/janedoe".to_string(),
            name: Some("Jane Doe".to_string()),
            bio: Some("Distributed systems".to_string()),
            blog: Some("https://linkedin.com/in/jane-doe-12345".to_string()),
            company: Some("Acme".to_string()),
            location: Some("Seattle, WA".to_string()),
            followers: 150,
            public_repos: 24,
        }
    }

    #[tokio::test]
    async fn search_hits_get_profile_fetched_and_scanned() {
        let api: Arc<dyn GithubApi> = Arc::new(
            ReplayGithubApi::default()
                .with_user(jane())
                .with_search(
                    "\"Jane Doe\"",
                    vec![GithubUserSummary {
                        login: "janedoe".to_string(),
                        html_url: "https://github.com/janedoe".to_string(),
                    }],
                ),
        );
        let outcome = discover_github(
            &api,
            &hints(),
            &[],
            SourceBudget::default(),
            GithubDiscoveryConfig::default(),
        )
        .await;

        assert_eq!(outcome.observations.len(), 1);
        let obs = &outcome.observations[0];
        assert_eq!(obs.platform_id, "janedoe");
        assert!(obs.signals.contains(&BridgeSignal::LinkedinUrlInBlog));
        assert_eq!(obs.origin, IdentityOrigin::PlatformSearch);
    }

    #[tokio::test]
    async fn reverse_logins_keep_their_signals() {
        let api: Arc<dyn GithubApi> = Arc::new(ReplayGithubApi::default().with_user(GithubUser {
            login: "alice".to_string(),
            html_url: "https://github.com/alice".to_string(),
            ..GithubUser::default()
        }));
        let reverse = vec![(
            "alice".to_string(),
            [BridgeSignal::LinkedinUrlInPage, BridgeSignal::ConferenceSpeaker]
                .into_iter()
                .collect::<BTreeSet<_>>(),
            Some("https://conf.example.com/speakers".to_string()),
        )];
        let outcome = discover_github(
            &api,
            &hints(),
            &reverse,
            SourceBudget::default(),
            GithubDiscoveryConfig::default(),
        )
        .await;

        assert_eq!(outcome.observations.len(), 1);
        let obs = &outcome.observations[0];
        assert_eq!(obs.origin, IdentityOrigin::ReverseLink);
        assert!(obs.signals.contains(&BridgeSignal::LinkedinUrlInPage));
        assert!(obs.signals.contains(&BridgeSignal::ConferenceSpeaker));
        assert_eq!(obs.evidence.len(), 1);
    }

    #[tokio::test]
    async fn commit_evidence_gated_by_flag() {
        let mut hints = hints();
        hints.company = Hint::present("Acme", 0.90, HintSource::HeadlineParse);
        let mut api_fixture = ReplayGithubApi::default().with_user(jane());
        api_fixture.commits.insert(
            "janedoe".to_string(),
            CommitEvidence {
                domain_matches: 2,
                commit_urls: vec!["https://github.com/janedoe/x/commit/abc".to_string()],
            },
        );
        let api: Arc<dyn GithubApi> = Arc::new(api_fixture);
        let reverse = vec![("janedoe".to_string(), BTreeSet::new(), None)];

        let off = discover_github(
            &api,
            &hints,
            &reverse,
            SourceBudget::default(),
            GithubDiscoveryConfig::default(),
        )
        .await;
        assert_eq!(off.observations[0].commit_email_matches, 0);

        let on = discover_github(
            &api,
            &hints,
            &reverse,
            SourceBudget::default(),
            GithubDiscoveryConfig {
                commit_evidence_enabled: true,
                commit_evidence_max_repos: 3,
            },
        )
        .await;
        let obs = &on.observations[0];
        assert_eq!(obs.commit_email_matches, 2);
        assert!(obs.signals.contains(&BridgeSignal::CommitEmailDomain));
    }
}
