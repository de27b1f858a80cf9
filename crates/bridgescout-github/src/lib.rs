//! # GitHub REST client
//!
//! The native-API side of GitHub discovery: user search, profile fetch,
//! and opt-in commit-evidence gathering. Implements
//! [`bridgescout::sources::GithubApi`], so the worker can swap it for the
//! replay fixture API without the pipeline noticing.
//!
//! Commit evidence is privacy-preserving by construction: author emails are
//! examined in memory to count company-domain matches, and only the match
//! count and commit URLs ever leave this crate.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tracing::debug;

use bridgescout::score::normalize;
use bridgescout::search::{Quota, SearchError};
use bridgescout::sources::{CommitEvidence, GithubApi, GithubUser, GithubUserSummary};

/// Public GitHub API root.
const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "bridgescout";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Commits examined per repository when gathering evidence.
const COMMITS_PER_REPO: usize = 10;

/// GitHub REST [`GithubApi`] implementation.
pub struct GithubClient {
    token: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SearchUsersResponse {
    #[serde(default)]
    items: Vec<SearchUserItem>,
}

#[derive(Debug, Deserialize)]
struct SearchUserItem {
    login: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    html_url: String,
    name: Option<String>,
    bio: Option<String>,
    blog: Option<String>,
    company: Option<String>,
    location: Option<String>,
    #[serde(default)]
    followers: u32,
    #[serde(default)]
    public_repos: u32,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    #[serde(default)]
    fork: bool,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    html_url: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    email: Option<String>,
}

fn quota_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Quota> {
    let remaining: u32 = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())?;
    let reset_epoch: u64 = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())?;
    Some(Quota {
        remaining,
        resets_at: SystemTime::UNIX_EPOCH + Duration::from_secs(reset_epoch),
    })
}

impl GithubClient {
    /// Anonymous client (60 requests/hour).
    pub fn new() -> Result<Self, SearchError> {
        Self::build(None, GITHUB_API.to_string())
    }

    /// Token-authenticated client.
    pub fn with_token(token: impl Into<String>) -> Result<Self, SearchError> {
        Self::build(Some(token.into()), GITHUB_API.to_string())
    }

    /// Client against a custom API root (tests point this at a mock server).
    pub fn with_base_url(
        token: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SearchError> {
        Self::build(token, base_url.into())
    }

    fn build(token: Option<String>, base_url: String) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SearchError::Fatal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get(&self, path_and_query: &str) -> Result<reqwest::Response, SearchError> {
        let mut request = self
            .client
            .get(format!("{}{path_and_query}", self.base_url))
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Network(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let quota = quota_from_headers(response.headers());
        Err(match status {
            reqwest::StatusCode::NOT_FOUND => SearchError::NotFound,
            reqwest::StatusCode::UNAUTHORIZED => {
                SearchError::Auth("GitHub rejected the token".to_string())
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS | reqwest::StatusCode::FORBIDDEN => {
                // 403 on GitHub is rate limiting when the quota is spent,
                // otherwise a scope problem.
                if quota.is_some_and(|q| q.remaining == 0)
                    || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs);
                    SearchError::RateLimited { retry_after, quota }
                } else {
                    SearchError::Auth(format!("GitHub returned {status}"))
                }
            }
            s if s.is_server_error() => SearchError::Transient(format!("GitHub returned {s}")),
            s => SearchError::Fatal(format!("GitHub returned {s}")),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, SearchError> {
        let response = self.get(path_and_query).await?;
        response
            .json()
            .await
            .map_err(|e| SearchError::Fatal(format!("failed to parse GitHub response: {e}")))
    }
}

/// True when a commit author email ties to the company: its domain's
/// registrable label appears in the normalized company name (or vice versa).
fn email_matches_company(email: &str, company_norm: &str) -> bool {
    let Some(domain) = email.rsplit('@').next() else {
        return false;
    };
    if domain.ends_with("users.noreply.github.com") {
        return false;
    }
    let label = domain.split('.').next().unwrap_or_default();
    label.len() >= 3 && company_norm.split_whitespace().any(|t| t == label)
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn search_users(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GithubUserSummary>, SearchError> {
        let encoded = urlencode(query);
        let per_page = limit.clamp(1, 30);
        let response: SearchUsersResponse = self
            .get_json(&format!("/search/users?q={encoded}&per_page={per_page}"))
            .await?;
        Ok(response
            .items
            .into_iter()
            .map(|item| GithubUserSummary {
                login: item.login,
                html_url: item.html_url,
            })
            .collect())
    }

    async fn get_user(&self, login: &str) -> Result<Option<GithubUser>, SearchError> {
        match self.get_json::<UserResponse>(&format!("/users/{login}")).await {
            Ok(user) => Ok(Some(GithubUser {
                login: user.login,
                html_url: user.html_url,
                name: user.name,
                bio: user.bio,
                blog: user.blog.filter(|b| !b.trim().is_empty()),
                company: user.company,
                location: user.location,
                followers: user.followers,
                public_repos: user.public_repos,
            })),
            Err(SearchError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn commit_evidence(
        &self,
        login: &str,
        company: &str,
        max_repos: u32,
    ) -> Result<CommitEvidence, SearchError> {
        let company_norm = normalize(company);
        if company_norm.is_empty() {
            return Ok(CommitEvidence::default());
        }

        let repos: Vec<RepoResponse> = self
            .get_json(&format!(
                "/users/{login}/repos?sort=pushed&per_page={}",
                (max_repos * 2).clamp(1, 30)
            ))
            .await?;

        let mut evidence = CommitEvidence::default();
        for repo in repos.into_iter().filter(|r| !r.fork).take(max_repos as usize) {
            let commits: Vec<CommitResponse> = match self
                .get_json(&format!(
                    "/repos/{login}/{}/commits?author={login}&per_page={COMMITS_PER_REPO}",
                    repo.name
                ))
                .await
            {
                Ok(commits) => commits,
                Err(SearchError::NotFound) => continue,
                Err(e) => {
                    debug!(login, repo = %repo.name, error = %e,
                        "commit listing failed, skipping repo");
                    continue;
                }
            };

            for commit in commits {
                let matched = commit
                    .commit
                    .author
                    .as_ref()
                    .and_then(|a| a.email.as_deref())
                    .is_some_and(|email| email_matches_company(email, &company_norm));
                if matched {
                    evidence.domain_matches += 1;
                    // Pointer only; the email itself stays in this scope.
                    evidence.commit_urls.push(commit.html_url);
                }
            }
        }
        Ok(evidence)
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_matching_respects_noreply_and_length() {
        assert!(email_matches_company("jane@acme.com", "acme"));
        assert!(email_matches_company("jane@acme.io", "acme inc"));
        assert!(!email_matches_company("jane@gmail.com", "acme"));
        assert!(!email_matches_company(
            "12345+jane@users.noreply.github.com",
            "acme"
        ));
        // Two-letter labels are too ambiguous to count.
        assert!(!email_matches_company("jane@io.dev", "io systems"));
    }

    #[test]
    fn urlencode_handles_quotes_and_spaces() {
        assert_eq!(urlencode("\"Jane Doe\""), "%22Jane%20Doe%22");
    }
}
