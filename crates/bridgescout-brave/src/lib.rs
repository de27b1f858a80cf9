//! # Brave Search provider
//!
//! Brave's independent-index search API as a [`SearchProvider`]. Used as
//! the fallback web provider behind Serper; the free tier is aggressively
//! rate limited, which makes Brave the main exerciser of the executor's
//! quota fail-fast path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use bridgescout::search::{Quota, SearchError, SearchHit, SearchPage, SearchProvider};

/// Brave web-search endpoint.
const BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const RESPONSE_SIZE_LIMIT: usize = 2 * 1024 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn create_http_client() -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| SearchError::Fatal(format!("failed to build HTTP client: {e}")))
}

/// A single web result from Brave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveWebResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Web results container.
#[derive(Debug, Clone, Deserialize)]
pub struct BraveWebResults {
    #[serde(default)]
    pub results: Vec<BraveWebResult>,
}

/// Response from the web-search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BraveSearchResponse {
    #[serde(default)]
    pub web: Option<BraveWebResults>,
}

/// Brave Search [`SearchProvider`].
pub struct BraveProvider {
    api_key: String,
    country: String,
    search_lang: String,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BraveProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveProvider")
            .field("api_key", &"[REDACTED]")
            .field("country", &self.country)
            .field("search_lang", &self.search_lang)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl BraveProvider {
    /// Create a provider with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Ok(Self {
            api_key: api_key.into(),
            country: "US".to_string(),
            search_lang: "en".to_string(),
            endpoint: BRAVE_ENDPOINT.to_string(),
            client: create_http_client()?,
        })
    }

    /// Builder with optional settings.
    #[must_use]
    pub fn builder() -> BraveProviderBuilder {
        BraveProviderBuilder::default()
    }
}

fn quota_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Quota> {
    // Brave sends "X-RateLimit-Remaining: 0, 1998" (per-second, per-month);
    // the first value is the interesting one either way.
    let remaining: u32 = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())?;
    let reset_secs: u64 = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())?;
    Some(Quota {
        remaining,
        resets_at: SystemTime::now() + Duration::from_secs(reset_secs),
    })
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl SearchProvider for BraveProvider {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchPage, SearchError> {
        let url = format!(
            "{}?q={}&count={}&country={}&search_lang={}",
            self.endpoint,
            urlencoding::encode(query),
            limit.clamp(1, 20),
            self.country,
            self.search_lang,
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| SearchError::Network(format!("Brave request failed: {e}")))?;

        let quota = quota_from_headers(response.headers());
        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                reqwest::StatusCode::TOO_MANY_REQUESTS | reqwest::StatusCode::FORBIDDEN => {
                    SearchError::RateLimited {
                        retry_after: retry_after(response.headers()),
                        quota,
                    }
                }
                reqwest::StatusCode::UNAUTHORIZED => {
                    SearchError::Auth("Brave rejected the subscription token".to_string())
                }
                reqwest::StatusCode::NOT_FOUND => SearchError::NotFound,
                s if s.is_server_error() => SearchError::Transient(format!("Brave returned {s}")),
                s => SearchError::Fatal(format!("Brave returned {s}")),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Network(format!("Brave body read failed: {e}")))?;
        if body.len() > RESPONSE_SIZE_LIMIT {
            return Err(SearchError::Fatal(format!(
                "Brave response exceeds size limit ({} bytes)",
                body.len()
            )));
        }
        let parsed: BraveSearchResponse = serde_json::from_slice(&body)
            .map_err(|e| SearchError::Fatal(format!("failed to parse Brave response: {e}")))?;

        let hits = parsed
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, r)| SearchHit {
                url: r.url,
                title: r.title,
                snippet: r.description,
                position: (i + 1) as u32,
            })
            .collect();
        Ok(SearchPage { hits, quota })
    }
}

/// Builder for [`BraveProvider`].
#[derive(Default)]
pub struct BraveProviderBuilder {
    api_key: Option<String>,
    country: Option<String>,
    search_lang: Option<String>,
    endpoint: Option<String>,
}

impl BraveProviderBuilder {
    /// Set the subscription token (required).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the country code (default "US").
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Set the search language (default "en").
    pub fn search_lang(mut self, lang: impl Into<String>) -> Self {
        self.search_lang = Some(lang.into());
        self
    }

    /// Override the endpoint (tests point this at a mock server).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Build the provider.
    pub fn build(self) -> Result<BraveProvider, SearchError> {
        let api_key = self
            .api_key
            .ok_or_else(|| SearchError::Auth("Brave subscription token is required".to_string()))?;
        Ok(BraveProvider {
            api_key,
            country: self.country.unwrap_or_else(|| "US".to_string()),
            search_lang: self.search_lang.unwrap_or_else(|| "en".to_string()),
            endpoint: self.endpoint.unwrap_or_else(|| BRAVE_ENDPOINT.to_string()),
            client: create_http_client()?,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_token() {
        assert!(matches!(
            BraveProvider::builder().build(),
            Err(SearchError::Auth(_))
        ));
    }

    #[test]
    fn response_parses_web_results() {
        let json = r#"{"web": {"results": [
            {"title": "Jane Doe", "url": "https://github.com/janedoe", "description": "profile"}
        ]}}"#;
        let parsed: BraveSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.web.unwrap().results.len(), 1);
    }

    #[test]
    fn comma_separated_rate_headers_parse() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-ratelimit-remaining", "3, 1998".parse().unwrap());
        headers.insert("x-ratelimit-reset", "600, 86400".parse().unwrap());
        let quota = quota_from_headers(&headers).unwrap();
        assert_eq!(quota.remaining, 3);
    }
}
