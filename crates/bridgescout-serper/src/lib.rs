//! # Serper provider
//!
//! Google search results through the Serper.dev API, exposed as a
//! [`SearchProvider`] for the BridgeScout search executor. Fast, cheap, and
//! rich enough to carry the reverse-link pass.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bridgescout_serper::SerperProvider;
//! use bridgescout::search::SearchProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let serper = SerperProvider::builder()
//!     .api_key("YOUR_API_KEY")
//!     .location("us")
//!     .build()?;
//! let page = serper.search("\"jane doe\" site:github.com", 10).await?;
//! println!("{} hits", page.hits.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use bridgescout::search::{Quota, SearchError, SearchHit, SearchPage, SearchProvider};

/// Serper search endpoint.
const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
/// Response bodies past this size are refused rather than parsed.
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

/// A single organic search result from Serper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerperOrganic {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    pub position: u32,
}

/// Request body for the search endpoint.
#[derive(Debug, Clone, Serialize)]
struct SerperSearchParams<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<&'a str>,
}

/// Response from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SerperSearchResponse {
    #[serde(default)]
    pub organic: Vec<SerperOrganic>,
}

/// Serper.dev [`SearchProvider`].
pub struct SerperProvider {
    api_key: String,
    location: Option<String>,
    language: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

// Custom Debug to keep the API key out of logs.
impl std::fmt::Debug for SerperProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperProvider")
            .field("api_key", &"[REDACTED]")
            .field("location", &self.location)
            .field("language", &self.language)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SerperProvider {
    /// Create a provider with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Ok(Self {
            api_key: api_key.into(),
            location: None,
            language: None,
            endpoint: SERPER_ENDPOINT.to_string(),
            client: create_http_client()?,
        })
    }

    /// Builder with optional settings.
    #[must_use]
    pub fn builder() -> SerperProviderBuilder {
        SerperProviderBuilder::default()
    }

    async fn request(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<(SerperSearchResponse, Option<Quota>), SearchError> {
        let params = SerperSearchParams {
            q: query,
            num: Some(limit.clamp(1, 100) as u32),
            gl: self.location.as_deref(),
            hl: self.language.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network(format!("Serper request failed: {e}")))?;

        let quota = quota_from_headers(response.headers());
        let status = response.status();
        if !status.is_success() {
            return Err(map_http_error(status, response.headers(), quota));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Network(format!("Serper body read failed: {e}")))?;
        if body.len() > RESPONSE_SIZE_LIMIT {
            return Err(SearchError::Fatal(format!(
                "Serper response exceeds size limit ({} bytes)",
                body.len()
            )));
        }
        let parsed: SerperSearchResponse = serde_json::from_slice(&body)
            .map_err(|e| SearchError::Fatal(format!("failed to parse Serper response: {e}")))?;
        Ok((parsed, quota))
    }
}

/// Parse `X-RateLimit-Remaining` / `X-RateLimit-Reset` style headers.
fn quota_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Quota> {
    let remaining: u32 = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())?;
    let reset_secs: u64 = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())?;
    // Reset is either an epoch timestamp or a relative delay.
    let resets_at = if reset_secs > 1_000_000_000 {
        SystemTime::UNIX_EPOCH + Duration::from_secs(reset_secs)
    } else {
        SystemTime::now() + Duration::from_secs(reset_secs)
    };
    Some(Quota {
        remaining,
        resets_at,
    })
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn map_http_error(
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
    quota: Option<Quota>,
) -> SearchError {
    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS | reqwest::StatusCode::FORBIDDEN => {
            SearchError::RateLimited {
                retry_after: retry_after(headers),
                quota,
            }
        }
        reqwest::StatusCode::UNAUTHORIZED => {
            SearchError::Auth("Serper rejected the API key".to_string())
        }
        reqwest::StatusCode::NOT_FOUND => SearchError::NotFound,
        s if s.is_server_error() => SearchError::Transient(format!("Serper returned {s}")),
        s => SearchError::Fatal(format!("Serper returned {s}")),
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchPage, SearchError> {
        let (response, quota) = self.request(query, limit).await?;
        let hits = response
            .organic
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                url: r.link,
                title: r.title,
                snippet: r.snippet,
                position: r.position,
            })
            .collect();
        Ok(SearchPage { hits, quota })
    }
}

/// Builder for [`SerperProvider`].
#[derive(Default)]
pub struct SerperProviderBuilder {
    api_key: Option<String>,
    location: Option<String>,
    language: Option<String>,
    endpoint: Option<String>,
}

impl SerperProviderBuilder {
    /// Set the API key (required).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the geographic location code (e.g. "us").
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the language code (e.g. "en").
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Override the endpoint (tests point this at a mock server).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Build the provider.
    pub fn build(self) -> Result<SerperProvider, SearchError> {
        let api_key = self
            .api_key
            .ok_or_else(|| SearchError::Auth("Serper API key is required".to_string()))?;
        Ok(SerperProvider {
            api_key,
            location: self.location,
            language: self.language,
            endpoint: self.endpoint.unwrap_or_else(|| SERPER_ENDPOINT.to_string()),
            client: create_http_client()?,
        })
    }
}
