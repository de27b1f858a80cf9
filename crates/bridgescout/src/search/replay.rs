//! Replay transport: deterministic fixture-backed search for offline
//! evaluation and the end-to-end scenario tests.
//!
//! Instead of monkey-patching a live client, the harness wires a
//! [`ReplayTransport`] into the executor exactly where a real provider
//! would sit. Fixtures are keyed by exact query string; every issued query
//! is recorded so evaluation runs can assert on the query plan itself.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SearchError, SearchHit, SearchPage, SearchProvider};

/// A fixture file: query string → result rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayFixtures {
    /// Results returned for exactly-matching query strings.
    #[serde(default)]
    pub queries: HashMap<String, Vec<SearchHit>>,
}

/// Fixture-backed [`SearchProvider`].
pub struct ReplayTransport {
    name: String,
    fixtures: ReplayFixtures,
    issued: Mutex<Vec<String>>,
}

impl ReplayTransport {
    /// Build a transport over fixtures. `name` stands in for the provider
    /// this transport replaces (shows up in traces as-is).
    pub fn new(name: impl Into<String>, fixtures: ReplayFixtures) -> Self {
        Self {
            name: name.into(),
            fixtures,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Parse fixtures from JSON.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::from_str(json)?))
    }

    /// Queries issued so far, in order.
    #[must_use]
    pub fn issued_queries(&self) -> Vec<String> {
        self.issued.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for ReplayTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, limit: usize) -> Result<SearchPage, SearchError> {
        self.issued.lock().push(query.to_string());
        let hits = self
            .fixtures
            .queries
            .get(query)
            .cloned()
            .unwrap_or_default();
        Ok(SearchPage::from_hits(hits.into_iter().take(limit).collect()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> ReplayFixtures {
        let mut queries = HashMap::new();
        queries.insert(
            "\"jane doe\"".to_string(),
            vec![SearchHit {
                url: "https://github.com/janedoe".to_string(),
                title: "janedoe (Jane Doe) · GitHub".to_string(),
                snippet: "Jane Doe has 12 repositories available.".to_string(),
                position: 1,
            }],
        );
        ReplayFixtures { queries }
    }

    #[tokio::test]
    async fn returns_fixture_hits_and_records_queries() {
        let transport = ReplayTransport::new("replay", fixture());
        let page = transport.search("\"jane doe\"", 10).await.unwrap();
        assert_eq!(page.hits.len(), 1);

        let page = transport.search("unknown query", 10).await.unwrap();
        assert!(page.hits.is_empty());

        assert_eq!(
            transport.issued_queries(),
            vec!["\"jane doe\"", "unknown query"]
        );
    }

    #[tokio::test]
    async fn respects_limit() {
        let mut queries = HashMap::new();
        queries.insert(
            "q".to_string(),
            (1..=5)
                .map(|i| SearchHit {
                    url: format!("https://example.com/{i}"),
                    title: String::new(),
                    snippet: String::new(),
                    position: i,
                })
                .collect(),
        );
        let transport = ReplayTransport::new("replay", ReplayFixtures { queries });
        let page = transport.search("q", 2).await.unwrap();
        assert_eq!(page.hits.len(), 2);
    }

    #[test]
    fn fixtures_parse_from_json() {
        let json = r#"{"queries": {"\"jane doe\"": [
            {"url": "https://github.com/janedoe", "title": "t", "snippet": "s", "position": 1}
        ]}}"#;
        let transport = ReplayTransport::from_json("replay", json).unwrap();
        assert_eq!(transport.fixtures.queries.len(), 1);
    }
}
