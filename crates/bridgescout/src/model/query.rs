//! Planned search queries.

use serde::{Deserialize, Serialize};

/// Shape of a planned query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    NameOnly,
    NameCompany,
    NameLocation,
    CompanyOnly,
    CompanyLocation,
    SlugBased,
    HandleBased,
    UrlReverse,
    CompanyAmplified,
}

/// A rendered query with its canonical variant tag.
///
/// The variant id is a stable tag (`handle:clean`, `name+company`,
/// `url_exact`, ...) used for deduplication within a planning pass and for
/// the aggregate variant statistics in the run trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Rendered query text as it will be sent to a provider.
    pub text: String,
    /// Shape of the query.
    pub query_type: QueryType,
    /// Stable canonical tag.
    pub variant_id: String,
}

impl Query {
    /// Build a query.
    pub fn new(
        text: impl Into<String>,
        query_type: QueryType,
        variant_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            query_type,
            variant_id: variant_id.into(),
        }
    }

    /// Case-folded text used for deduplication within a planning pass.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Deduplicate by case-folded text, preserving first-seen order, then
/// truncate to `budget`.
#[must_use]
pub fn dedup_and_truncate(queries: Vec<Query>, budget: usize) -> Vec<Query> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(queries.len().min(budget));
    for q in queries {
        if out.len() >= budget {
            break;
        }
        if seen.insert(q.dedup_key()) {
            out.push(q);
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_is_case_insensitive_and_ordered() {
        let queries = vec![
            Query::new("\"Jane Doe\"", QueryType::NameOnly, "name:quoted"),
            Query::new("\"jane doe\"", QueryType::NameOnly, "name:quoted"),
            Query::new("Jane Doe Acme", QueryType::NameCompany, "name+company"),
        ];
        let out = dedup_and_truncate(queries, 10);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].variant_id, "name:quoted");
        assert_eq!(out[1].variant_id, "name+company");
    }

    #[test]
    fn truncation_enforces_budget() {
        let queries = (0..10)
            .map(|i| Query::new(format!("q{i}"), QueryType::NameOnly, format!("v{i}")))
            .collect();
        assert_eq!(dedup_and_truncate(queries, 4).len(), 4);
    }
}
