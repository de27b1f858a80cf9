//! Hints extracted from public SERP data.

use serde::{Deserialize, Serialize};

/// Where a hint value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    /// Parsed out of the SERP result title.
    SerpTitle,
    /// Parsed out of the SERP snippet text.
    SerpSnippet,
    /// Taken from a search-engine knowledge-graph blob.
    SerpKnowledgeGraph,
    /// Taken from a SERP answer box.
    SerpAnswerBox,
    /// Reconstructed from the LinkedIn URL slug.
    UrlSlug,
    /// Derived while parsing the headline portion of the title.
    HeadlineParse,
    /// Provenance unknown (empty hints).
    Unknown,
}

/// A possibly-absent string with a provenance tag and confidence.
///
/// Hints are immutable once computed; the extractor never throws, it returns
/// empty hints with zero confidence instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    /// Extracted value, `None` when nothing plausible was found.
    pub value: Option<String>,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// Provenance of the value.
    pub source: HintSource,
}

impl Hint {
    /// A present hint with the given confidence and source.
    pub fn present(value: impl Into<String>, confidence: f64, source: HintSource) -> Self {
        Self {
            value: Some(value.into()),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// The canonical empty hint: no value, zero confidence.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            source: HintSource::Unknown,
        }
    }

    /// True when a value is present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// The value as a `&str`, when present.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True when the hint is present and its confidence clears `gate`.
    #[must_use]
    pub fn clears(&self, gate: f64) -> bool {
        self.is_present() && self.confidence >= gate
    }
}

impl Default for Hint {
    fn default() -> Self {
        Self::absent()
    }
}

/// Candidate role category, used to steer query planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Engineer,
    DataScientist,
    Researcher,
    Founder,
    Designer,
    #[default]
    General,
}

impl RoleType {
    /// Roles whose headlines tend to carry technology keywords.
    #[must_use]
    pub fn is_technical(&self) -> bool {
        matches!(
            self,
            Self::Engineer | Self::DataScientist | Self::Researcher
        )
    }
}

/// The complete hint snapshot a candidate is resolved against.
///
/// Invariant: at most one snapshot is derived per run; every downstream
/// component sees the same hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedHints {
    /// Person name.
    pub name: Hint,
    /// Headline (title/role text following the name).
    pub headline: Hint,
    /// Location.
    pub location: Hint,
    /// Current company.
    pub company: Hint,
    /// LinkedIn slug the seed points at.
    pub linkedin_id: String,
    /// Full LinkedIn profile URL.
    pub linkedin_url: String,
    /// Role category.
    pub role_type: RoleType,
}

impl EnrichedHints {
    /// Empty hints for a slug, used when extraction finds nothing.
    pub fn empty(linkedin_id: impl Into<String>, linkedin_url: impl Into<String>) -> Self {
        Self {
            name: Hint::absent(),
            headline: Hint::absent(),
            location: Hint::absent(),
            company: Hint::absent(),
            linkedin_id: linkedin_id.into(),
            linkedin_url: linkedin_url.into(),
            role_type: RoleType::General,
        }
    }
}
