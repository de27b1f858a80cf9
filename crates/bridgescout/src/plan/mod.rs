//! Query planning: hints → ordered, deduplicated queries under a budget.
//!
//! Planners are pure. Each emitted [`Query`] carries a stable variant id
//! used for dedup accounting and the run-trace variant histogram. The
//! confidence gates are fixed constants; planning rules key off them rather
//! than raw thresholds scattered through the code.

use crate::hints::vocab::TECH_KEYWORDS;
use crate::model::{dedup_and_truncate, EnrichedHints, Platform, Query, QueryType};

/// Confidence gate: hints at or above this are trusted outright.
pub const HIGH_CONFIDENCE: f64 = 0.70;
/// Confidence gate: hints at or above this are usable in combinations.
pub const MEDIUM_CONFIDENCE: f64 = 0.50;
/// Confidence gate: hints below this are ignored entirely.
pub const LOW_CONFIDENCE: f64 = 0.30;

/// Company confidence required for company-only planning when the name is
/// weak.
const COMPANY_AMPLIFIED_GATE: f64 = 0.85;

/// Locations longer than this are too noisy to combine into queries.
const MAX_LOCATION_QUERY_LEN: usize = 30;

/// Candidate handle forms derived from a LinkedIn slug, most specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleForms {
    /// The slug as-is (`jane-doe-12345`).
    pub raw: String,
    /// Uniquifier and credential tails stripped (`jane-doe`).
    pub clean: String,
    /// Clean form with hyphens removed (`janedoe`).
    pub compact: String,
    /// Clean form with hyphens as spaces (`jane doe`).
    pub spaced: String,
}

/// Derive the handle forms for a slug.
#[must_use]
pub fn handle_forms(slug: &str) -> HandleForms {
    let raw = slug.trim().to_lowercase();
    let clean = strip_slug_tails(&raw);
    let compact = clean.replace('-', "");
    let spaced = clean.replace('-', " ");
    HandleForms {
        raw,
        clean,
        compact,
        spaced,
    }
}

fn strip_slug_tails(slug: &str) -> String {
    let mut tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();
    while tokens.len() > 1 {
        let last = tokens[tokens.len() - 1];
        let numeric = last.chars().all(|c| c.is_ascii_digit());
        let hexish = last.len() >= 4
            && last.chars().all(|c| c.is_ascii_hexdigit())
            && last.chars().any(|c| c.is_ascii_digit());
        if numeric || hexish || crate::hints::vocab::CREDENTIAL_TAILS.contains(&last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join("-")
}

/// Up to two technology keywords from a technical headline.
#[must_use]
pub fn tech_keywords(headline: &str) -> Vec<&'static str> {
    let lower = headline.to_lowercase();
    let mut found = Vec::new();
    for token in lower.split(|c: char| !c.is_alphanumeric()) {
        if found.len() == 2 {
            break;
        }
        if let Some(kw) = TECH_KEYWORDS.iter().find(|k| **k == token) {
            if !found.contains(kw) {
                found.push(*kw);
            }
        }
    }
    found
}

/// Plan name-based GitHub search queries.
#[must_use]
pub fn plan_github_queries(hints: &EnrichedHints, max_queries: usize) -> Vec<Query> {
    let mut queries = Vec::new();
    let name = hints.name.as_str().map(str::trim).filter(|s| !s.is_empty());

    if let Some(name) = name.filter(|_| hints.name.confidence >= LOW_CONFIDENCE) {
        if hints.name.confidence >= HIGH_CONFIDENCE {
            queries.push(Query::new(
                format!("\"{name}\""),
                QueryType::NameOnly,
                "name:quoted",
            ));
        }
        queries.push(Query::new(name, QueryType::NameOnly, "name:plain"));

        if hints.company.clears(MEDIUM_CONFIDENCE) {
            let company = hints.company.as_str().unwrap_or_default();
            queries.push(Query::new(
                format!("{name} {company}"),
                QueryType::NameCompany,
                "name+company",
            ));
            if hints.name.confidence >= HIGH_CONFIDENCE {
                queries.push(Query::new(
                    format!("{name} {company} github"),
                    QueryType::CompanyAmplified,
                    "name+company:github",
                ));
                queries.push(Query::new(
                    format!("{name} {company} linkedin"),
                    QueryType::CompanyAmplified,
                    "name+company:linkedin",
                ));
            }
        }

        if hints.location.clears(MEDIUM_CONFIDENCE) {
            let location = hints.location.as_str().unwrap_or_default();
            if location.len() <= MAX_LOCATION_QUERY_LEN {
                queries.push(Query::new(
                    format!("{name} {location}"),
                    QueryType::NameLocation,
                    "name+location",
                ));
            }
        }

        if hints.role_type.is_technical() {
            if let Some(headline) = hints.headline.as_str() {
                let keywords = tech_keywords(headline);
                if !keywords.is_empty() {
                    queries.push(Query::new(
                        format!("{name} {}", keywords.join(" ")),
                        QueryType::NameOnly,
                        "name+tech",
                    ));
                }
            }
        }
    }

    // Strong company, weak name: amplify the company instead.
    if hints.company.clears(COMPANY_AMPLIFIED_GATE) && hints.name.confidence < MEDIUM_CONFIDENCE {
        let company = hints.company.as_str().unwrap_or_default();
        queries.push(Query::new(
            company,
            QueryType::CompanyOnly,
            "company:only",
        ));
        if let Some(location) = hints.location.as_str() {
            queries.push(Query::new(
                format!("{company} {location}"),
                QueryType::CompanyLocation,
                "company+location",
            ));
        }
    }

    // No usable name at all: fall back to slug-derived handles.
    if name.is_none() || hints.name.confidence < LOW_CONFIDENCE {
        let forms = handle_forms(&hints.linkedin_id);
        queries.push(Query::new(
            forms.raw.clone(),
            QueryType::SlugBased,
            "handle:raw",
        ));
        if forms.clean != forms.raw {
            queries.push(Query::new(
                forms.clean.clone(),
                QueryType::SlugBased,
                "handle:clean",
            ));
        }
        if forms.spaced != forms.clean {
            queries.push(Query::new(
                format!("\"{}\"", forms.spaced),
                QueryType::SlugBased,
                "handle:spaced:quoted",
            ));
            queries.push(Query::new(
                forms.spaced.clone(),
                QueryType::SlugBased,
                "handle:spaced",
            ));
        }
    }

    dedup_and_truncate(queries, max_queries)
}

/// Plan URL-anchored reverse-link queries: pages that link back to the
/// LinkedIn profile.
#[must_use]
pub fn plan_reverse_link_queries(hints: &EnrichedHints, max_queries: usize) -> Vec<Query> {
    let url = hints.linkedin_url.trim_end_matches('/');
    let bare = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let mut queries = vec![
        Query::new(format!("\"{url}\""), QueryType::UrlReverse, "url_exact"),
        Query::new(format!("\"{bare}\""), QueryType::UrlReverse, "url_bare"),
        Query::new(
            format!("\"{bare}\" site:github.com"),
            QueryType::UrlReverse,
            "url+site:github",
        ),
        Query::new(
            format!("\"{bare}\" portfolio OR \"personal site\""),
            QueryType::UrlReverse,
            "url+portfolio",
        ),
    ];

    if matches!(
        hints.role_type,
        crate::model::RoleType::Engineer | crate::model::RoleType::Researcher
    ) {
        queries.push(Query::new(
            format!("\"{bare}\" conference OR speaker"),
            QueryType::UrlReverse,
            "url+speaker",
        ));
    }

    dedup_and_truncate(queries, max_queries)
}

/// Plan handle-and-name queries for a non-GitHub platform.
///
/// Each platform gets two or three queries combining a `site:` handle probe
/// with name-based searches.
#[must_use]
pub fn plan_platform_queries(
    platform: Platform,
    hints: &EnrichedHints,
    max_queries: usize,
) -> Vec<Query> {
    let forms = handle_forms(&hints.linkedin_id);
    let name = hints
        .name
        .as_str()
        .filter(|_| hints.name.confidence >= LOW_CONFIDENCE);
    let mut queries = Vec::new();

    let site = platform.site_domain();

    match platform {
        Platform::Npm => {
            queries.push(Query::new(
                format!("site:npmjs.com/~{}", forms.compact),
                QueryType::HandleBased,
                "handle:clean",
            ));
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("\"{name}\" npm package author"),
                    QueryType::NameOnly,
                    "name+site",
                ));
            }
        }
        Platform::Pypi => {
            queries.push(Query::new(
                format!("site:pypi.org/user/{}", forms.compact),
                QueryType::HandleBased,
                "handle:clean",
            ));
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("\"{name}\" site:pypi.org"),
                    QueryType::NameOnly,
                    "name+site",
                ));
            }
        }
        Platform::Orcid => {
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("\"{name}\" site:orcid.org"),
                    QueryType::NameOnly,
                    "name+site",
                ));
                queries.push(Query::new(
                    format!("\"{name}\" orcid"),
                    QueryType::NameOnly,
                    "name+keyword",
                ));
            }
        }
        Platform::GoogleScholar => {
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("\"{name}\" site:scholar.google.com"),
                    QueryType::NameOnly,
                    "name+site",
                ));
                if let Some(company) = hints
                    .company
                    .as_str()
                    .filter(|_| hints.company.confidence >= MEDIUM_CONFIDENCE)
                {
                    queries.push(Query::new(
                        format!("\"{name}\" {company} scholar"),
                        QueryType::NameCompany,
                        "name+company",
                    ));
                }
            }
        }
        Platform::Crunchbase => {
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("site:crunchbase.com/person \"{name}\""),
                    QueryType::NameOnly,
                    "name+site",
                ));
            }
            queries.push(Query::new(
                format!("site:crunchbase.com/person/{}", forms.clean),
                QueryType::HandleBased,
                "handle:clean",
            ));
        }
        Platform::Medium => {
            queries.push(Query::new(
                format!("site:medium.com/@{}", forms.compact),
                QueryType::HandleBased,
                "handle:clean",
            ));
            if let Some(name) = name {
                queries.push(Query::new(
                    format!("\"{name}\" site:medium.com"),
                    QueryType::NameOnly,
                    "name+site",
                ));
            }
        }
        _ => {
            // Kaggle, Dribbble and anything handle-shaped by default.
            if let Some(domain) = site {
                queries.push(Query::new(
                    format!("site:{domain}/{}", forms.compact),
                    QueryType::HandleBased,
                    "handle:clean",
                ));
                if forms.clean != forms.compact {
                    queries.push(Query::new(
                        format!("site:{domain}/{}", forms.clean),
                        QueryType::HandleBased,
                        "handle:raw",
                    ));
                }
                if let Some(name) = name {
                    queries.push(Query::new(
                        format!("\"{name}\" site:{domain}"),
                        QueryType::NameOnly,
                        "name+site",
                    ));
                }
            }
        }
    }

    dedup_and_truncate(queries, max_queries)
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hint, HintSource, RoleType};

    fn hints_with(name: (&str, f64), company: (&str, f64), location: (&str, f64)) -> EnrichedHints {
        let mut hints =
            EnrichedHints::empty("jane-doe-12345", "https://www.linkedin.com/in/jane-doe-12345");
        if !name.0.is_empty() {
            hints.name = Hint::present(name.0, name.1, HintSource::SerpTitle);
        }
        if !company.0.is_empty() {
            hints.company = Hint::present(company.0, company.1, HintSource::HeadlineParse);
        }
        if !location.0.is_empty() {
            hints.location = Hint::present(location.0, location.1, HintSource::SerpSnippet);
        }
        hints
    }

    #[test]
    fn high_confidence_name_gets_quoted_and_plain() {
        let hints = hints_with(("Jane Doe", 0.95), ("", 0.0), ("", 0.0));
        let queries = plan_github_queries(&hints, 10);
        let variants: Vec<&str> = queries.iter().map(|q| q.variant_id.as_str()).collect();
        assert!(variants.contains(&"name:quoted"));
        assert!(variants.contains(&"name:plain"));
    }

    #[test]
    fn low_confidence_name_skips_quoted() {
        let hints = hints_with(("Jane Doe", 0.45), ("", 0.0), ("", 0.0));
        let queries = plan_github_queries(&hints, 10);
        assert!(queries.iter().all(|q| q.variant_id != "name:quoted"));
        assert!(queries.iter().any(|q| q.variant_id == "name:plain"));
    }

    #[test]
    fn company_amplified_queries_emitted_for_high_confidence_keywords() {
        let hints = hints_with(("Jane Doe", 0.95), ("Acme", 0.80), ("", 0.0));
        let queries = plan_github_queries(&hints, 10);
        let variants: Vec<&str> = queries.iter().map(|q| q.variant_id.as_str()).collect();
        assert!(variants.contains(&"name+company"));
        assert!(variants.contains(&"name+company:github"));
        assert!(variants.contains(&"name+company:linkedin"));
    }

    #[test]
    fn long_locations_are_skipped() {
        let hints = hints_with(
            ("Jane Doe", 0.95),
            ("", 0.0),
            ("Greater San Francisco Bay Area, California, USA", 0.85),
        );
        let queries = plan_github_queries(&hints, 10);
        assert!(queries.iter().all(|q| q.variant_id != "name+location"));
    }

    #[test]
    fn company_only_fallback_when_name_is_weak() {
        let hints = hints_with(("Jane Doe", 0.40), ("Acme", 0.90), ("Austin, TX", 0.85));
        let queries = plan_github_queries(&hints, 10);
        let variants: Vec<&str> = queries.iter().map(|q| q.variant_id.as_str()).collect();
        assert!(variants.contains(&"company:only"));
        assert!(variants.contains(&"company+location"));
    }

    #[test]
    fn slug_fallback_when_no_name() {
        let hints = hints_with(("", 0.0), ("", 0.0), ("", 0.0));
        let queries = plan_github_queries(&hints, 10);
        let variants: Vec<&str> = queries.iter().map(|q| q.variant_id.as_str()).collect();
        assert!(variants.contains(&"handle:raw"));
        assert!(variants.contains(&"handle:clean"));
        assert!(variants.contains(&"handle:spaced:quoted"));
    }

    #[test]
    fn tech_keywords_for_engineer_roles() {
        let mut hints = hints_with(("Jane Doe", 0.95), ("", 0.0), ("", 0.0));
        hints.role_type = RoleType::Engineer;
        hints.headline = Hint::present(
            "Senior Rust and Kubernetes engineer",
            0.80,
            HintSource::HeadlineParse,
        );
        let queries = plan_github_queries(&hints, 10);
        let tech = queries
            .iter()
            .find(|q| q.variant_id == "name+tech")
            .unwrap();
        assert_eq!(tech.text, "Jane Doe rust kubernetes");
    }

    #[test]
    fn budget_is_respected() {
        let hints = hints_with(("Jane Doe", 0.95), ("Acme", 0.90), ("Austin, TX", 0.85));
        assert!(plan_github_queries(&hints, 3).len() <= 3);
        assert!(plan_reverse_link_queries(&hints, 2).len() <= 2);
        assert!(plan_platform_queries(Platform::Npm, &hints, 1).len() <= 1);
    }

    #[test]
    fn reverse_link_variants() {
        let mut hints = hints_with(("Jane Doe", 0.95), ("", 0.0), ("", 0.0));
        hints.role_type = RoleType::Engineer;
        let queries = plan_reverse_link_queries(&hints, 10);
        let variants: Vec<&str> = queries.iter().map(|q| q.variant_id.as_str()).collect();
        assert!(variants.contains(&"url_exact"));
        assert!(variants.contains(&"url+site:github"));
        assert!(variants.contains(&"url+speaker"));
        assert!(queries[0].text.contains("linkedin.com/in/jane-doe-12345"));
    }

    #[test]
    fn handle_forms_strip_uniquifiers() {
        let forms = handle_forms("jane-doe-12345");
        assert_eq!(forms.raw, "jane-doe-12345");
        assert_eq!(forms.clean, "jane-doe");
        assert_eq!(forms.compact, "janedoe");
        assert_eq!(forms.spaced, "jane doe");
    }

    #[test]
    fn platform_planners_emit_handle_probes() {
        let hints = hints_with(("Jane Doe", 0.95), ("", 0.0), ("", 0.0));
        let npm = plan_platform_queries(Platform::Npm, &hints, 5);
        assert!(npm.iter().any(|q| q.text == "site:npmjs.com/~janedoe"));
        let kaggle = plan_platform_queries(Platform::Kaggle, &hints, 5);
        assert!(kaggle.iter().any(|q| q.text == "site:kaggle.com/janedoe"));
        let orcid = plan_platform_queries(Platform::Orcid, &hints, 5);
        assert!(orcid.iter().all(|q| q.query_type == QueryType::NameOnly));
    }
}
