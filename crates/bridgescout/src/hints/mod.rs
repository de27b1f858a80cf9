//! Hint extraction (SERP title/snippet/slug → [`EnrichedHints`]).
//!
//! The extractor is pure and total: any field may come back absent with
//! zero confidence, but it never fails. Knowledge-graph and answer-box
//! fields from the stored SERP metadata override lower-confidence textual
//! extractions at fixed floors, and a LinkedIn locale country code adjusts
//! the location confidence up or down.

mod company;
mod location;
mod name;
pub(crate) mod vocab;

pub use company::{extract_company, CompanyParse};
pub use location::{extract_location, is_plausible_location, LocationParse};
pub use name::{clean_title, looks_like_name, name_from_slug, parse_title, TitleParse};
pub use vocab::{country_code_for, country_code_for_location};

use crate::model::{Candidate, EnrichedHints, Hint, HintSource, RoleType};

/// Confidence floor applied when a knowledge-graph field overrides.
const KNOWLEDGE_GRAPH_FLOOR: f64 = 0.95;
/// Confidence floor applied when an answer-box field overrides.
const ANSWER_BOX_FLOOR: f64 = 0.90;
/// Locale country agreement bonus and its cap.
const LOCALE_AGREE_BONUS: f64 = 0.05;
const LOCALE_AGREE_CAP: f64 = 0.99;
/// Locale country disagreement penalty and its floor.
const LOCALE_DISAGREE_PENALTY: f64 = 0.20;
const LOCALE_DISAGREE_FLOOR: f64 = 0.10;

/// Extract the hint snapshot for a candidate from its stored SERP fields.
#[must_use]
pub fn extract_hints(candidate: &Candidate) -> EnrichedHints {
    extract(
        &candidate.linkedin_slug,
        &candidate.linkedin_url,
        &candidate.serp_title,
        &candidate.serp_snippet,
        candidate.serp_metadata.as_ref(),
        candidate.role(),
    )
}

/// Extract hints from raw SERP parts.
#[must_use]
pub fn extract(
    slug: &str,
    linkedin_url: &str,
    serp_title: &str,
    serp_snippet: &str,
    serp_metadata: Option<&serde_json::Value>,
    role_type: RoleType,
) -> EnrichedHints {
    let mut hints = EnrichedHints::empty(slug, linkedin_url);
    hints.role_type = role_type;

    // (a) Name from title; (c) headline is the remainder.
    let parsed = parse_title(serp_title);
    if let Some(name) = parsed.name {
        hints.name = Hint::present(name, parsed.confidence, HintSource::SerpTitle);
    }
    if let Some(headline) = &parsed.headline {
        let confidence = if serp_title.contains("LinkedIn") { 0.80 } else { 0.70 };
        hints.headline = Hint::present(headline, confidence, HintSource::HeadlineParse);
    }

    // (b) Slug fallback when the title yielded nothing.
    if !hints.name.is_present() {
        if let Some((name, confidence)) = name_from_slug(slug) {
            hints.name = Hint::present(name, confidence, HintSource::UrlSlug);
        }
    }

    // (d) Company from the headline.
    if let Some(headline) = hints.headline.as_str() {
        if let Some(parse) = extract_company(headline) {
            hints.company =
                Hint::present(parse.company, parse.confidence, HintSource::HeadlineParse);
        }
    }

    // (e) Location: headline first, then the snippet.
    if let Some(headline) = hints.headline.as_str() {
        if let Some(parse) = extract_location(headline) {
            hints.location =
                Hint::present(parse.location, parse.confidence, HintSource::HeadlineParse);
        }
    }
    if !hints.location.is_present() {
        if let Some(parse) = extract_location(serp_snippet) {
            hints.location =
                Hint::present(parse.location, parse.confidence, HintSource::SerpSnippet);
        }
    }

    if let Some(meta) = serp_metadata {
        apply_metadata_overrides(&mut hints, meta);
        apply_locale_adjustment(&mut hints, meta);
    }

    hints
}

fn meta_str<'a>(meta: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = meta;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().filter(|s| !s.trim().is_empty())
}

/// Knowledge-graph fields override at a 0.95 floor, answer-box at 0.90.
/// An override only applies when its floor beats the current confidence.
fn apply_metadata_overrides(hints: &mut EnrichedHints, meta: &serde_json::Value) {
    let overrides: [(&[&str], HintSource, f64); 6] = [
        (
            &["knowledgeGraph", "title"],
            HintSource::SerpKnowledgeGraph,
            KNOWLEDGE_GRAPH_FLOOR,
        ),
        (
            &["knowledgeGraph", "company"],
            HintSource::SerpKnowledgeGraph,
            KNOWLEDGE_GRAPH_FLOOR,
        ),
        (
            &["knowledgeGraph", "location"],
            HintSource::SerpKnowledgeGraph,
            KNOWLEDGE_GRAPH_FLOOR,
        ),
        (&["answerBox", "name"], HintSource::SerpAnswerBox, ANSWER_BOX_FLOOR),
        (
            &["answerBox", "company"],
            HintSource::SerpAnswerBox,
            ANSWER_BOX_FLOOR,
        ),
        (
            &["answerBox", "location"],
            HintSource::SerpAnswerBox,
            ANSWER_BOX_FLOOR,
        ),
    ];

    for (path, source, floor) in overrides {
        let Some(value) = meta_str(meta, path) else {
            continue;
        };
        let field = match *path.last().unwrap_or(&"") {
            "title" | "name" => &mut hints.name,
            "company" => &mut hints.company,
            "location" => &mut hints.location,
            _ => continue,
        };
        if field.confidence < floor {
            *field = Hint::present(value, floor, source);
        }
    }
}

/// A LinkedIn locale country code that agrees with the derived location
/// adds +0.05 (capped at 0.99); disagreement subtracts 0.20 (floored at 0.10).
fn apply_locale_adjustment(hints: &mut EnrichedHints, meta: &serde_json::Value) {
    let Some(locale_country) = meta_str(meta, &["localeCountry"]) else {
        return;
    };
    let Some(location) = hints.location.as_str() else {
        return;
    };
    let Some(derived_country) = country_code_for_location(location) else {
        return;
    };

    if derived_country.eq_ignore_ascii_case(locale_country) {
        hints.location.confidence =
            (hints.location.confidence + LOCALE_AGREE_BONUS).min(LOCALE_AGREE_CAP);
    } else {
        hints.location.confidence =
            (hints.location.confidence - LOCALE_DISAGREE_PENALTY).max(LOCALE_DISAGREE_FLOOR);
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_simple(title: &str, snippet: &str) -> EnrichedHints {
        extract(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
            title,
            snippet,
            None,
            RoleType::Engineer,
        )
    }

    #[test]
    fn full_title_extraction() {
        let hints = extract_simple(
            "Jane Doe - Senior SWE at Acme | LinkedIn",
            "Location: Seattle, WA · 500+ connections",
        );
        assert_eq!(hints.name.as_str(), Some("Jane Doe"));
        assert_eq!(hints.name.confidence, 0.95);
        assert_eq!(hints.name.source, HintSource::SerpTitle);
        assert_eq!(hints.headline.as_str(), Some("Senior SWE at Acme"));
        assert_eq!(hints.company.as_str(), Some("Acme"));
        assert_eq!(hints.company.confidence, 0.90);
        assert_eq!(hints.location.as_str(), Some("Seattle, WA"));
        assert_eq!(hints.location.confidence, 0.95);
        assert_eq!(hints.location.source, HintSource::SerpSnippet);
    }

    #[test]
    fn slug_fallback_when_title_has_no_name() {
        let hints = extract_simple("Senior Engineer - Acme | LinkedIn", "");
        assert_eq!(hints.name.as_str(), Some("Jane Doe"));
        assert_eq!(hints.name.source, HintSource::UrlSlug);
        assert_eq!(hints.name.confidence, 0.50);
    }

    #[test]
    fn never_fails_on_garbage() {
        let hints = extract(
            "x",
            "https://www.linkedin.com/in/x",
            "%%%%",
            "@@@",
            None,
            RoleType::General,
        );
        assert!(!hints.name.is_present());
        assert_eq!(hints.name.confidence, 0.0);
        assert!(!hints.company.is_present());
        assert!(!hints.location.is_present());
    }

    #[test]
    fn knowledge_graph_overrides_weak_fields() {
        let meta = json!({
            "knowledgeGraph": {"title": "Jane A. Doe", "company": "Acme Corporation"}
        });
        let hints = extract(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
            "",
            "",
            Some(&meta),
            RoleType::General,
        );
        assert_eq!(hints.name.as_str(), Some("Jane A. Doe"));
        assert_eq!(hints.name.confidence, 0.95);
        assert_eq!(hints.name.source, HintSource::SerpKnowledgeGraph);
        assert_eq!(hints.company.as_str(), Some("Acme Corporation"));
    }

    #[test]
    fn knowledge_graph_does_not_demote_stronger_title() {
        let meta = json!({"answerBox": {"name": "Someone Else"}});
        let hints = extract(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
            "Jane Doe - Senior SWE at Acme | LinkedIn",
            "",
            Some(&meta),
            RoleType::General,
        );
        // Title name at 0.95 beats the 0.90 answer-box floor.
        assert_eq!(hints.name.as_str(), Some("Jane Doe"));
    }

    #[test]
    fn locale_agreement_boosts_location() {
        let meta = json!({"localeCountry": "US"});
        let hints = extract(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
            "Jane Doe - SWE | LinkedIn",
            "Location: Seattle, WA",
            Some(&meta),
            RoleType::General,
        );
        // +0.05 bonus, capped at 0.99.
        assert_eq!(hints.location.confidence, 0.99);
    }

    #[test]
    fn locale_disagreement_penalizes_location() {
        let meta = json!({"localeCountry": "DE"});
        let hints = extract(
            "jane-doe-12345",
            "https://www.linkedin.com/in/jane-doe-12345",
            "Jane Doe - SWE | LinkedIn",
            "Location: Seattle, WA",
            Some(&meta),
            RoleType::General,
        );
        assert!((hints.location.confidence - 0.75).abs() < 1e-9);
    }
}
