//! Company extraction from headlines.

use super::vocab::{COMPANY_INDICATORS, KNOWN_BRANDS};

/// A company candidate with its extraction confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyParse {
    pub company: String,
    pub confidence: f64,
}

/// Openings that indicate an academic institution rather than an employer.
const ACADEMIC_OPENINGS: &[&str] = &[
    "the university",
    "university of",
    "college of",
    "institute of",
    "school of",
];

fn is_academic(fragment: &str) -> bool {
    let lower = fragment.trim().to_lowercase();
    ACADEMIC_OPENINGS.iter().any(|p| lower.starts_with(p))
}

/// Trim trailing punctuation and delimiter residue off a company fragment.
fn tidy(fragment: &str) -> &str {
    fragment
        .trim()
        .trim_end_matches(['.', ',', ';', '!', '·', '|'])
        .trim()
}

/// Extract the company following an "at " or "@ " marker. Unicode-aware;
/// stops at the next segment delimiter. Rejects academic openings.
fn company_after_at(headline: &str) -> Option<String> {
    // ASCII-lowercase keeps byte offsets aligned with the original.
    let lower = headline.to_ascii_lowercase();
    let start = if let Some(i) = lower.find(" at ") {
        i + 4
    } else if let Some(i) = lower.find("@ ") {
        i + 2
    } else if let Some(i) = lower.find('@') {
        // "@Acme" with no space.
        i + 1
    } else {
        return None;
    };

    let rest = &headline[start..];
    let end = rest
        .find(" - ")
        .or_else(|| rest.find(" | "))
        .or_else(|| rest.find(" · "))
        .or_else(|| rest.find(','))
        .unwrap_or(rest.len());
    let fragment = tidy(&rest[..end]);

    if fragment.is_empty() || !fragment.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }
    if is_academic(fragment) {
        return None;
    }
    // Cap at five words; longer tails are sentences, not company names.
    let words: Vec<&str> = fragment.split_whitespace().collect();
    if words.len() > 5 {
        return None;
    }
    Some(fragment.to_string())
}

fn contains_brand(fragment: &str) -> bool {
    let lower = fragment.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| KNOWN_BRANDS.contains(&w))
}

fn contains_indicator(fragment: &str) -> bool {
    let lower = fragment.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| COMPANY_INDICATORS.contains(&w))
}

/// Extract a company from a headline.
///
/// Order of attempts: `at X` / `@ X` (0.90, or 0.95 when X is a known
/// brand), right-to-left segment search for indicator tokens (0.85) or
/// known brands (0.95), then a ` - X` tail (0.60).
#[must_use]
pub fn extract_company(headline: &str) -> Option<CompanyParse> {
    let headline = headline.trim();
    if headline.is_empty() {
        return None;
    }

    if let Some(company) = company_after_at(headline) {
        let confidence = if contains_brand(&company) { 0.95 } else { 0.90 };
        return Some(CompanyParse {
            company,
            confidence,
        });
    }

    // Right-to-left over segments split on the usual delimiters.
    let segments: Vec<&str> = headline
        .split([
            '|', '·', ',',
        ])
        .flat_map(|s| s.split(" - "))
        .map(tidy)
        .filter(|s| !s.is_empty())
        .collect();

    for segment in segments.iter().rev() {
        if is_academic(segment) {
            continue;
        }
        if contains_brand(segment) {
            return Some(CompanyParse {
                company: (*segment).to_string(),
                confidence: 0.95,
            });
        }
        if contains_indicator(segment) {
            return Some(CompanyParse {
                company: (*segment).to_string(),
                confidence: 0.85,
            });
        }
    }

    // " - X" tail: last dash segment, as a weak fallback.
    if segments.len() >= 2 {
        let tail = segments[segments.len() - 1];
        let words: Vec<&str> = tail.split_whitespace().collect();
        if (1..=4).contains(&words.len())
            && tail.chars().next().is_some_and(char::is_uppercase)
            && !is_academic(tail)
        {
            return Some(CompanyParse {
                company: tail.to_string(),
                confidence: 0.60,
            });
        }
    }

    None
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_pattern() {
        let parse = extract_company("Senior SWE at Acme").unwrap();
        assert_eq!(parse.company, "Acme");
        assert_eq!(parse.confidence, 0.90);
    }

    #[test]
    fn at_pattern_with_brand() {
        let parse = extract_company("Staff Engineer at Google").unwrap();
        assert_eq!(parse.company, "Google");
        assert_eq!(parse.confidence, 0.95);
    }

    #[test]
    fn at_pattern_rejects_academia() {
        assert!(extract_company("PhD Candidate at The University of Somewhere").is_none());
    }

    #[test]
    fn indicator_segment() {
        let parse = extract_company("Backend Engineer · Initech Labs").unwrap();
        assert_eq!(parse.company, "Initech Labs");
        assert_eq!(parse.confidence, 0.85);
    }

    #[test]
    fn brand_segment() {
        let parse = extract_company("iOS, Stripe").unwrap();
        assert_eq!(parse.company, "Stripe");
        assert_eq!(parse.confidence, 0.95);
    }

    #[test]
    fn dash_tail_fallback() {
        let parse = extract_company("Product Designer - Hooli").unwrap();
        assert_eq!(parse.company, "Hooli");
        assert_eq!(parse.confidence, 0.60);
    }

    #[test]
    fn empty_headline() {
        assert!(extract_company("").is_none());
        assert!(extract_company("writes about things").is_none());
    }
}
