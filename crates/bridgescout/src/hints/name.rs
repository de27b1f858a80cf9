//! Name extraction from SERP titles and LinkedIn slugs.

use super::vocab::{CREDENTIAL_TAILS, JOB_TITLE_KEYWORDS};

/// Delimiters separating the name from the headline in a SERP title, in the
/// order they are searched. The comma form is handled separately because it
/// also appears inside "Last, First" names.
const TITLE_DELIMITERS: [&str; 3] = [" - ", " | ", " · "];

/// Result of splitting a cleaned title.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleParse {
    /// Extracted name, when a segment passed the name-likeness check.
    pub name: Option<String>,
    /// Confidence for the name.
    pub confidence: f64,
    /// Remainder after the first recognized delimiter, if any.
    pub headline: Option<String>,
}

/// Strip the trailing LinkedIn marker and any leading "(N)" badge.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.trim();
    for marker in [" | LinkedIn", " - LinkedIn"] {
        if let Some(stripped) = cleaned.strip_suffix(marker) {
            cleaned = stripped.trim_end();
            break;
        }
    }
    // "(3) Jane Doe - ..." notification badge from logged-in captures.
    let mut out = cleaned.to_string();
    if out.starts_with('(') {
        if let Some(end) = out.find(')') {
            if end > 1 && out[1..end].chars().all(|c| c.is_ascii_digit()) {
                out = out[end + 1..].trim_start().to_string();
            }
        }
    }
    out
}

/// Name-likeness predicate: leading Unicode letter, one to five words, no
/// job-title keywords.
#[must_use]
pub fn looks_like_name(segment: &str) -> bool {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return false;
    }
    match trimmed.chars().next() {
        Some(c) if c.is_alphabetic() => {}
        _ => return false,
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.is_empty() || words.len() > 5 {
        return false;
    }
    !words.iter().any(|w| {
        let lower: String = w
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_lowercase();
        JOB_TITLE_KEYWORDS.contains(&lower.as_str())
    })
}

/// Reverse a "Last, First" form when both sides are short name-like tokens.
fn reverse_comma_name(segment: &str) -> Option<String> {
    let (last, first) = segment.split_once(", ")?;
    let short_name = |s: &str| {
        let words: Vec<&str> = s.split_whitespace().collect();
        (1..=2).contains(&words.len()) && looks_like_name(s)
    };
    if short_name(last) && short_name(first) {
        Some(format!("{} {}", first.trim(), last.trim()))
    } else {
        None
    }
}

/// Parse a SERP title into a name candidate and headline remainder.
///
/// Confidence reflects how cleanly the template matched: a marker-bearing
/// title split on a primary delimiter scores highest; comma-reversed and
/// delimiter-free titles score lower.
#[must_use]
pub fn parse_title(title: &str) -> TitleParse {
    let had_marker = title.contains("LinkedIn");
    let cleaned = clean_title(title);
    if cleaned.is_empty() {
        return TitleParse {
            name: None,
            confidence: 0.0,
            headline: None,
        };
    }

    // Earliest primary delimiter wins.
    let split = TITLE_DELIMITERS
        .iter()
        .filter_map(|d| cleaned.find(d).map(|i| (i, *d)))
        .min_by_key(|(i, _)| *i);

    if let Some((idx, delim)) = split {
        let left = cleaned[..idx].trim();
        let headline = cleaned[idx + delim.len()..].trim();
        let headline = (!headline.is_empty()).then(|| headline.to_string());

        if let Some(reversed) = reverse_comma_name(left) {
            return TitleParse {
                name: Some(reversed),
                confidence: 0.80,
                headline,
            };
        }
        if looks_like_name(left) {
            let confidence = match (had_marker, delim) {
                (true, " - " | " | ") => 0.95,
                (true, _) => 0.90,
                (false, " - " | " | ") => 0.85,
                (false, _) => 0.80,
            };
            return TitleParse {
                name: Some(left.to_string()),
                confidence,
                headline,
            };
        }
        return TitleParse {
            name: None,
            confidence: 0.0,
            headline,
        };
    }

    // No primary delimiter. A bare ", " may still separate name and headline
    // or encode a "Last, First" name.
    if let Some(reversed) = reverse_comma_name(&cleaned) {
        return TitleParse {
            name: Some(reversed),
            confidence: 0.78,
            headline: None,
        };
    }
    if let Some((left, right)) = cleaned.split_once(", ") {
        if looks_like_name(left) && !right.trim().is_empty() {
            return TitleParse {
                name: Some(left.trim().to_string()),
                confidence: if had_marker { 0.85 } else { 0.75 },
                headline: Some(right.trim().to_string()),
            };
        }
    }
    if looks_like_name(&cleaned) {
        return TitleParse {
            name: Some(cleaned.clone()),
            confidence: if had_marker { 0.85 } else { 0.75 },
            headline: None,
        };
    }
    TitleParse {
        name: None,
        confidence: 0.0,
        headline: None,
    }
}

/// True for slug tokens that are numeric or hex-ish uniquifiers
/// (`12345`, `7788`, `a1b2c3f`, `9a8b7c6d`).
fn is_uniquifier_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    token.len() >= 4
        && token.chars().all(|c| c.is_ascii_hexdigit())
        && token.chars().any(|c| c.is_ascii_digit())
}

/// Reconstruct a display name from a LinkedIn slug.
///
/// Strips trailing uniquifier tokens and credential tails, requires at
/// least one hyphen in what remains, and title-cases two or three tokens.
/// Returns the name and a confidence in `0.40..=0.60` keyed to how much
/// name material survived.
#[must_use]
pub fn name_from_slug(slug: &str) -> Option<(String, f64)> {
    let mut tokens: Vec<&str> = slug
        .trim()
        .trim_matches('-')
        .split('-')
        .filter(|t| !t.is_empty())
        .collect();

    while let Some(last) = tokens.last() {
        let lower = last.to_lowercase();
        if is_uniquifier_token(last) || CREDENTIAL_TAILS.contains(&lower.as_str()) {
            tokens.pop();
        } else {
            break;
        }
    }

    if tokens.len() < 2 {
        return None;
    }
    tokens.truncate(3);

    let capitalized: Vec<String> = tokens.iter().map(|t| capitalize(t)).collect();
    let has_initial = tokens.iter().any(|t| t.chars().count() == 1);
    let confidence = if has_initial {
        0.40
    } else if tokens.len() == 2 {
        0.50
    } else {
        0.60
    };
    Some((capitalized.join(" "), confidence))
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_marker_and_badge() {
        assert_eq!(
            clean_title("(2) Jane Doe - Senior SWE at Acme | LinkedIn"),
            "Jane Doe - Senior SWE at Acme"
        );
        assert_eq!(clean_title("Jane Doe - LinkedIn"), "Jane Doe");
    }

    #[test]
    fn parses_standard_title() {
        let parse = parse_title("Jane Doe - Senior SWE at Acme | LinkedIn");
        assert_eq!(parse.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parse.confidence, 0.95);
        assert_eq!(parse.headline.as_deref(), Some("Senior SWE at Acme"));
    }

    #[test]
    fn parses_middot_title() {
        let parse = parse_title("José García · Data Scientist | LinkedIn");
        assert_eq!(parse.name.as_deref(), Some("José García"));
        assert_eq!(parse.confidence, 0.90);
    }

    #[test]
    fn reverses_last_first() {
        let parse = parse_title("Doe, Jane - Engineering Manager | LinkedIn");
        assert_eq!(parse.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parse.confidence, 0.80);
    }

    #[test]
    fn rejects_job_title_segments() {
        let parse = parse_title("Senior Software Engineer - Acme | LinkedIn");
        assert_eq!(parse.name, None);
        assert_eq!(parse.headline.as_deref(), Some("Acme"));
    }

    #[test]
    fn rejects_overlong_segments() {
        assert!(!looks_like_name("one two three four five six"));
        assert!(!looks_like_name("123 Main Street"));
        assert!(looks_like_name("Jean-Pierre Dupont"));
    }

    #[test]
    fn slug_reconstruction() {
        assert_eq!(
            name_from_slug("jane-doe-12345"),
            Some(("Jane Doe".to_string(), 0.50))
        );
        assert_eq!(
            name_from_slug("mary-jane-watson-a1b2c3f"),
            Some(("Mary Jane Watson".to_string(), 0.60))
        );
        assert_eq!(
            name_from_slug("j-smith-7788"),
            Some(("J Smith".to_string(), 0.40))
        );
        assert_eq!(
            name_from_slug("jane-doe-phd"),
            Some(("Jane Doe".to_string(), 0.50))
        );
        assert_eq!(name_from_slug("janedoe"), None);
        assert_eq!(name_from_slug("x-99999"), None);
    }
}
