//! Location extraction and plausibility checks.

use super::vocab::{country_code_for, US_STATE_ABBREVS};

/// A location candidate with its extraction confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationParse {
    pub location: String,
    pub confidence: f64,
}

fn tidy(fragment: &str) -> &str {
    fragment
        .trim()
        .trim_end_matches(['.', ',', ';', '·', '|'])
        .trim()
}

/// "City, ST" — a capitalized city followed by a two-letter state code.
fn is_city_state(fragment: &str) -> bool {
    let Some((city, state)) = fragment.rsplit_once(", ") else {
        return false;
    };
    let state = state.trim();
    if !US_STATE_ABBREVS.contains(&state) {
        return false;
    }
    let city = city.trim();
    !city.is_empty()
        && !city.contains(',')
        && city.split_whitespace().count() <= 3
        && city.chars().next().is_some_and(char::is_uppercase)
}

/// Plausibility predicate: a known state/country/city, a "City, ST" form,
/// or a `City, Capitalized` two-part form.
#[must_use]
pub fn is_plausible_location(fragment: &str) -> bool {
    let fragment = tidy(fragment);
    if fragment.is_empty() || fragment.len() > 60 {
        return false;
    }
    if country_code_for(fragment).is_some() {
        return true;
    }
    if is_city_state(fragment) {
        return true;
    }
    if let Some((left, right)) = fragment.rsplit_once(", ") {
        // Either side known, or both sides capitalized words.
        if country_code_for(left).is_some() || country_code_for(right).is_some() {
            return true;
        }
        let capitalized = |s: &str| {
            !s.trim().is_empty()
                && s.trim().chars().next().is_some_and(char::is_uppercase)
                && s.split_whitespace().count() <= 3
        };
        return capitalized(left) && capitalized(right);
    }
    false
}

/// Extract a location from SERP text (headline or snippet).
///
/// Attempts, in order: an explicit `Location:` prefix (0.95), a
/// `City, ST` pattern (0.85), middot/pipe segments passing the
/// plausibility predicate (0.70), and a `based in X` phrase (0.75).
#[must_use]
pub fn extract_location(text: &str) -> Option<LocationParse> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Explicit "Location:" prefix.
    if let Some(idx) = text.find("Location:") {
        let rest = &text[idx + "Location:".len()..];
        let end = rest
            .find(" · ")
            .or_else(|| rest.find(" | "))
            .or_else(|| rest.find(". "))
            .unwrap_or(rest.len());
        let fragment = tidy(&rest[..end]);
        if is_plausible_location(fragment) {
            return Some(LocationParse {
                location: fragment.to_string(),
                confidence: 0.95,
            });
        }
    }

    // "based in X" phrasing.
    if let Some(idx) = text.to_ascii_lowercase().find("based in ") {
        let rest = &text[idx + "based in ".len()..];
        let end = rest
            .find(|c: char| matches!(c, '.' | '·' | '|' | ';'))
            .unwrap_or(rest.len());
        let fragment = tidy(&rest[..end]);
        if is_plausible_location(fragment) {
            return Some(LocationParse {
                location: fragment.to_string(),
                confidence: 0.75,
            });
        }
    }

    // Segment scan: middot/pipe-separated pieces, then a direct
    // "City, ST" check over comma windows.
    for segment in text.split(['·', '|']).map(tidy) {
        if segment.is_empty() {
            continue;
        }
        if is_city_state(segment) {
            return Some(LocationParse {
                location: segment.to_string(),
                confidence: 0.85,
            });
        }
    }

    // Sliding two-part comma windows inside segments
    // ("Engineer, San Francisco, CA" → "San Francisco, CA").
    for segment in text.split(['·', '|']) {
        let parts: Vec<&str> = segment.split(',').map(str::trim).collect();
        if parts.len() >= 2 {
            for window in parts.windows(2) {
                let joined = format!("{}, {}", window[0], window[1]);
                if is_city_state(&joined) {
                    return Some(LocationParse {
                        location: joined,
                        confidence: 0.85,
                    });
                }
            }
        }
    }

    // Plausible middot/pipe segment as a weak candidate.
    for segment in text.split(['·', '|']).map(tidy) {
        if !segment.is_empty()
            && segment != text
            && is_plausible_location(segment)
        {
            return Some(LocationParse {
                location: segment.to_string(),
                confidence: 0.70,
            });
        }
    }

    None
}
