//! Weighted confidence scoring.

use super::normalize::{name_similarity, normalize, token_jaccard};
use super::profile::ProfileObservation;
use crate::model::{BridgeSignal, EnrichedHints, Platform, ScoreBreakdown};

/// Component weight ceilings.
pub const BRIDGE_WEIGHT_MAX: f64 = 0.40;
pub const NAME_WEIGHT: f64 = 0.30;
pub const HANDLE_WEIGHT: f64 = 0.30;
pub const COMPANY_WEIGHT: f64 = 0.15;
pub const LOCATION_WEIGHT: f64 = 0.10;

/// Commit-evidence base and per-match increment within the bridge component.
const COMMIT_EVIDENCE_BASE: f64 = 0.15;
const COMMIT_EVIDENCE_STEP: f64 = 0.05;
const COMMIT_EVIDENCE_CAP: u32 = 3;

/// Location abbreviations accepted at 0.8 strength.
const LOCATION_ABBREVIATIONS: &[(&str, &str)] = &[
    ("sf", "san francisco"),
    ("nyc", "new york"),
    ("la", "los angeles"),
    ("atx", "austin"),
    ("pdx", "portland"),
    ("blr", "bangalore"),
    ("ldn", "london"),
];

/// Compute the weighted breakdown for one observation against the hints.
///
/// Pure and non-suspending. The Tier-1 boost is applied separately by
/// [`super::bridge::apply_tier1_boost`] after classification.
#[must_use]
pub fn compute_breakdown(hints: &EnrichedHints, observation: &ProfileObservation) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::zero();
    breakdown.bridge_weight = bridge_component(observation);
    breakdown.name_match = name_component(hints, observation);
    breakdown.handle_match = handle_component(hints, observation);
    breakdown.company_match = company_component(hints, observation);
    breakdown.location_match = location_component(hints, observation);
    breakdown.profile_completeness = completeness_component(observation);
    breakdown.recompute_total();
    breakdown
}

/// Bridge evidence: an explicit LinkedIn link is worth the full 0.40; a
/// team-page link less; commit evidence scales with match count.
fn bridge_component(observation: &ProfileObservation) -> f64 {
    let mut best: f64 = 0.0;
    let has_direct_link = observation.signals.iter().any(|s| {
        matches!(
            s,
            BridgeSignal::LinkedinUrlInBio
                | BridgeSignal::LinkedinUrlInBlog
                | BridgeSignal::LinkedinUrlInPage
                | BridgeSignal::MutualReference
        )
    });
    if has_direct_link {
        best = BRIDGE_WEIGHT_MAX;
    } else if observation
        .signals
        .contains(&BridgeSignal::LinkedinUrlInTeamPage)
    {
        best = 0.30;
    }

    if observation.commit_email_matches > 0 {
        let commit = COMMIT_EVIDENCE_BASE
            + COMMIT_EVIDENCE_STEP
                * f64::from(observation.commit_email_matches.min(COMMIT_EVIDENCE_CAP));
        best = best.max(commit);
    }

    best.min(BRIDGE_WEIGHT_MAX)
}

fn name_component(hints: &EnrichedHints, observation: &ProfileObservation) -> f64 {
    let (Some(hint_name), Some(profile_name)) =
        (hints.name.as_str(), observation.display_name.as_deref())
    else {
        return 0.0;
    };
    name_similarity(hint_name, profile_name) * NAME_WEIGHT
}

/// Handle similarity between the platform id and the slug-derived forms
/// (and the name, for concatenated logins). Only handle-shaped lookups
/// carry this weight; for plain search results the handle is whatever the
/// search engine surfaced and proves nothing.
fn handle_component(hints: &EnrichedHints, observation: &ProfileObservation) -> f64 {
    if observation.origin != crate::model::IdentityOrigin::HandleLookup {
        return 0.0;
    }
    let handle = observation.platform_id.to_lowercase();
    if handle.is_empty() {
        return 0.0;
    }
    let forms = crate::plan::handle_forms(&hints.linkedin_id);

    let strength = if handle == forms.compact || handle == forms.clean || handle == forms.raw {
        1.0
    } else {
        handle_variant_strength(&handle, &forms, hints)
    };
    strength * HANDLE_WEIGHT
}

fn handle_variant_strength(
    handle: &str,
    forms: &crate::plan::HandleForms,
    hints: &EnrichedHints,
) -> f64 {
    let name_tokens: Vec<String> = hints
        .name
        .as_str()
        .map(|n| {
            normalize(n)
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // Handle contains the whole compact form, or vice versa: near-exact.
    if !forms.compact.is_empty()
        && (handle.contains(&forms.compact) || forms.compact.contains(handle))
    {
        return 0.9;
    }

    // First+last concatenations and initial+last variants.
    if name_tokens.len() >= 2 {
        let first = &name_tokens[0];
        let last = &name_tokens[name_tokens.len() - 1];
        let joined = format!("{first}{last}");
        let reversed = format!("{last}{first}");
        let initial_last = format!("{}{last}", first.chars().take(1).collect::<String>());
        if handle == joined || handle == reversed {
            return 0.9;
        }
        if handle == initial_last {
            return 0.7;
        }
        if handle.contains(last.as_str()) && last.chars().count() >= 3 {
            if handle.contains(first.as_str()) {
                return 0.8;
            }
            return 0.5;
        }
        if handle.contains(first.as_str()) && first.chars().count() >= 3 {
            return 0.4;
        }
    }

    0.0
}

fn company_component(hints: &EnrichedHints, observation: &ProfileObservation) -> f64 {
    let Some(hint_company) = hints.company.as_str() else {
        return 0.0;
    };
    let hint_norm = normalize(hint_company);
    if hint_norm.is_empty() {
        return 0.0;
    }

    // Profile company field first, then the bio.
    let candidates = [
        observation.company.as_deref(),
        observation.bio.as_deref(),
    ];
    let mut best: f64 = 0.0;
    for candidate in candidates.into_iter().flatten() {
        let cand_norm = normalize(candidate);
        if cand_norm.is_empty() {
            continue;
        }
        if cand_norm.contains(&hint_norm) || hint_norm.contains(&cand_norm) {
            best = best.max(1.0);
        } else if token_jaccard(&hint_norm, &cand_norm) > 0.0 {
            best = best.max(0.8);
        }
    }
    best * COMPANY_WEIGHT
}

fn location_component(hints: &EnrichedHints, observation: &ProfileObservation) -> f64 {
    let (Some(hint_location), Some(profile_location)) =
        (hints.location.as_str(), observation.location.as_deref())
    else {
        return 0.0;
    };
    let hint_norm = normalize(hint_location);
    let profile_norm = normalize(profile_location);
    if hint_norm.is_empty() || profile_norm.is_empty() {
        return 0.0;
    }

    let strength = if profile_norm.contains(&hint_norm) || hint_norm.contains(&profile_norm) {
        1.0
    } else if abbreviation_match(&hint_norm, &profile_norm) {
        0.8
    } else if token_jaccard(&hint_norm, &profile_norm) > 0.0 {
        0.5
    } else {
        0.0
    };
    strength * LOCATION_WEIGHT
}

fn abbreviation_match(a: &str, b: &str) -> bool {
    LOCATION_ABBREVIATIONS.iter().any(|(abbrev, full)| {
        (a.split_whitespace().any(|t| t == *abbrev) && b.contains(full))
            || (b.split_whitespace().any(|t| t == *abbrev) && a.contains(full))
    })
}

/// Profile completeness: sub-weights 0.3 followers, 0.3 repos, 0.2 bio,
/// 0.2 company, scaled by a platform-dependent ceiling (GitHub profiles
/// expose all four axes; most platforms only some).
fn completeness_component(observation: &ProfileObservation) -> f64 {
    let mut fraction = 0.0;
    if observation.followers.unwrap_or(0) > 10 {
        fraction += 0.3;
    }
    if observation.public_repos.unwrap_or(0) > 0 {
        fraction += 0.3;
    }
    if observation.bio.as_deref().map_or(0, str::len) > 10 {
        fraction += 0.2;
    }
    if observation
        .company
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty())
    {
        fraction += 0.2;
    }
    let ceiling = if observation.platform == Platform::Github {
        0.10
    } else {
        0.05
    };
    fraction * ceiling
}
