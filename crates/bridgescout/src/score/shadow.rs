//! Shadow dynamic scorer.
//!
//! Recomputes the match components with each weight multiplied by its hint
//! confidence. Runs alongside the static scorer for observability only; it
//! never affects persistence or ranking.

use super::profile::ProfileObservation;
use crate::model::{ConfidenceBucket, EnrichedHints, ScoreBreakdown};

/// Shadow result for one identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowScore {
    pub total: f64,
    pub bucket: ConfidenceBucket,
}

/// Compute the shadow score from an already-computed static breakdown.
///
/// The bridge, handle and completeness components are confidence-free and
/// carry over unchanged; name, company and location are scaled by their
/// hint confidences.
#[must_use]
pub fn compute_shadow(
    hints: &EnrichedHints,
    _observation: &ProfileObservation,
    breakdown: &ScoreBreakdown,
) -> ShadowScore {
    let total = (breakdown.bridge_weight
        + breakdown.name_match * hints.name.confidence
        + breakdown.handle_match
        + breakdown.company_match * hints.company.confidence
        + breakdown.location_match * hints.location.confidence
        + breakdown.profile_completeness)
        .clamp(0.0, 1.0);
    ShadowScore {
        total,
        bucket: ConfidenceBucket::from_total(total),
    }
}

/// True when the shadow bucket differs from the static one.
#[must_use]
pub fn diverges(static_breakdown: &ScoreBreakdown, shadow: &ShadowScore) -> bool {
    static_breakdown.bucket() != shadow.bucket
}
