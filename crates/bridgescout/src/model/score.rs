//! Confidence score breakdown and the discretised confidence buckets.

use serde::{Deserialize, Serialize};

/// Version tag stamped onto every breakdown this build produces.
pub const SCORING_VERSION: &str = "v3";

/// Bucket thresholds, from the final total.
pub const AUTO_MERGE_THRESHOLD: f64 = 0.90;
pub const SUGGEST_THRESHOLD: f64 = 0.70;
pub const LOW_THRESHOLD: f64 = 0.35;

/// Discretised confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    AutoMerge,
    Suggest,
    Low,
    Rejected,
}

impl ConfidenceBucket {
    /// Classify a final total into its band.
    #[must_use]
    pub fn from_total(total: f64) -> Self {
        if total >= AUTO_MERGE_THRESHOLD {
            Self::AutoMerge
        } else if total >= SUGGEST_THRESHOLD {
            Self::Suggest
        } else if total >= LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Rejected
        }
    }
}

/// Weighted confidence breakdown: six non-negative components plus the
/// clamped total.
///
/// Component maxima: bridge 0.40, name 0.30, handle 0.30, company 0.15,
/// location 0.10, completeness 0.10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub bridge_weight: f64,
    pub name_match: f64,
    pub handle_match: f64,
    pub company_match: f64,
    pub location_match: f64,
    pub profile_completeness: f64,
    /// Sum of components, clamped to `[0, 1]`, plus any Tier-1 boost.
    pub total: f64,
    /// Scoring algorithm version that produced this breakdown.
    pub scoring_version: String,
}

impl ScoreBreakdown {
    /// Zeroed breakdown at the current scoring version.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            bridge_weight: 0.0,
            name_match: 0.0,
            handle_match: 0.0,
            company_match: 0.0,
            location_match: 0.0,
            profile_completeness: 0.0,
            total: 0.0,
            scoring_version: SCORING_VERSION.to_string(),
        }
    }

    /// Recompute `total` as the clamped component sum.
    pub fn recompute_total(&mut self) {
        let sum = self.bridge_weight
            + self.name_match
            + self.handle_match
            + self.company_match
            + self.location_match
            + self.profile_completeness;
        self.total = sum.clamp(0.0, 1.0);
    }

    /// Bucket for the current total.
    #[must_use]
    pub fn bucket(&self) -> ConfidenceBucket {
        ConfidenceBucket::from_total(self.total)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_thresholds() {
        assert_eq!(ConfidenceBucket::from_total(0.95), ConfidenceBucket::AutoMerge);
        assert_eq!(ConfidenceBucket::from_total(0.90), ConfidenceBucket::AutoMerge);
        assert_eq!(ConfidenceBucket::from_total(0.89), ConfidenceBucket::Suggest);
        assert_eq!(ConfidenceBucket::from_total(0.70), ConfidenceBucket::Suggest);
        assert_eq!(ConfidenceBucket::from_total(0.35), ConfidenceBucket::Low);
        assert_eq!(ConfidenceBucket::from_total(0.10), ConfidenceBucket::Rejected);
    }

    #[test]
    fn total_clamps_to_unit_interval() {
        let mut breakdown = ScoreBreakdown::zero();
        breakdown.bridge_weight = 0.40;
        breakdown.name_match = 0.30;
        breakdown.handle_match = 0.30;
        breakdown.company_match = 0.15;
        breakdown.recompute_total();
        assert_eq!(breakdown.total, 1.0);
    }
}
