//! The persistence gate: which scored identities get written.

use crate::model::{BridgeDetection, BridgeTier, ConfidenceBucket, Platform, ScoreBreakdown};

/// Default minimum total for Tier-3 persistence.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;
/// Default global Tier-2 cap per run.
pub const DEFAULT_TIER2_CAP: u32 = 3;
/// Handle-match floor used by the Tier-3 conjunction and the GitHub guard.
const HANDLE_MATCH_FLOOR: f64 = 0.20;
/// Name-match floor used by the Tier-3 conjunction.
const NAME_MATCH_FLOOR: f64 = 0.15;

/// Gate configuration, frozen per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    /// Minimum total for a Tier-3 identity.
    pub min_confidence: f64,
    /// Global Tier-2 cap across the run.
    pub tier2_cap: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            tier2_cap: DEFAULT_TIER2_CAP,
        }
    }
}

/// Outcome of the gate for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistDecision {
    /// Write the identity, with the recorded reason.
    Persist { reason: String },
    /// Drop it, with the recorded reason.
    Drop { reason: String },
}

impl PersistDecision {
    /// True for the persist arm.
    #[must_use]
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }

    /// The reason string, either way.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Persist { reason } | Self::Drop { reason } => reason,
        }
    }
}

/// Decide whether one scored identity is written.
///
/// `tier2_used` is the number of Tier-2 identities already persisted in
/// this run; the cap is global across platforms.
#[must_use]
pub fn decide(
    platform: Platform,
    breakdown: &ScoreBreakdown,
    bridge: &BridgeDetection,
    tier2_used: u32,
    config: &GateConfig,
) -> PersistDecision {
    // Platform guard first: a GitHub match with no bridge evidence and a
    // weak handle must corroborate on company or location, otherwise it is
    // a name-only false positive.
    if platform == Platform::Github
        && breakdown.bridge_weight == 0.0
        && breakdown.handle_match < HANDLE_MATCH_FLOOR
        && breakdown.company_match <= 0.0
        && breakdown.location_match <= 0.0
    {
        return PersistDecision::Drop {
            reason: "GitHub name-only match without company or location corroboration"
                .to_string(),
        };
    }

    match bridge.tier {
        BridgeTier::Tier1 => {
            let bucket = ConfidenceBucket::from_total(breakdown.total);
            let eligible = if bucket == ConfidenceBucket::AutoMerge {
                "auto-merge eligible"
            } else {
                "auto-merge eligible, below threshold"
            };
            PersistDecision::Persist {
                reason: format!(
                    "Tier-1 bridge, {eligible} (confidence {:.2})",
                    breakdown.total
                ),
            }
        }
        BridgeTier::Tier2 => {
            if tier2_used >= config.tier2_cap {
                PersistDecision::Drop {
                    reason: format!("Cap exceeded ({}/{})", config.tier2_cap, config.tier2_cap),
                }
            } else {
                PersistDecision::Persist {
                    reason: format!(
                        "Tier-2 signals, human review (confidence {:.2})",
                        breakdown.total
                    ),
                }
            }
        }
        BridgeTier::Tier3 => {
            if breakdown.total < config.min_confidence {
                return PersistDecision::Drop {
                    reason: format!(
                        "Below minimum confidence ({:.2} < {:.2})",
                        breakdown.total, config.min_confidence
                    ),
                };
            }
            let has_secondary =
                breakdown.company_match > 0.0 || breakdown.location_match > 0.0;
            let supported = breakdown.bridge_weight > 0.0
                || breakdown.handle_match >= HANDLE_MATCH_FLOOR
                || (breakdown.name_match >= NAME_MATCH_FLOOR && has_secondary);
            if supported {
                PersistDecision::Persist {
                    reason: format!(
                        "Tier-3 speculative match with supporting signal (confidence {:.2})",
                        breakdown.total
                    ),
                }
            } else {
                PersistDecision::Drop {
                    reason: "Tier-3 match without supporting signal".to_string(),
                }
            }
        }
    }
}
