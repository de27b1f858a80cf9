//! Bridge-tier classification and the strict-Tier-1 boost.

use std::collections::BTreeSet;

use crate::model::{BridgeDetection, BridgeSignal, BridgeTier, ScoreBreakdown};

/// Additive boost for a strict Tier-1 match, applied after total
/// computation and before bucket classification.
pub const TIER1_BOOST: f64 = 0.08;

/// Classify a signal set into a bridge detection. Deterministic,
/// first rule wins:
///
/// 1. any Tier-1 signal → Tier 1 (floor 0.85, auto-merge eligible)
/// 2. any Tier-2 signal → Tier 2 (floor 0.50)
/// 3. otherwise → Tier 3 (floor 0.00)
///
/// One refinement to rule 1: a bare page mention
/// (`LinkedinUrlInPage`) whose set also carries a third-party-page marker
/// (`ConferenceSpeaker` or `LinkedinUrlInTeamPage`) came from a page the
/// profile does not own — that combination classifies Tier 2. Bio, blog
/// and mutual-reference signals are Tier 1 unconditionally.
#[must_use]
pub fn classify_bridge(
    signals: &BTreeSet<BridgeSignal>,
    bridge_url: Option<String>,
) -> BridgeDetection {
    let had_no_signals =
        signals.is_empty() || signals.iter().all(|s| matches!(s, BridgeSignal::None));

    let owned_tier1 = signals.iter().any(|s| {
        matches!(
            s,
            BridgeSignal::LinkedinUrlInBio
                | BridgeSignal::LinkedinUrlInBlog
                | BridgeSignal::MutualReference
        )
    });
    let third_party_page = signals.contains(&BridgeSignal::ConferenceSpeaker)
        || signals.contains(&BridgeSignal::LinkedinUrlInTeamPage);
    let page_mention_tier1 =
        signals.contains(&BridgeSignal::LinkedinUrlInPage) && !third_party_page;

    let tier = if owned_tier1 || page_mention_tier1 {
        BridgeTier::Tier1
    } else if signals.contains(&BridgeSignal::LinkedinUrlInPage)
        || signals.iter().any(|s| BridgeSignal::TIER2.contains(s))
    {
        BridgeTier::Tier2
    } else {
        BridgeTier::Tier3
    };

    let mut stored = signals.clone();
    if stored.is_empty() {
        stored.insert(BridgeSignal::None);
    }

    BridgeDetection {
        tier,
        signals: stored,
        bridge_url,
        confidence_floor: tier.confidence_floor(),
        auto_merge_eligible: tier.auto_merge_eligible(),
        had_no_signals,
    }
}

/// True for a strict Tier-1 detection: Tier 1 without a team-page downgrade
/// signal in the set.
#[must_use]
pub fn is_strict_tier1(bridge: &BridgeDetection) -> bool {
    bridge.tier == BridgeTier::Tier1
        && !bridge
            .signals
            .contains(&BridgeSignal::LinkedinUrlInTeamPage)
}

/// Apply the +0.08 strict-Tier-1 boost to a computed breakdown.
///
/// Suppressed when a contradiction is present; never pushes the total
/// past 1.0. Returns true when the boost was applied.
pub fn apply_tier1_boost(
    breakdown: &mut ScoreBreakdown,
    bridge: &BridgeDetection,
    has_contradiction: bool,
) -> bool {
    if has_contradiction || !is_strict_tier1(bridge) {
        return false;
    }
    breakdown.total = (breakdown.total + TIER1_BOOST).min(1.0);
    true
}
