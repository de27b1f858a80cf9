//! Property tests for the pure core: determinism, tier monotonicity,
//! persistence-gate soundness, and funnel consistency.

use proptest::prelude::*;
use std::collections::BTreeSet;

use bridgescout::hints;
use bridgescout::model::{
    BridgeSignal, BridgeTier, EnrichedHints, Hint, HintSource, IdentityOrigin, Platform, RoleType,
    ScoreBreakdown,
};
use bridgescout::score::{
    classify_bridge, compute_breakdown, decide, GateConfig, ProfileObservation,
};

const ALL_SIGNALS: [BridgeSignal; 11] = [
    BridgeSignal::LinkedinUrlInBio,
    BridgeSignal::LinkedinUrlInBlog,
    BridgeSignal::LinkedinUrlInPage,
    BridgeSignal::LinkedinUrlInTeamPage,
    BridgeSignal::ReverseLinkHintMatch,
    BridgeSignal::CommitEmailDomain,
    BridgeSignal::CrossPlatformHandle,
    BridgeSignal::MutualReference,
    BridgeSignal::VerifiedDomain,
    BridgeSignal::EmailInPublicPage,
    BridgeSignal::ConferenceSpeaker,
];

fn arb_signal() -> impl Strategy<Value = BridgeSignal> {
    prop::sample::select(ALL_SIGNALS.to_vec())
}

fn arb_signal_set() -> impl Strategy<Value = BTreeSet<BridgeSignal>> {
    prop::collection::btree_set(arb_signal(), 0..5)
}

fn arb_breakdown() -> impl Strategy<Value = ScoreBreakdown> {
    (
        0.0_f64..=0.40,
        0.0_f64..=0.30,
        0.0_f64..=0.30,
        0.0_f64..=0.15,
        0.0_f64..=0.10,
        0.0_f64..=0.10,
    )
        .prop_map(|(bridge, name, handle, company, location, completeness)| {
            let mut b = ScoreBreakdown::zero();
            b.bridge_weight = bridge;
            b.name_match = name;
            b.handle_match = handle;
            b.company_match = company;
            b.location_match = location;
            b.profile_completeness = completeness;
            b.recompute_total();
            b
        })
}

proptest! {
    /// Hint extraction is deterministic: identical inputs, identical output.
    #[test]
    fn hint_extraction_is_deterministic(
        slug in "[a-z]{2,8}-[a-z]{2,8}(-[0-9]{2,6})?",
        title in ".{0,60}",
        snippet in ".{0,60}",
    ) {
        let a = hints::extract(&slug, "https://linkedin.com/in/x", &title, &snippet, None, RoleType::General);
        let b = hints::extract(&slug, "https://linkedin.com/in/x", &title, &snippet, None, RoleType::General);
        prop_assert_eq!(a, b);
    }

    /// Extraction never produces out-of-range confidences.
    #[test]
    fn hint_confidences_stay_in_unit_interval(
        slug in "[a-z-]{0,20}",
        title in ".{0,80}",
        snippet in ".{0,80}",
    ) {
        let extracted = hints::extract(&slug, "https://linkedin.com/in/x", &title, &snippet, None, RoleType::General);
        for hint in [&extracted.name, &extracted.headline, &extracted.location, &extracted.company] {
            prop_assert!((0.0..=1.0).contains(&hint.confidence));
        }
    }

    /// Scoring is deterministic and clamped.
    #[test]
    fn scoring_is_deterministic(
        display_name in ".{0,30}",
        company in ".{0,20}",
        signals in arb_signal_set(),
    ) {
        let mut seed = EnrichedHints::empty("jane-doe", "https://linkedin.com/in/jane-doe");
        seed.name = Hint::present("Jane Doe", 0.9, HintSource::SerpTitle);
        seed.company = Hint::present("Acme", 0.9, HintSource::HeadlineParse);

        let mut observation = ProfileObservation::new(
            Platform::Github,
            "janedoe",
            "https://github.com/janedoe",
            IdentityOrigin::HandleLookup,
        );
        observation.display_name = Some(display_name);
        observation.company = Some(company);
        observation.signals = signals;

        let a = compute_breakdown(&seed, &observation);
        let b = compute_breakdown(&seed, &observation);
        prop_assert_eq!(a.clone(), b);
        prop_assert!((0.0..=1.0).contains(&a.total));
    }

    /// Adding a Tier-1 signal never worsens the tier; classification of the
    /// same set is stable.
    #[test]
    fn tier_is_monotone_under_tier1_signals(signals in arb_signal_set()) {
        let base = classify_bridge(&signals, None).tier;
        for tier1_signal in [
            BridgeSignal::LinkedinUrlInBio,
            BridgeSignal::LinkedinUrlInBlog,
            BridgeSignal::LinkedinUrlInPage,
            BridgeSignal::MutualReference,
        ] {
            let mut upgraded = signals.clone();
            upgraded.insert(tier1_signal);
            let tier = classify_bridge(&upgraded, None).tier;
            prop_assert!(tier <= base, "adding {:?} went {:?} -> {:?}", tier1_signal, base, tier);
        }
    }

    /// Removing every signal yields Tier 3.
    #[test]
    fn empty_signals_are_tier3(_unit in 0..1_i32) {
        let bridge = classify_bridge(&BTreeSet::new(), None);
        prop_assert_eq!(bridge.tier, BridgeTier::Tier3);
        prop_assert!(bridge.had_no_signals);
    }

    /// Persistence-gate soundness: every persisted Tier-3 identity satisfies
    /// the documented conjunction, every rejection matches a stated rule.
    #[test]
    fn persistence_gate_soundness(
        breakdown in arb_breakdown(),
        signals in arb_signal_set(),
        tier2_used in 0_u32..5,
        platform in prop::sample::select(vec![Platform::Github, Platform::Npm, Platform::Medium]),
    ) {
        let config = GateConfig::default();
        let bridge = classify_bridge(&signals, None);
        let decision = decide(platform, &breakdown, &bridge, tier2_used, &config);

        match (&decision, bridge.tier) {
            (d, BridgeTier::Tier1) if d.is_persist() => {}
            (_, BridgeTier::Tier1) => {
                // Only the GitHub name-only guard may reject a Tier-1.
                prop_assert_eq!(platform, Platform::Github);
                prop_assert!(breakdown.bridge_weight == 0.0 && breakdown.handle_match < 0.20);
            }
            (d, BridgeTier::Tier2) if d.is_persist() => {
                prop_assert!(tier2_used < config.tier2_cap);
            }
            (d, BridgeTier::Tier3) if d.is_persist() => {
                prop_assert!(breakdown.total >= config.min_confidence);
                let supported = breakdown.bridge_weight > 0.0
                    || breakdown.handle_match >= 0.20
                    || (breakdown.name_match >= 0.15
                        && (breakdown.company_match > 0.0 || breakdown.location_match > 0.0));
                prop_assert!(supported);
            }
            _ => {}
        }
    }
}
