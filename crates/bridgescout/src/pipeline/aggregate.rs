//! Scoring, deterministic ordering, and gating of collected observations.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::model::{
    EnrichedHints, EvidenceType, IdentityCandidate, IdentityStatus, Platform,
};
use crate::score::{
    apply_tier1_boost, classify_bridge, compute_breakdown, compute_shadow, decide,
    detect_contradiction, diverges, GateConfig, PersistDecision, ProfileObservation,
};
use crate::trace::TraceBuilder;

/// A scored identity together with its gate decision.
#[derive(Debug, Clone)]
pub struct GatedIdentity {
    pub identity: IdentityCandidate,
    pub decision: PersistDecision,
}

/// Merge duplicate observations of the same `(platform, platform_id)`,
/// unioning signals and evidence and keeping the richer profile fields.
#[must_use]
pub fn merge_observations(observations: Vec<ProfileObservation>) -> Vec<ProfileObservation> {
    let mut merged: BTreeMap<(Platform, String), ProfileObservation> = BTreeMap::new();
    for obs in observations {
        let key = (obs.platform, obs.platform_id.clone());
        match merged.get_mut(&key) {
            None => {
                merged.insert(key, obs);
            }
            Some(existing) => {
                existing.signals.extend(obs.signals.iter().copied());
                existing.evidence.extend(obs.evidence.clone());
                if existing.display_name.is_none() {
                    existing.display_name = obs.display_name;
                }
                if existing.bio.is_none() {
                    existing.bio = obs.bio;
                }
                if existing.blog.is_none() {
                    existing.blog = obs.blog;
                }
                if existing.company.is_none() {
                    existing.company = obs.company;
                }
                if existing.location.is_none() {
                    existing.location = obs.location;
                }
                if existing.followers.is_none() {
                    existing.followers = obs.followers;
                }
                if existing.public_repos.is_none() {
                    existing.public_repos = obs.public_repos;
                }
                existing.commit_email_matches =
                    existing.commit_email_matches.max(obs.commit_email_matches);
                if existing.serp_position.is_none() {
                    existing.serp_position = obs.serp_position;
                }
            }
        }
    }
    merged.into_values().collect()
}

/// Score one observation into a full identity candidate.
#[must_use]
pub fn score_observation(
    hints: &EnrichedHints,
    observation: &ProfileObservation,
    tenant_id: &str,
    candidate_id: &str,
    session_id: &str,
    now: DateTime<Utc>,
    trace: &mut TraceBuilder,
) -> IdentityCandidate {
    let mut breakdown = compute_breakdown(hints, observation);

    let bridge_url = observation
        .evidence
        .iter()
        .find(|e| {
            matches!(
                e.evidence_type,
                EvidenceType::ProfileBio
                    | EvidenceType::ProfileBlog
                    | EvidenceType::PageMention
                    | EvidenceType::TeamPage
            )
        })
        .map(|e| e.url.clone());
    let bridge = classify_bridge(&observation.signals, bridge_url);

    let contradiction = detect_contradiction(hints, observation, &bridge);
    apply_tier1_boost(&mut breakdown, &bridge, contradiction.detected);

    // Shadow scoring rides along for observability only.
    let shadow = compute_shadow(hints, observation, &breakdown);
    let shadow_stats = trace.shadow_mut();
    shadow_stats.scored += 1;
    let delta = (shadow.total - breakdown.total).abs();
    let scored = f64::from(shadow_stats.scored);
    shadow_stats.mean_abs_delta =
        shadow_stats.mean_abs_delta * ((scored - 1.0) / scored) + delta / scored;
    if diverges(&breakdown, &shadow) {
        shadow_stats.bucket_divergences += 1;
    }

    let confidence = breakdown.total;
    let bucket = breakdown.bucket();

    IdentityCandidate {
        tenant_id: tenant_id.to_string(),
        candidate_id: candidate_id.to_string(),
        platform: observation.platform,
        platform_id: observation.platform_id.clone(),
        profile_url: observation.profile_url.clone(),
        confidence,
        confidence_bucket: bucket,
        score_breakdown: breakdown,
        evidence: observation.evidence.clone(),
        has_contradiction: contradiction.detected,
        contradiction_note: contradiction.note,
        bridge_tier: bridge.tier,
        bridge_signals: bridge.signals.clone(),
        persist_reason: String::new(),
        discovered_by: session_id.to_string(),
        status: IdentityStatus::Unconfirmed,
        origin: observation.origin,
        serp_position: observation.serp_position,
        created_at: now,
        updated_at: now,
    }
}

/// Deterministic ordering: tier ascending, confidence descending rounded to
/// 0.01, SERP position ascending (absent positions last), then platform and
/// id as the final stable key.
pub fn sort_identities(identities: &mut [IdentityCandidate]) {
    identities.sort_by(|a, b| {
        a.bridge_tier
            .cmp(&b.bridge_tier)
            .then_with(|| b.confidence_rounded().cmp(&a.confidence_rounded()))
            .then_with(|| {
                a.serp_position
                    .unwrap_or(u32::MAX)
                    .cmp(&b.serp_position.unwrap_or(u32::MAX))
            })
            .then_with(|| a.platform.cmp(&b.platform))
            .then_with(|| a.platform_id.cmp(&b.platform_id))
    });
}

/// Run the funnel over sorted identities: min-confidence filter, then the
/// persistence gate with the global Tier-2 cap.
#[must_use]
pub fn gate_identities(
    mut identities: Vec<IdentityCandidate>,
    gate: &GateConfig,
    trace: &mut TraceBuilder,
) -> Vec<GatedIdentity> {
    sort_identities(&mut identities);

    let mut out = Vec::with_capacity(identities.len());
    let mut tier2_used = 0_u32;

    for mut identity in identities {
        trace.funnel_mut().identities_found_total += 1;
        trace.observe_confidence(identity.confidence);

        // Tier 1 and 2 carry their own evidence; Tier 3 must clear the
        // minimum confidence to even reach the gate.
        let above_min = identity.bridge_tier != crate::model::BridgeTier::Tier3
            || identity.confidence >= gate.min_confidence;
        if !above_min {
            continue;
        }
        trace.funnel_mut().above_min_confidence += 1;

        let decision = decide(
            identity.platform,
            &identity.score_breakdown,
            &classify_bridge(&identity.bridge_signals, None),
            tier2_used,
            gate,
        );

        if decision.is_persist() {
            trace.funnel_mut().passing_persist_guard += 1;
            if identity.bridge_tier == crate::model::BridgeTier::Tier2 {
                tier2_used += 1;
            }
            identity.persist_reason = decision.reason().to_string();
        }
        out.push(GatedIdentity { identity, decision });
    }

    out
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BridgeSignal, BridgeTier, ConfidenceBucket, IdentityOrigin, ScoreBreakdown};
    use crate::model::EnrichedHints;
    use std::collections::BTreeSet;

    fn hints() -> EnrichedHints {
        EnrichedHints::empty("jane-doe", "https://linkedin.com/in/jane-doe")
    }

    fn identity(
        platform: Platform,
        id: &str,
        tier: BridgeTier,
        confidence: f64,
        serp: Option<u32>,
    ) -> IdentityCandidate {
        let now = Utc::now();
        let mut breakdown = ScoreBreakdown::zero();
        if tier == BridgeTier::Tier1 {
            breakdown.bridge_weight = 0.40;
        }
        breakdown.total = confidence;
        IdentityCandidate {
            tenant_id: "t1".into(),
            candidate_id: "c1".into(),
            platform,
            platform_id: id.into(),
            profile_url: format!("https://example.com/{id}"),
            confidence,
            confidence_bucket: ConfidenceBucket::from_total(confidence),
            score_breakdown: breakdown,
            evidence: Vec::new(),
            has_contradiction: false,
            contradiction_note: None,
            bridge_tier: tier,
            bridge_signals: match tier {
                BridgeTier::Tier1 => [BridgeSignal::LinkedinUrlInBio].into_iter().collect(),
                BridgeTier::Tier2 => [BridgeSignal::ConferenceSpeaker].into_iter().collect(),
                BridgeTier::Tier3 => BTreeSet::new(),
            },
            persist_reason: String::new(),
            discovered_by: "s1".into(),
            status: IdentityStatus::Unconfirmed,
            origin: IdentityOrigin::PlatformSearch,
            serp_position: serp,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sort_breaks_ties_deterministically() {
        let mut rows = vec![
            identity(Platform::Medium, "m", BridgeTier::Tier2, 0.80, Some(3)),
            identity(Platform::Github, "g1", BridgeTier::Tier1, 0.70, Some(2)),
            identity(Platform::Github, "g2", BridgeTier::Tier1, 0.70, Some(1)),
            identity(Platform::Npm, "n", BridgeTier::Tier3, 0.95, None),
        ];
        sort_identities(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|r| r.platform_id.as_str()).collect();
        // Tier 1 first; equal tier+confidence falls back to SERP position.
        assert_eq!(ids, vec!["g2", "g1", "m", "n"]);
    }

    #[test]
    fn rounding_makes_near_ties_fall_to_serp_position() {
        let mut rows = vec![
            identity(Platform::Github, "a", BridgeTier::Tier3, 0.701, Some(5)),
            identity(Platform::Github, "b", BridgeTier::Tier3, 0.699, Some(1)),
        ];
        sort_identities(&mut rows);
        // 0.701 and 0.699 both round to 0.70; position 1 wins.
        assert_eq!(rows[0].platform_id, "b");
    }

    #[test]
    fn funnel_counts_narrow_monotonically() {
        let mut trace = TraceBuilder::new("c1", hints());
        let rows = vec![
            identity(Platform::Github, "strong", BridgeTier::Tier1, 0.95, Some(1)),
            identity(Platform::Npm, "weak", BridgeTier::Tier3, 0.10, Some(2)),
            identity(Platform::Medium, "mid", BridgeTier::Tier2, 0.60, Some(3)),
        ];
        let gated = gate_identities(rows, &GateConfig::default(), &mut trace);
        let trace = trace.finish();
        let funnel = trace.totals.funnel;
        assert_eq!(funnel.identities_found_total, 3);
        assert_eq!(funnel.above_min_confidence, 2);
        assert!(funnel.is_consistent());
        assert_eq!(gated.iter().filter(|g| g.decision.is_persist()).count(), 2);
    }

    #[test]
    fn tier2_cap_applies_in_sorted_order() {
        let mut trace = TraceBuilder::new("c1", hints());
        let rows = (0..5)
            .map(|i| {
                identity(
                    Platform::Medium,
                    &format!("m{i}"),
                    BridgeTier::Tier2,
                    0.80 - f64::from(i) * 0.05,
                    Some(i + 1),
                )
            })
            .collect::<Vec<_>>();
        let gated = gate_identities(rows, &GateConfig::default(), &mut trace);

        let persisted: Vec<&str> = gated
            .iter()
            .filter(|g| g.decision.is_persist())
            .map(|g| g.identity.platform_id.as_str())
            .collect();
        // Highest-confidence three survive the global cap.
        assert_eq!(persisted, vec!["m0", "m1", "m2"]);

        let dropped: Vec<&str> = gated
            .iter()
            .filter(|g| !g.decision.is_persist())
            .map(|g| g.decision.reason())
            .collect();
        assert!(dropped.iter().all(|r| r == &"Cap exceeded (3/3)"));
    }
}
