//! Scoring and bridge classification.
//!
//! Pure, non-suspending, deterministic: the same hints and observation
//! always produce bit-identical breakdowns, tiers and buckets. The pipeline
//! composes these pieces in a fixed order:
//!
//! 1. [`compute_breakdown`] — six weighted components, clamped total
//! 2. [`classify_bridge`] — signal set → tier, floor, auto-merge flag
//! 3. [`detect_contradiction`] — metadata only, never changes the tier
//! 4. [`apply_tier1_boost`] — strict Tier-1 +0.08, before bucketing
//! 5. [`decide`] — the persistence gate
//! 6. [`compute_shadow`] — observability-only dynamic rescoring

mod bridge;
mod contradiction;
mod gate;
mod normalize;
mod profile;
mod scorer;
mod shadow;

pub use bridge::{apply_tier1_boost, classify_bridge, is_strict_tier1, TIER1_BOOST};
pub use contradiction::{detect_contradiction, Contradiction};
pub use gate::{
    decide, GateConfig, PersistDecision, DEFAULT_MIN_CONFIDENCE, DEFAULT_TIER2_CAP,
};
pub use normalize::{name_similarity, normalize, token_jaccard, token_set};
pub use profile::ProfileObservation;
pub use scorer::{
    compute_breakdown, BRIDGE_WEIGHT_MAX, COMPANY_WEIGHT, HANDLE_WEIGHT, LOCATION_WEIGHT,
    NAME_WEIGHT,
};
pub use shadow::{compute_shadow, diverges, ShadowScore};
