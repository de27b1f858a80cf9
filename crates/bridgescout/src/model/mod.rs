//! Core data model: hints, queries, platforms, bridge evidence, scores,
//! identity candidates, sessions, and the enrichment budget.
//!
//! Everything here is plain data. The dynamic records of the upstream
//! service are modeled as sum types with explicit variants so that illegal
//! states (an unknown bridge signal, a tier outside 1..=3) are unrepresentable.

mod bridge;
mod budget;
mod candidate;
mod hint;
mod identity;
mod platform;
mod query;
mod score;
mod session;

pub use bridge::{BridgeDetection, BridgeSignal, BridgeTier};
pub use budget::EnrichmentBudget;
pub use candidate::{Candidate, EnrichmentStatus};
pub use hint::{EnrichedHints, Hint, HintSource, RoleType};
pub use identity::{
    Evidence, EvidenceType, IdentityCandidate, IdentityOrigin, IdentityStatus,
};
pub use platform::Platform;
pub use query::{dedup_and_truncate, Query, QueryType};
pub use score::{ConfidenceBucket, ScoreBreakdown, SCORING_VERSION};
pub use session::{EarlyStopReason, EnrichmentSession, JobType, SessionStatus};
