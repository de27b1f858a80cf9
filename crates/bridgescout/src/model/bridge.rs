//! Bridge evidence: signals linking a LinkedIn seed to a platform profile,
//! and the tier classification gating auto-merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A detected piece of bridge evidence.
///
/// Ordering matters only for stable serialization of signal sets; the tier
/// rules themselves are expressed over membership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BridgeSignal {
    /// LinkedIn URL found in the platform profile bio field.
    LinkedinUrlInBio,
    /// LinkedIn URL found in the profile's blog/website field.
    LinkedinUrlInBlog,
    /// LinkedIn URL found in the body of a page owned by the profile.
    LinkedinUrlInPage,
    /// LinkedIn URL found on a company team page naming the person.
    LinkedinUrlInTeamPage,
    /// A reverse-link result corroborated a company or location hint.
    ReverseLinkHintMatch,
    /// Commit metadata ties a company domain to the profile.
    CommitEmailDomain,
    /// Same handle observed on another already-linked platform.
    CrossPlatformHandle,
    /// The two profiles reference each other.
    MutualReference,
    /// Profile links a domain whose ownership is verified.
    VerifiedDomain,
    /// A public page exposes a matching contact address.
    EmailInPublicPage,
    /// Seed appears on a conference speakers page with the profile.
    ConferenceSpeaker,
    /// Explicit absence marker; a set of just `None` means no evidence.
    None,
}

impl BridgeSignal {
    /// Signals that on their own establish Tier 1.
    pub const TIER1: [BridgeSignal; 4] = [
        BridgeSignal::LinkedinUrlInBio,
        BridgeSignal::LinkedinUrlInBlog,
        BridgeSignal::LinkedinUrlInPage,
        BridgeSignal::MutualReference,
    ];

    /// Signals that establish Tier 2 when no Tier-1 signal is present.
    pub const TIER2: [BridgeSignal; 7] = [
        BridgeSignal::LinkedinUrlInTeamPage,
        BridgeSignal::ReverseLinkHintMatch,
        BridgeSignal::CommitEmailDomain,
        BridgeSignal::CrossPlatformHandle,
        BridgeSignal::VerifiedDomain,
        BridgeSignal::EmailInPublicPage,
        BridgeSignal::ConferenceSpeaker,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedinUrlInBio => "linkedin_url_in_bio",
            Self::LinkedinUrlInBlog => "linkedin_url_in_blog",
            Self::LinkedinUrlInPage => "linkedin_url_in_page",
            Self::LinkedinUrlInTeamPage => "linkedin_url_in_team_page",
            Self::ReverseLinkHintMatch => "reverse_link_hint_match",
            Self::CommitEmailDomain => "commit_email_domain",
            Self::CrossPlatformHandle => "cross_platform_handle",
            Self::MutualReference => "mutual_reference",
            Self::VerifiedDomain => "verified_domain",
            Self::EmailInPublicPage => "email_in_public_page",
            Self::ConferenceSpeaker => "conference_speaker",
            Self::None => "none",
        }
    }

    /// True for signals that count as explicit bridge evidence (everything
    /// except the absence marker).
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for BridgeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bridge tier: 1 auto-merge eligible, 2 human review, 3 speculative.
///
/// Serialized as its numeric value, matching the `smallint` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum BridgeTier {
    Tier1,
    Tier2,
    Tier3,
}

impl From<BridgeTier> for u8 {
    fn from(tier: BridgeTier) -> u8 {
        tier.as_u8()
    }
}

impl TryFrom<u8> for BridgeTier {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Tier1),
            2 => Ok(Self::Tier2),
            3 => Ok(Self::Tier3),
            other => Err(format!("bridge tier out of range: {other}")),
        }
    }
}

impl BridgeTier {
    /// Numeric tier, 1..=3.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Tier-indexed confidence floor.
    #[must_use]
    pub fn confidence_floor(&self) -> f64 {
        match self {
            Self::Tier1 => 0.85,
            Self::Tier2 => 0.50,
            Self::Tier3 => 0.0,
        }
    }

    /// Only Tier 1 is auto-merge eligible.
    #[must_use]
    pub fn auto_merge_eligible(&self) -> bool {
        matches!(self, Self::Tier1)
    }
}

impl fmt::Display for BridgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// The outcome of bridge classification for one identity candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeDetection {
    /// Assigned tier.
    pub tier: BridgeTier,
    /// Detected signal set (sorted for stable serialization).
    pub signals: BTreeSet<BridgeSignal>,
    /// URL of the bridging page, when one exists.
    pub bridge_url: Option<String>,
    /// Floor implied by the tier.
    pub confidence_floor: f64,
    /// Tier-1 only.
    pub auto_merge_eligible: bool,
    /// True when the signal set contained only the absence marker.
    pub had_no_signals: bool,
}

impl BridgeDetection {
    /// True when any signal in the set is explicit evidence.
    #[must_use]
    pub fn has_explicit_signal(&self) -> bool {
        self.signals.iter().any(BridgeSignal::is_explicit)
    }
}
