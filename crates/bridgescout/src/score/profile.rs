//! The scorer's view of a discovered platform profile.

use std::collections::BTreeSet;

use crate::model::{BridgeSignal, Evidence, IdentityOrigin, Platform};

/// Everything a platform adapter observed about one profile, before scoring.
///
/// Fields are optional because platforms expose different surfaces; the
/// scorer treats absence as zero contribution, never as a penalty.
#[derive(Debug, Clone)]
pub struct ProfileObservation {
    pub platform: Platform,
    /// Platform-scoped id (login, handle, ORCID iD, ...).
    pub platform_id: String,
    pub profile_url: String,
    /// Display name shown on the profile.
    pub display_name: Option<String>,
    pub bio: Option<String>,
    /// Blog / website field.
    pub blog: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: Option<u32>,
    pub public_repos: Option<u32>,
    /// Signals detected before scoring (reverse-link pass, bio/blog scan).
    pub signals: BTreeSet<BridgeSignal>,
    /// Evidence pointers gathered so far.
    pub evidence: Vec<Evidence>,
    /// Commit-evidence matches, when commit gathering is enabled.
    pub commit_email_matches: u32,
    /// How this profile entered the pipeline.
    pub origin: IdentityOrigin,
    /// SERP position of the hit that surfaced it.
    pub serp_position: Option<u32>,
}

impl ProfileObservation {
    /// A minimal observation for a platform id found by search.
    pub fn new(
        platform: Platform,
        platform_id: impl Into<String>,
        profile_url: impl Into<String>,
        origin: IdentityOrigin,
    ) -> Self {
        Self {
            platform,
            platform_id: platform_id.into(),
            profile_url: profile_url.into(),
            display_name: None,
            bio: None,
            blog: None,
            company: None,
            location: None,
            followers: None,
            public_repos: None,
            signals: BTreeSet::new(),
            evidence: Vec::new(),
            commit_email_matches: 0,
            origin,
            serp_position: None,
        }
    }

    /// Add a signal.
    pub fn with_signal(mut self, signal: BridgeSignal) -> Self {
        self.signals.insert(signal);
        self
    }

    /// Add an evidence pointer.
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }
}
