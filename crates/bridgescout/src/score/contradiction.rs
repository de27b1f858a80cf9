//! Contradiction detection.
//!
//! A contradiction never changes the tier; it rides along as metadata
//! (and suppresses the strict-Tier-1 boost).

use super::normalize::name_similarity;
use super::profile::ProfileObservation;
use crate::hints::country_code_for_location;
use crate::model::{BridgeDetection, EnrichedHints};

/// Name similarity below this, combined with explicit bridge evidence,
/// is contradictory.
const NAME_CONTRADICTION_THRESHOLD: f64 = 0.20;

/// Result of the contradiction check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contradiction {
    pub detected: bool,
    /// Human-readable note for the review inbox.
    pub note: Option<String>,
}

/// Detect contradictions between the hints and an observed profile.
///
/// Two rules:
/// - a profile with an explicit bridge signal whose display name is
///   dissimilar to the hinted name (similarity < 0.20);
/// - hint and profile locations resolving to two different country codes.
#[must_use]
pub fn detect_contradiction(
    hints: &EnrichedHints,
    observation: &ProfileObservation,
    bridge: &BridgeDetection,
) -> Contradiction {
    if bridge.has_explicit_signal() {
        if let (Some(hint_name), Some(profile_name)) =
            (hints.name.as_str(), observation.display_name.as_deref())
        {
            let similarity = name_similarity(hint_name, profile_name);
            if similarity < NAME_CONTRADICTION_THRESHOLD {
                return Contradiction {
                    detected: true,
                    note: Some(format!(
                        "Bridge evidence present but names disagree: \
                         seed says \"{hint_name}\", profile says \"{profile_name}\""
                    )),
                };
            }
        }
    }

    if let (Some(hint_location), Some(profile_location)) =
        (hints.location.as_str(), observation.location.as_deref())
    {
        let hint_country = country_code_for_location(hint_location);
        let profile_country = country_code_for_location(profile_location);
        if let (Some(a), Some(b)) = (hint_country, profile_country) {
            if a != b {
                return Contradiction {
                    detected: true,
                    note: Some(format!(
                        "Locations resolve to different countries: \
                         \"{hint_location}\" ({a}) vs \"{profile_location}\" ({b})"
                    )),
                };
            }
        }
    }

    Contradiction::default()
}
