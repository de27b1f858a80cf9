//! The URL-anchored reverse-link pass.
//!
//! Before any platform fan-out, search the open web for pages that link
//! back to the seed's LinkedIn profile. A page that both mentions the
//! profile and routes to a platform identity is the strongest evidence the
//! engine can find without touching LinkedIn itself.

use std::collections::BTreeSet;
use tracing::debug;

use crate::model::{BridgeSignal, EnrichedHints, Platform, Query};
use crate::score::normalize;
use crate::search::{SearchError, SearchExecutor};
use crate::sources::{iterative_decode, route_url, text_mentions_profile};
use crate::trace::TraceBuilder;

/// Markers identifying conference/speaker pages.
const SPEAKER_MARKERS: &[&str] = &["speaker", "conference", "summit", "keynote", "talks"];

/// One platform identity surfaced by the reverse-link pass.
#[derive(Debug, Clone)]
pub struct ReverseLinkFinding {
    pub platform: Platform,
    pub platform_id: String,
    /// Profile URL implied by the routed result.
    pub profile_url: String,
    /// The page the mention was found on.
    pub bridge_url: String,
    /// Signals derived from the mention context.
    pub signals: BTreeSet<BridgeSignal>,
    /// SERP position of the hit.
    pub serp_position: u32,
}

/// Result of the pass.
#[derive(Debug, Default)]
pub struct ReverseLinkOutcome {
    pub findings: Vec<ReverseLinkFinding>,
    pub queries_executed: u32,
    pub rate_limited: bool,
}

fn is_speaker_page(text: &str) -> bool {
    let lower = text.to_lowercase();
    SPEAKER_MARKERS.iter().any(|m| lower.contains(m))
}

/// True when the result text corroborates a company or location hint.
fn corroborates_hints(text: &str, hints: &EnrichedHints) -> bool {
    let norm = normalize(text);
    let token_present = |hint: &crate::model::Hint| {
        hint.as_str().is_some_and(|value| {
            let hint_norm = normalize(value);
            !hint_norm.is_empty()
                && hint_norm
                    .split_whitespace()
                    .any(|token| token.len() >= 3 && norm.contains(token))
        })
    };
    token_present(&hints.company) || token_present(&hints.location)
}

/// Run the reverse-link pass over pre-planned queries.
///
/// `queries` must already be budget-truncated; the pass issues them in
/// order through the merged web search and never exceeds them.
pub async fn reverse_link_pass(
    executor: &SearchExecutor,
    hints: &EnrichedHints,
    queries: &[Query],
    trace: &mut TraceBuilder,
) -> ReverseLinkOutcome {
    let mut outcome = ReverseLinkOutcome::default();
    let mut seen: BTreeSet<(Platform, String)> = BTreeSet::new();

    for query in queries {
        outcome.queries_executed += 1;
        trace.record_executed(&query.variant_id, 1);

        let hits = match executor.search_web(&query.text, 10).await {
            Ok((provider, hits)) => {
                trace.note_provider(&provider);
                hits
            }
            Err(err) => {
                if matches!(err, SearchError::RateLimited { .. }) {
                    outcome.rate_limited = true;
                }
                debug!(query = %query.text, error = %err, "reverse-link query failed");
                continue;
            }
        };

        let platform_trace = trace.platform(Platform::Web);
        platform_trace.queries_executed += 1;
        platform_trace.raw_results += hits.len() as u32;

        for hit in hits {
            // Normalize and iteratively decode everything the engine will
            // inspect; search engines double-encode redirect targets.
            let haystack = format!("{} {} {}", hit.title, hit.snippet, hit.url);
            let decoded = iterative_decode(&haystack);

            if !text_mentions_profile(&decoded, &hints.linkedin_id) {
                trace.platform(Platform::Web).sample_unmatched_url(&hit.url);
                continue;
            }

            let Some((platform, platform_id)) = route_url(&hit.url) else {
                trace.platform(Platform::Web).sample_unmatched_url(&hit.url);
                continue;
            };

            if !seen.insert((platform, platform_id.clone())) {
                continue;
            }
            trace.platform(Platform::Web).matched_results += 1;

            let mut signals = BTreeSet::new();
            if platform == Platform::CompanyTeam {
                signals.insert(BridgeSignal::LinkedinUrlInTeamPage);
            } else {
                signals.insert(BridgeSignal::LinkedinUrlInPage);
            }
            if is_speaker_page(&decoded) {
                signals.insert(BridgeSignal::ConferenceSpeaker);
            }
            if corroborates_hints(&decoded, hints) {
                signals.insert(BridgeSignal::ReverseLinkHintMatch);
            }

            outcome.findings.push(ReverseLinkFinding {
                platform,
                platform_id,
                profile_url: hit.url.clone(),
                bridge_url: hit.url.clone(),
                signals,
                serp_position: hit.position,
            });
        }
    }

    outcome
}
