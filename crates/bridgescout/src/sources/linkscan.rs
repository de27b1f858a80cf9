//! Detecting LinkedIn profile mentions in free text and profile fields.

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{BridgeSignal, Evidence, EvidenceType};
use crate::plan::handle_forms;
use crate::score::ProfileObservation;

/// Maximum iterative URL-decode passes applied to search-result text.
pub const MAX_DECODE_PASSES: usize = 3;

fn linkedin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Profile paths, tolerant of scheme/www and trailing junk.
        #[allow(clippy::unwrap_used)] // static pattern
        Regex::new(r"(?i)linkedin\.com/(?:in|pub)/([A-Za-z0-9\-_.%]+)").unwrap()
    })
}

/// Percent-decode one pass; conservative, leaves invalid escapes alone.
fn decode_once(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            let hex = &s[i + 1..i + 3];
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Iteratively URL-decode up to [`MAX_DECODE_PASSES`] times, stopping early
/// at a fixed point. Search engines double-encode aggressively.
#[must_use]
pub fn iterative_decode(s: &str) -> String {
    let mut current = s.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        let decoded = decode_once(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

/// True when `text` mentions the seed's LinkedIn profile: full URL, bare
/// path, or an encoded form of either. The mentioned handle must match the
/// slug (raw or uniquifier-stripped).
#[must_use]
pub fn text_mentions_profile(text: &str, linkedin_slug: &str) -> bool {
    let decoded = iterative_decode(text);
    let forms = handle_forms(linkedin_slug);
    linkedin_regex().captures_iter(&decoded).any(|caps| {
        let mentioned = caps[1]
            .trim_end_matches(['/', '.', ','])
            .to_lowercase();
        mentioned == forms.raw || mentioned == forms.clean
    })
}

/// Scan a fetched profile's bio and blog fields for a link back to the
/// seed, attaching the corresponding signal and evidence pointer.
pub fn scan_profile_for_bridge(observation: &mut ProfileObservation, linkedin_slug: &str) {
    if let Some(blog) = observation.blog.clone() {
        if text_mentions_profile(&blog, linkedin_slug) {
            observation.signals.insert(BridgeSignal::LinkedinUrlInBlog);
            observation
                .evidence
                .push(Evidence::new(&observation.profile_url, EvidenceType::ProfileBlog));
        }
    }
    if let Some(bio) = observation.bio.clone() {
        if text_mentions_profile(&bio, linkedin_slug) {
            observation.signals.insert(BridgeSignal::LinkedinUrlInBio);
            observation
                .evidence
                .push(Evidence::new(&observation.profile_url, EvidenceType::ProfileBio));
        }
    }
}
