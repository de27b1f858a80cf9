//! URL → platform identity routing.
//!
//! Given a search-result URL, decide which platform profile it points at
//! and extract the platform-scoped id. Pages under `/about`, `/team` or
//! `/people` route to the company-team pseudo-platform.

use url::Url;

use crate::model::Platform;

/// GitHub top-level paths that are product pages, not user profiles.
const GITHUB_RESERVED: &[&str] = &[
    "about",
    "features",
    "pricing",
    "topics",
    "collections",
    "trending",
    "marketplace",
    "sponsors",
    "orgs",
    "organizations",
    "apps",
    "login",
    "join",
    "signup",
    "blog",
    "site",
    "explore",
    "settings",
    "notifications",
    "search",
    "contact",
    "customer-stories",
    "enterprise",
    "team",
    "security",
    "readme",
];

/// Lead-generation and LinkedIn-adjacent domains whose pages merely embed
/// profile links; results from them are skipped outright.
const LEAD_GEN_DOMAINS: &[&str] = &[
    "linkedin.com",
    "rocketreach.co",
    "zoominfo.com",
    "apollo.io",
    "lusha.com",
    "contactout.com",
    "signalhire.com",
    "salesql.com",
    "kendoemailapp.com",
    "theorg.com",
];

/// True when the host belongs to a lead-gen aggregator (or LinkedIn itself).
#[must_use]
pub fn is_lead_gen_domain(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    LEAD_GEN_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

fn first_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|parts| {
            parts
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn is_team_path(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    ["/about", "/team", "/people"]
        .iter()
        .any(|p| path.contains(p))
}

/// Route a URL to a `(platform, platform_id)` pair, or `None` when the URL
/// is not a recognizable profile page.
#[must_use]
pub fn route_url(raw_url: &str) -> Option<(Platform, String)> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();

    if is_lead_gen_domain(&host) {
        return None;
    }

    let parts = segments(&url);

    match host.as_str() {
        "github.com" => {
            // Single-segment path, excluding reserved product pages.
            if parts.len() != 1 {
                return None;
            }
            let login = parts[0].to_lowercase();
            if GITHUB_RESERVED.contains(&login.as_str()) {
                return None;
            }
            Some((Platform::Github, login))
        }
        "twitter.com" | "x.com" => {
            let handle = first_segment(&url)?.to_lowercase();
            if ["home", "search", "explore", "i", "intent", "hashtag"].contains(&handle.as_str()) {
                return None;
            }
            Some((Platform::Twitter, handle))
        }
        "medium.com" => {
            let seg = first_segment(&url)?;
            let handle = seg.strip_prefix('@')?.to_lowercase();
            Some((Platform::Medium, handle))
        }
        "npmjs.com" => {
            let seg = first_segment(&url)?;
            let handle = seg.strip_prefix('~')?.to_lowercase();
            Some((Platform::Npm, handle))
        }
        "pypi.org" => {
            if parts.len() >= 2 && parts[0] == "user" {
                Some((Platform::Pypi, parts[1].to_lowercase()))
            } else {
                None
            }
        }
        "kaggle.com" => {
            let handle = first_segment(&url)?.to_lowercase();
            if ["competitions", "datasets", "code", "models", "learn", "discussions"]
                .contains(&handle.as_str())
            {
                return None;
            }
            Some((Platform::Kaggle, handle))
        }
        "orcid.org" => {
            let id = first_segment(&url)?;
            // ORCID iDs look like 0000-0002-1825-0097.
            let valid = id.len() == 19
                && id
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == '-' || c == 'X');
            valid.then(|| (Platform::Orcid, id))
        }
        "scholar.google.com" => {
            let user = url
                .query_pairs()
                .find(|(k, _)| k == "user")
                .map(|(_, v)| v.to_string())?;
            Some((Platform::GoogleScholar, user))
        }
        "crunchbase.com" => {
            if parts.len() >= 2 && parts[0] == "person" {
                Some((Platform::Crunchbase, parts[1].to_lowercase()))
            } else {
                None
            }
        }
        "dribbble.com" => {
            let handle = first_segment(&url)?.to_lowercase();
            if ["shots", "designers", "jobs", "tags", "stories"].contains(&handle.as_str()) {
                return None;
            }
            Some((Platform::Dribbble, handle))
        }
        _ => {
            // Substack profile subdomains.
            if let Some(sub) = host.strip_suffix(".substack.com") {
                if !sub.is_empty() && sub != "www" {
                    return Some((Platform::Substack, sub.to_string()));
                }
            }
            // Company team pages on arbitrary domains.
            if is_team_path(&url) {
                return Some((Platform::CompanyTeam, host));
            }
            None
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_profile_routes() {
        assert_eq!(
            route_url("https://github.com/janedoe"),
            Some((Platform::Github, "janedoe".to_string()))
        );
        assert_eq!(route_url("https://github.com/features"), None);
        assert_eq!(route_url("https://github.com/janedoe/some-repo"), None);
    }

    #[test]
    fn twitter_and_x_route_to_same_platform() {
        assert_eq!(
            route_url("https://twitter.com/janedoe"),
            Some((Platform::Twitter, "janedoe".to_string()))
        );
        assert_eq!(
            route_url("https://x.com/JaneDoe"),
            Some((Platform::Twitter, "janedoe".to_string()))
        );
        assert_eq!(route_url("https://x.com/search?q=foo"), None);
    }

    #[test]
    fn medium_requires_at_handle() {
        assert_eq!(
            route_url("https://medium.com/@janedoe"),
            Some((Platform::Medium, "janedoe".to_string()))
        );
        assert_eq!(route_url("https://medium.com/some-publication"), None);
    }

    #[test]
    fn substack_subdomain_routes() {
        assert_eq!(
            route_url("https://janedoe.substack.com/p/post"),
            Some((Platform::Substack, "janedoe".to_string()))
        );
        assert_eq!(route_url("https://www.substack.com/home"), None);
    }

    #[test]
    fn team_pages_route_to_companyteam() {
        assert_eq!(
            route_url("https://acme.example.com/about/leadership"),
            Some((Platform::CompanyTeam, "acme.example.com".to_string()))
        );
        assert_eq!(
            route_url("https://initech.io/team"),
            Some((Platform::CompanyTeam, "initech.io".to_string()))
        );
    }

    #[test]
    fn lead_gen_domains_are_skipped() {
        assert_eq!(route_url("https://www.linkedin.com/in/jane-doe"), None);
        assert_eq!(route_url("https://rocketreach.co/jane-doe-email"), None);
        assert!(is_lead_gen_domain("app.zoominfo.com"));
        assert!(!is_lead_gen_domain("github.com"));
    }

    #[test]
    fn orcid_validates_id_shape() {
        assert_eq!(
            route_url("https://orcid.org/0000-0002-1825-0097"),
            Some((Platform::Orcid, "0000-0002-1825-0097".to_string()))
        );
        assert_eq!(route_url("https://orcid.org/about"), None);
    }

    #[test]
    fn scholar_uses_user_param() {
        assert_eq!(
            route_url("https://scholar.google.com/citations?user=AbC123&hl=en"),
            Some((Platform::GoogleScholar, "AbC123".to_string()))
        );
        assert_eq!(route_url("https://scholar.google.com/citations"), None);
    }

    #[test]
    fn package_registries() {
        assert_eq!(
            route_url("https://www.npmjs.com/~janedoe"),
            Some((Platform::Npm, "janedoe".to_string()))
        );
        assert_eq!(
            route_url("https://pypi.org/user/janedoe/"),
            Some((Platform::Pypi, "janedoe".to_string()))
        );
        assert_eq!(
            route_url("https://www.crunchbase.com/person/jane-doe"),
            Some((Platform::Crunchbase, "jane-doe".to_string()))
        );
    }
}
