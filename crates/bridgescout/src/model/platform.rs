//! Target platforms for identity discovery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform an identity candidate can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Github,
    Npm,
    Pypi,
    Kaggle,
    Orcid,
    GoogleScholar,
    Crunchbase,
    Dribbble,
    Medium,
    Twitter,
    Substack,
    /// A company `/about`, `/team` or `/people` page that mentions the seed.
    #[serde(rename = "companyteam")]
    CompanyTeam,
    /// General web search, not a profile platform.
    Web,
}

impl Platform {
    /// Stable snake_case name, matching the stored enum.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Kaggle => "kaggle",
            Self::Orcid => "orcid",
            Self::GoogleScholar => "google_scholar",
            Self::Crunchbase => "crunchbase",
            Self::Dribbble => "dribbble",
            Self::Medium => "medium",
            Self::Twitter => "twitter",
            Self::Substack => "substack",
            Self::CompanyTeam => "companyteam",
            Self::Web => "web",
        }
    }

    /// Primary domain used in `site:` queries.
    #[must_use]
    pub fn site_domain(&self) -> Option<&'static str> {
        match self {
            Self::Github => Some("github.com"),
            Self::Npm => Some("npmjs.com"),
            Self::Pypi => Some("pypi.org"),
            Self::Kaggle => Some("kaggle.com"),
            Self::Orcid => Some("orcid.org"),
            Self::GoogleScholar => Some("scholar.google.com"),
            Self::Crunchbase => Some("crunchbase.com"),
            Self::Dribbble => Some("dribbble.com"),
            Self::Medium => Some("medium.com"),
            Self::Twitter => Some("x.com"),
            Self::Substack => Some("substack.com"),
            Self::CompanyTeam | Self::Web => None,
        }
    }

    /// The discoverable profile platforms, in fan-out order.
    pub const DISCOVERABLE: [Platform; 9] = [
        Platform::Github,
        Platform::Npm,
        Platform::Pypi,
        Platform::Kaggle,
        Platform::Orcid,
        Platform::GoogleScholar,
        Platform::Crunchbase,
        Platform::Dribbble,
        Platform::Medium,
    ];
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip_uses_snake_case() {
        let json = serde_json::to_string(&Platform::GoogleScholar).unwrap();
        assert_eq!(json, "\"google_scholar\"");
        let back: Platform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Platform::GoogleScholar);
    }

    #[test]
    fn companyteam_keeps_legacy_name() {
        assert_eq!(Platform::CompanyTeam.as_str(), "companyteam");
        let json = serde_json::to_string(&Platform::CompanyTeam).unwrap();
        assert_eq!(json, "\"companyteam\"");
    }
}
