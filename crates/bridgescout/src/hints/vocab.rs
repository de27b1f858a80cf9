//! Fixed vocabularies used by hint extraction and query planning.

/// Words that disqualify a title segment from being a person name.
pub const JOB_TITLE_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "programmer",
    "architect",
    "scientist",
    "analyst",
    "manager",
    "director",
    "lead",
    "head",
    "chief",
    "officer",
    "president",
    "founder",
    "cofounder",
    "co-founder",
    "ceo",
    "cto",
    "cfo",
    "coo",
    "vp",
    "consultant",
    "specialist",
    "recruiter",
    "designer",
    "researcher",
    "professor",
    "student",
    "intern",
    "freelance",
    "senior",
    "staff",
    "principal",
    "junior",
];

/// Credential tails stripped off slug ends (`jane-doe-phd-1a2b3c`).
pub const CREDENTIAL_TAILS: &[&str] = &[
    "phd", "md", "mba", "cpa", "cfa", "pmp", "esq", "dds", "jd", "rn", "pe", "jr", "sr",
];

/// Company-indicator tokens searched right-to-left through title segments.
pub const COMPANY_INDICATORS: &[&str] = &[
    "inc",
    "llc",
    "ltd",
    "corp",
    "gmbh",
    "labs",
    "lab",
    "ventures",
    "capital",
    "partners",
    "technologies",
    "technology",
    "software",
    "systems",
    "solutions",
    "studio",
    "studios",
    "group",
    "media",
    "consulting",
];

/// Brands recognized directly as companies.
pub const KNOWN_BRANDS: &[&str] = &[
    "google",
    "alphabet",
    "meta",
    "facebook",
    "amazon",
    "aws",
    "apple",
    "microsoft",
    "netflix",
    "nvidia",
    "intel",
    "ibm",
    "oracle",
    "salesforce",
    "adobe",
    "stripe",
    "airbnb",
    "uber",
    "lyft",
    "spotify",
    "shopify",
    "dropbox",
    "slack",
    "atlassian",
    "twilio",
    "datadog",
    "snowflake",
    "databricks",
    "openai",
    "anthropic",
    "deepmind",
    "github",
    "gitlab",
    "linkedin",
    "twitter",
    "pinterest",
    "reddit",
    "tesla",
    "spacex",
    "palantir",
    "coinbase",
    "square",
    "figma",
    "notion",
    "vercel",
    "cloudflare",
];

/// Technology keywords pulled from technical headlines for name+tech queries.
pub const TECH_KEYWORDS: &[&str] = &[
    "rust",
    "python",
    "javascript",
    "typescript",
    "golang",
    "java",
    "kotlin",
    "swift",
    "scala",
    "ruby",
    "react",
    "kubernetes",
    "docker",
    "terraform",
    "tensorflow",
    "pytorch",
    "spark",
    "kafka",
    "postgres",
    "graphql",
    "ios",
    "android",
    "blockchain",
    "devops",
    "frontend",
    "backend",
    "fullstack",
    "ml",
    "nlp",
    "llm",
];

/// US state postal abbreviations.
pub const US_STATE_ABBREVS: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

/// Country names (lowercase) to ISO 3166-1 alpha-2 codes. Used both by the
/// location-plausibility predicate and the contradiction detector.
pub const COUNTRIES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("america", "US"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("england", "GB"),
    ("scotland", "GB"),
    ("canada", "CA"),
    ("germany", "DE"),
    ("france", "FR"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
    ("sweden", "SE"),
    ("norway", "NO"),
    ("denmark", "DK"),
    ("finland", "FI"),
    ("switzerland", "CH"),
    ("austria", "AT"),
    ("poland", "PL"),
    ("portugal", "PT"),
    ("ireland", "IE"),
    ("india", "IN"),
    ("china", "CN"),
    ("japan", "JP"),
    ("south korea", "KR"),
    ("singapore", "SG"),
    ("australia", "AU"),
    ("new zealand", "NZ"),
    ("brazil", "BR"),
    ("argentina", "AR"),
    ("mexico", "MX"),
    ("israel", "IL"),
    ("ukraine", "UA"),
    ("nigeria", "NG"),
    ("south africa", "ZA"),
];

/// Cities recognized directly, with their country codes.
pub const KNOWN_CITIES: &[(&str, &str)] = &[
    ("san francisco", "US"),
    ("new york", "US"),
    ("seattle", "US"),
    ("austin", "US"),
    ("boston", "US"),
    ("chicago", "US"),
    ("los angeles", "US"),
    ("denver", "US"),
    ("atlanta", "US"),
    ("portland", "US"),
    ("san jose", "US"),
    ("palo alto", "US"),
    ("mountain view", "US"),
    ("london", "GB"),
    ("manchester", "GB"),
    ("edinburgh", "GB"),
    ("dublin", "IE"),
    ("paris", "FR"),
    ("berlin", "DE"),
    ("munich", "DE"),
    ("amsterdam", "NL"),
    ("stockholm", "SE"),
    ("zurich", "CH"),
    ("madrid", "ES"),
    ("barcelona", "ES"),
    ("lisbon", "PT"),
    ("warsaw", "PL"),
    ("toronto", "CA"),
    ("vancouver", "CA"),
    ("montreal", "CA"),
    ("bangalore", "IN"),
    ("bengaluru", "IN"),
    ("mumbai", "IN"),
    ("hyderabad", "IN"),
    ("delhi", "IN"),
    ("tokyo", "JP"),
    ("seoul", "KR"),
    ("sydney", "AU"),
    ("melbourne", "AU"),
    ("singapore", "SG"),
    ("tel aviv", "IL"),
    ("sao paulo", "BR"),
];

/// Look up a country code for a location fragment, case-insensitively.
/// Recognizes country names, US state abbreviations, and known cities.
#[must_use]
pub fn country_code_for(fragment: &str) -> Option<&'static str> {
    let trimmed = fragment.trim();
    if US_STATE_ABBREVS.contains(&trimmed) {
        return Some("US");
    }
    let lower = trimmed.to_lowercase();
    if let Some((_, code)) = COUNTRIES.iter().find(|(name, _)| *name == lower) {
        return Some(code);
    }
    KNOWN_CITIES
        .iter()
        .find(|(city, _)| *city == lower)
        .map(|(_, code)| *code)
}

/// Country code for a full location string, checking comma-separated parts
/// right to left (`"Berlin, Germany"` → `DE`).
#[must_use]
pub fn country_code_for_location(location: &str) -> Option<&'static str> {
    for part in location.rsplit(',') {
        if let Some(code) = country_code_for(part) {
            return Some(code);
        }
    }
    None
}
