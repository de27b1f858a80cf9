//! Error types for the identity-resolution engine.
//!
//! One public [`Error`] enum covers the whole core crate. Integration crates
//! (search providers, the GitHub client) map their transport failures into
//! these variants at the boundary, so the pipeline only ever reasons about
//! the kinds below.
//!
//! Two predicates drive control flow:
//!
//! - [`Error::is_job_fatal`] — errors that must terminate a job without
//!   retry (missing candidate, tenant mismatch).
//! - [`Error::is_recoverable`] — errors the executor may retry with backoff
//!   (rate limits, provider outages).

use std::time::Duration;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The candidate referenced by a job does not exist.
    #[error("candidate not found: {candidate_id}")]
    CandidateNotFound {
        /// Candidate id the job referenced.
        candidate_id: String,
    },

    /// The candidate exists but does not belong to the requesting tenant.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A provider returned 429/403 with quota semantics.
    #[error("rate limited by {provider}")]
    RateLimited {
        /// Provider that rejected the request.
        provider: String,
        /// Parsed `Retry-After` delay, when the provider sent one.
        retry_after: Option<Duration>,
    },

    /// A provider is unreachable or returning server errors.
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable {
        provider: String,
        reason: String,
    },

    /// A response could not be parsed. The offending result is dropped and
    /// sampled into the run trace; the job continues.
    #[error("parse error: {0}")]
    Parse(String),

    /// A phase exceeded its deadline.
    #[error("timed out during {phase}")]
    Timeout {
        /// Pipeline phase that hit the deadline.
        phase: String,
    },

    /// An upsert lost a write race. Logged per-identity, never fails the job.
    #[error("persist conflict: {0}")]
    PersistConflict(String),

    /// Relational store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Job queue failure.
    #[error("queue error: {0}")]
    Queue(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Anything that does not fit the kinds above.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Candidate-missing constructor.
    pub fn candidate_not_found(candidate_id: impl Into<String>) -> Self {
        Self::CandidateNotFound {
            candidate_id: candidate_id.into(),
        }
    }

    /// Tenant-mismatch constructor.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    /// Rate-limit constructor.
    pub fn rate_limited(provider: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after,
        }
    }

    /// Provider-outage constructor.
    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Parse-failure constructor.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Deadline-exceeded constructor.
    pub fn timeout(phase: impl Into<String>) -> Self {
        Self::Timeout {
            phase: phase.into(),
        }
    }

    /// Store-failure constructor.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Queue-failure constructor.
    pub fn queue(message: impl Into<String>) -> Self {
        Self::Queue(message.into())
    }

    /// Configuration-failure constructor.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Catch-all constructor.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for errors that terminate a job without retry.
    #[must_use]
    pub fn is_job_fatal(&self) -> bool {
        matches!(
            self,
            Self::CandidateNotFound { .. } | Self::AccessDenied(_) | Self::Config(_)
        )
    }

    /// True for errors the executor may retry with backoff.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ProviderUnavailable { .. } | Self::Timeout { .. }
        )
    }

    /// Short machine-readable kind, used in session records and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CandidateNotFound { .. } => "candidate_not_found",
            Self::AccessDenied(_) => "access_denied",
            Self::RateLimited { .. } => "rate_limited",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::Parse(_) => "parse_error",
            Self::Timeout { .. } => "timeout",
            Self::PersistConflict(_) => "persist_conflict",
            Self::Store(_) => "store_error",
            Self::Queue(_) => "queue_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
