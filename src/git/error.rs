//! Failure taxonomy for a single repository update

use thiserror::Error;

/// Hint appended to authentication failures
pub const AUTH_HINT: &str = "set GITHUB_TOKEN (or GITLAB_TOKEN) for HTTPS remotes";

/// Why a repository update failed
///
/// Every variant is resolved at the single-repository boundary and carried
/// verbatim into the final report; none of them aborts sibling updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("authentication required for remote '{remote}': {AUTH_HINT}")]
    AuthenticationRequired { remote: String },

    #[error("failed to {operation} '{remote}': {message}")]
    NetworkFailure {
        operation: &'static str,
        remote: String,
        message: String,
    },

    #[error("failed to resolve {what}: {message}")]
    ReferenceResolution { what: String, message: String },

    #[error("failed to {operation}: {message}")]
    MergeFailure {
        operation: &'static str,
        message: String,
    },

    #[error("failed to compute diff stats: {message}")]
    DiffComputation { message: String },

    #[error("update cancelled before changing the repository")]
    Cancelled,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl UpdateError {
    pub fn network(operation: &'static str, remote: &str, message: impl ToString) -> Self {
        Self::NetworkFailure {
            operation,
            remote: remote.to_string(),
            message: message.to_string(),
        }
    }

    pub fn reference(what: impl Into<String>, message: impl ToString) -> Self {
        Self::ReferenceResolution {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn merge(operation: &'static str, message: impl ToString) -> Self {
        Self::MergeFailure {
            operation,
            message: message.to_string(),
        }
    }

    pub fn diff(message: impl ToString) -> Self {
        Self::DiffComputation {
            message: message.to_string(),
        }
    }

    pub fn internal(message: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Short machine-friendly label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired { .. } => "authentication-required",
            Self::NetworkFailure { .. } => "network-failure",
            Self::ReferenceResolution { .. } => "reference-resolution",
            Self::MergeFailure { .. } => "merge-failure",
            Self::DiffComputation { .. } => "diff-computation",
            Self::Cancelled => "cancelled",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Returns true when a remote's error text means credentials were missing or rejected
pub(crate) fn is_auth_message(message: &str) -> bool {
    const AUTH_PATTERNS: &[&str] = &[
        "authentication",
        "could not read username",
        "terminal prompts disabled",
        "permission denied",
        "returned error: 401",
        "returned error: 403",
        "status code: 401",
        "status code: 403",
    ];
    let lower = message.to_lowercase();
    AUTH_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Collapses multi-line git output into a single report line
pub(crate) fn clean_error_message(error: &str) -> String {
    let cleaned = error
        .replace('\n', " ")
        .replace('\r', "")
        .replace('\t', " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
