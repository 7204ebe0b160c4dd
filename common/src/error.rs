use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single DNS query after the retry budget has been spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Authoritative negative answer. Never retried.
    #[error("domain or record does not exist (NXDOMAIN)")]
    Nxdomain,

    #[error("no response within deadline")]
    Timeout,

    /// Malformed, refused or otherwise unusable response.
    #[error("server error: {0}")]
    ServerError(String),
}

impl QueryError {
    /// Transient failures are worth another attempt, an NXDOMAIN is not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, QueryError::Nxdomain)
    }
}

/// Operation-level failure surfaced to callers of `lookup_all` and `scan`.
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("invalid domain '{input}': {reason}")]
    InvalidDomain { input: String, reason: String },

    #[error("no nameservers configured")]
    NoNameservers,

    #[error("invalid nameserver '{0}'")]
    InvalidNameserver(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(&'static str),

    /// Every query failed with a transient error: the network, not the target, is the problem.
    #[error("no nameserver reachable: {reason}")]
    Unreachable { reason: QueryError },

    #[error("failed to read wordlist {}: {source}", path.display())]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconError {
    pub(crate) fn invalid_domain(input: &str, reason: impl Into<String>) -> Self {
        ReconError::InvalidDomain {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
