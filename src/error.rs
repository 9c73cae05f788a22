//! Error types for the data layer
//!
//! Provides unified error handling using thiserror.
//!
//! Absence of a cache entry is never an error here: store lookups return
//! `Option` and storage trouble is logged at the store boundary instead of
//! being raised. The enums below cover the computation path, where failures
//! must reach the caller.

use thiserror::Error;

// == Provider Error Enum ==
/// Failures reported by a remote readings provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("readings request failed: {0}")]
    Request(String),

    /// The provider has no readings for the requested district
    #[error("no readings published for district '{0}'")]
    NotFound(String),

    /// The provider answered with a payload we could not decode
    #[error("malformed readings payload: {0}")]
    Malformed(String),
}

// == Compute Error Enum ==
/// Failures surfaced by the score computation service.
///
/// Cloneable so that one outcome can be handed to every coalesced waiter of
/// the same computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// The circuit breaker is open; no external call was attempted.
    ///
    /// Distinct from [`ComputeError::Fetch`] so callers can apply their own
    /// backoff or messaging instead of treating it as a fresh failure.
    #[error("score service unavailable, retry in {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    /// Fetching external inputs failed
    #[error("readings fetch failed: {0}")]
    Fetch(String),

    /// The computation pipeline failed after inputs were fetched
    #[error("score computation failed: {0}")]
    Failed(String),
}

impl From<ProviderError> for ComputeError {
    fn from(err: ProviderError) -> Self {
        ComputeError::Fetch(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the computation service.
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;
