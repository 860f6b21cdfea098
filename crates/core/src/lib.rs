//! Shared primitives for all Rust crates in Attestra.

#![forbid(unsafe_code)]

/// Platform identifier newtypes shared across services.
pub mod ids;

use thiserror::Error;

pub use ids::{ActorId, ScopeId, TargetId};

/// Result type used across Attestra crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid startup configuration. Fatal: the process must not accept
    /// traffic with a configuration that failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A caller exceeded a request limit. Expected behavior, not a defect.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A call to an upstream platform surface failed or timed out.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
