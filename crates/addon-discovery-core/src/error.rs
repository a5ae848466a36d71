//! Error types for the discovery core.
//!
//! Only genuine contract violations are errors. Degenerate inputs such as
//! an empty query, an empty tag set, or a category without items produce
//! empty successful results instead.

use thiserror::Error;

/// Errors returned by discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A caller-supplied argument is malformed (bad pagination, negative
    /// limit, inverted filter range). Never silently corrected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The entity an operation starts from does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The collaboration network traversal ran past its deadline.
    #[error("deadline exceeded after visiting {visited} authors")]
    DeadlineExceeded { visited: usize },

    /// Failure reported by the taxonomy store, propagated unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl DiscoveryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Reject a negative `limit`-style argument.
pub(crate) fn check_limit(name: &str, value: i64) -> Result<usize> {
    if value < 0 {
        return Err(DiscoveryError::invalid(format!(
            "{} must be >= 0, got {}",
            name, value
        )));
    }
    Ok(value as usize)
}
