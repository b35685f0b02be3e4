// Port traits define the full contract - many methods are for future use
#![allow(dead_code)]

//! Error types for port operations.

use regent_domain::DomainError;

/// Errors from kingdom store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The update closure refused the change. The stored state is untouched
    /// and no events were published.
    #[error("Update rejected: {0}")]
    Rejected(#[from] DomainError),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an Unavailable error with context.
    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    /// Check whether the update was rejected by domain rules.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The domain error behind a rejection, if any.
    pub fn rejection(&self) -> Option<&DomainError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Unavailable(_) => None,
        }
    }
}

/// Errors from roll resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RollError {
    /// The roll was abandoned before a result came back.
    #[error("Roll cancelled")]
    Cancelled,

    /// The roll surface failed to produce a result.
    #[error("Roll failed: {0}")]
    Failed(String),
}

impl RollError {
    /// Create a Failed error with context.
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Errors from complex effect execution.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// The effect ran and failed partway.
    #[error("Effect failed: {0}")]
    Failed(String),

    /// No executor is wired for this action kind.
    #[error("Unsupported action: {0}")]
    Unsupported(&'static str),
}

impl EffectError {
    /// Create a Failed error with context.
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}
