//! Errors shared by the check pipeline use cases.

use regent_domain::{CheckId, DomainError};

use crate::infrastructure::ports::{RollError, StoreError};

/// Why a pipeline operation did not go through.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The catalog has no entry with the requested id.
    #[error("Unknown check: {0}")]
    UnknownCheck(CheckId),

    /// The roller backed out before a result came in. The attempt was
    /// cleared; nothing was consumed.
    #[error("Roll cancelled")]
    RollCancelled,

    /// The roll surface failed to produce a result.
    #[error("Roll failed: {0}")]
    RollFailed(String),

    /// A domain rule rejected the operation; the state is untouched.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CheckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(domain) => CheckError::Domain(domain),
            StoreError::Unavailable(message) => CheckError::StoreUnavailable(message),
        }
    }
}

impl From<RollError> for CheckError {
    fn from(err: RollError) -> Self {
        match err {
            RollError::Cancelled => CheckError::RollCancelled,
            RollError::Failed(message) => CheckError::RollFailed(message),
        }
    }
}
