//! Unified error types for the domain layer
//!
//! Every rejection the resolution pipeline or turn scheduler can produce is a
//! variant here. These are returned as values across the engine/UI boundary,
//! never panicked, so callers can decide per-case whether to surface, retry,
//! or ignore.

use thiserror::Error;

use crate::check::SelectionKind;
use crate::ids::{CheckId, CheckInstanceId, PlayerId};
use crate::phase::Phase;
use crate::resources::{Resource, ResourceShortfall};

/// Unified error type for domain operations
#[derive(Debug, Error, Clone)]
pub enum DomainError {
    /// A non-cleared instance already occupies the (check, player) slot.
    #[error("Check '{check_id}' is already in progress for player {player_id}")]
    DuplicateInstance {
        check_id: CheckId,
        player_id: PlayerId,
    },

    /// The instance is not in a confirmable state (already applied, or no
    /// preview was ever stored).
    #[error("Check instance {0} cannot be applied again")]
    AlreadyApplied(CheckInstanceId),

    /// A scheduler operation addressed a phase that is not current.
    #[error("Phase mismatch: current phase is {current}, request addressed {requested}")]
    PhaseMismatch { current: Phase, requested: Phase },

    /// Advancing was requested while steps remain incomplete.
    #[error("Phase {0} still has incomplete steps")]
    StepsIncomplete(Phase),

    /// The outcome's catalog requirements are not satisfied by the ledger.
    #[error("Requirements not met: {} resource(s) short", missing.len())]
    RequirementsNotMet { missing: Vec<ResourceShortfall> },

    /// The actor cannot pay the cost of the requested operation.
    #[error("Insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        resource: Resource,
        required: i64,
        available: i64,
    },

    /// The player's one action for this turn has already been consumed.
    #[error("Player {0} has already taken an action this turn")]
    ActionAlreadyTaken(PlayerId),

    /// No active instance with this id.
    #[error("Check instance not found: {0}")]
    InstanceNotFound(CheckInstanceId),

    /// The check requires a pre-roll selection that was not supplied.
    #[error("Check '{check_id}' requires a {kind} selection before rolling")]
    SelectionRequired {
        check_id: CheckId,
        kind: SelectionKind,
    },

    /// Step id not declared by the current phase.
    #[error("Phase {phase} has no step '{step_id}'")]
    UnknownStep { phase: Phase, step_id: String },

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a phase mismatch error
    pub fn phase_mismatch(current: Phase, requested: Phase) -> Self {
        Self::PhaseMismatch { current, requested }
    }

    /// Create an unknown step error
    pub fn unknown_step(phase: Phase, step_id: impl Into<String>) -> Self {
        Self::UnknownStep {
            phase,
            step_id: step_id.into(),
        }
    }

    /// Create a requirements-not-met error from the unmet shortfalls
    pub fn requirements_not_met(missing: Vec<ResourceShortfall>) -> Self {
        Self::RequirementsNotMet { missing }
    }
}
