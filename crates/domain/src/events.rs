//! Domain events
//!
//! Coarse-grained records of state changes, accumulated by `KingdomState`
//! mutations and drained by the store after a successful commit. The engine
//! maps them to session events at the hub boundary.

use serde::{Deserialize, Serialize};

use crate::check::{CheckKind, DegreeOfSuccess};
use crate::ids::{CheckId, CheckInstanceId, PlayerId, SettlementId};
use crate::phase::Phase;

/// Domain event for significant state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum KingdomEvent {
    // Check lifecycle
    InstanceCreated {
        instance_id: CheckInstanceId,
        check_id: CheckId,
        kind: CheckKind,
        initiated_by: PlayerId,
        actor_name: String,
    },
    RollRecorded {
        instance_id: CheckInstanceId,
        check_id: CheckId,
        outcome: DegreeOfSuccess,
        die: i32,
        total: i32,
        dc: i32,
    },
    OutcomePreviewed {
        instance_id: CheckInstanceId,
        check_id: CheckId,
        outcome: DegreeOfSuccess,
        effect_text: String,
    },
    EffectsApplied {
        instance_id: CheckInstanceId,
        check_id: CheckId,
        outcome: DegreeOfSuccess,
        applied_by: PlayerId,
    },
    InstanceCleared {
        instance_id: CheckInstanceId,
        check_id: CheckId,
    },

    // Aid
    AidRecorded {
        check_id: CheckId,
        contributor: PlayerId,
        contributor_name: String,
        bonus: i32,
    },
    AidDiscarded {
        check_id: CheckId,
        contributor: PlayerId,
    },

    // Turn structure
    PhaseBegan {
        phase: Phase,
    },
    StepCompleted {
        phase: Phase,
        step_id: String,
    },
    PhaseAdvanced {
        from: Phase,
        to: Phase,
    },
    TurnBegan {
        turn_number: u32,
    },

    // Kingdom entities
    SettlementFounded {
        settlement_id: SettlementId,
        name: String,
    },
}

impl KingdomEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InstanceCreated { .. } => "instance_created",
            Self::RollRecorded { .. } => "roll_recorded",
            Self::OutcomePreviewed { .. } => "outcome_previewed",
            Self::EffectsApplied { .. } => "effects_applied",
            Self::InstanceCleared { .. } => "instance_cleared",
            Self::AidRecorded { .. } => "aid_recorded",
            Self::AidDiscarded { .. } => "aid_discarded",
            Self::PhaseBegan { .. } => "phase_began",
            Self::StepCompleted { .. } => "step_completed",
            Self::PhaseAdvanced { .. } => "phase_advanced",
            Self::TurnBegan { .. } => "turn_began",
            Self::SettlementFounded { .. } => "settlement_founded",
        }
    }
}
