//! Session signal types for engine-host communication
//!
//! This module contains all message types exchanged between the engine and
//! session hosts. Hosts send `ClientSignal` on behalf of a participant and
//! receive `ServerEvent` on each participant's channel.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change
//! - Unknown client signals deserialize to the `Unknown` variant

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use regent_domain::{DegreeOfSuccess, Phase, ProficiencyRank};

use crate::views::{CheckSummary, KingdomView, ResourceDelta};

// =============================================================================
// Participants
// =============================================================================

/// Role of a connected participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantRole {
    /// Runs the table: phases, incidents, overrides, edits.
    Facilitator,
    /// Plays a ruler: actions, aid, rerolls on own checks.
    Player,
}

/// Raised when a role string from a host cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Unknown participant role: {0}")]
pub struct UnknownRoleError(String);

impl FromStr for ParticipantRole {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facilitator" => Ok(ParticipantRole::Facilitator),
            "player" => Ok(ParticipantRole::Player),
            other => Err(UnknownRoleError(other.to_string())),
        }
    }
}

/// A connected participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub participant_id: Uuid,
    pub name: String,
    pub role: ParticipantRole,
}

// =============================================================================
// Signal payloads
// =============================================================================

/// A pre-roll selection supplied with `ExecuteCheck`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SelectionData {
    Settlement { settlement_id: Uuid },
    Structure { structure_name: String },
    Faction { faction_name: String },
}

/// Facilitator edits applied at confirmation time. Complex actions are not
/// editable here; the stored ones from the preview still run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEdit {
    #[serde(default)]
    pub numeric_modifiers: Vec<ResourceDelta>,
    #[serde(default)]
    pub manual_effects: Vec<String>,
}

// =============================================================================
// Client Signals (Host → Engine)
// =============================================================================

/// Signals from a participant to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientSignal {
    /// Attempt a catalog action as the sending player
    ExecuteCheck {
        check_id: String,
        skill: String,
        #[serde(default)]
        selection: Option<SelectionData>,
    },
    /// Facilitator triggers an incident check against a player
    TriggerIncident {
        check_id: String,
        target_player_id: Uuid,
        skill: String,
    },
    /// Facilitator re-previews an instance under a different degree
    OverrideOutcome {
        instance_id: Uuid,
        outcome: DegreeOfSuccess,
    },
    /// Confirm a previewed instance, optionally with edited effects
    ConfirmResolution {
        instance_id: Uuid,
        #[serde(default)]
        edited: Option<ResolutionEdit>,
    },
    /// Cancel an attempt before confirmation
    CancelCheck { instance_id: Uuid },
    /// Roll to aid another player's pending check
    AidCheck {
        check_id: String,
        skill: String,
        rank: ProficiencyRank,
    },
    /// Spend fame to reroll an instance before it is applied
    RerollCheck { instance_id: Uuid },
    /// Begin the given phase's checklist
    BeginPhase { phase: Phase },
    /// Mark a step of the current phase complete
    CompleteStep { phase: Phase, step_id: String },
    /// Advance past the current phase
    AdvancePhase { phase: Phase },
    /// Ask for a fresh state snapshot (reconnect/resync)
    RequestState,
    /// Heartbeat ping
    Heartbeat,

    /// Forward compatibility: newer hosts may send signals this engine
    /// does not know. The hub rejects them politely instead of erroring
    /// the whole connection.
    #[serde(other)]
    Unknown,
}

impl ClientSignal {
    /// Signal name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExecuteCheck { .. } => "execute_check",
            Self::TriggerIncident { .. } => "trigger_incident",
            Self::OverrideOutcome { .. } => "override_outcome",
            Self::ConfirmResolution { .. } => "confirm_resolution",
            Self::CancelCheck { .. } => "cancel_check",
            Self::AidCheck { .. } => "aid_check",
            Self::RerollCheck { .. } => "reroll_check",
            Self::BeginPhase { .. } => "begin_phase",
            Self::CompleteStep { .. } => "complete_step",
            Self::AdvancePhase { .. } => "advance_phase",
            Self::RequestState => "request_state",
            Self::Heartbeat => "heartbeat",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// Server Events (Engine → Host)
// =============================================================================

/// Events from the engine to a participant's channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// First event after joining: who you are, what can be attempted,
    /// and the current state
    Welcome {
        participant: ParticipantInfo,
        catalog: Vec<CheckSummary>,
        state: KingdomView,
    },
    /// Another participant joined the session
    ParticipantJoined { participant: ParticipantInfo },
    /// A participant left the session
    ParticipantLeft { participant_id: Uuid },

    /// Fresh snapshot after a committed update; `revision` increases by
    /// one per commit, so gaps tell a host it missed broadcasts
    StateChanged { revision: u64, state: KingdomView },

    /// A check attempt was created
    CheckCreated {
        instance_id: Uuid,
        check_id: String,
        actor_name: String,
    },
    /// A roll completed against an instance
    RollRecorded {
        instance_id: Uuid,
        check_id: String,
        outcome: DegreeOfSuccess,
        die: i32,
        total: i32,
        dc: i32,
    },
    /// An outcome preview was stored or refreshed
    OutcomePreviewed {
        instance_id: Uuid,
        check_id: String,
        outcome: DegreeOfSuccess,
        effect_text: String,
    },
    /// A previewed instance was confirmed and its effects applied
    EffectsApplied {
        instance_id: Uuid,
        check_id: String,
        outcome: DegreeOfSuccess,
    },
    /// An instance left the active set (cancel, confirm, or rollover)
    CheckCleared { instance_id: Uuid, check_id: String },

    /// An aid contribution was recorded toward a pending check
    AidRecorded {
        check_id: String,
        contributor_name: String,
        bonus: i32,
    },
    /// An aid contribution was discarded unused
    AidDiscarded { check_id: String },

    /// A phase checklist was begun
    PhaseBegan { phase: Phase },
    /// A step of the current phase completed
    StepCompleted { phase: Phase, step_id: String },
    /// The session advanced past a phase
    PhaseAdvanced { from: Phase, to: Phase },
    /// A new turn started
    TurnBegan { turn_number: u32 },
    /// A settlement was founded
    SettlementFounded { settlement_id: Uuid, name: String },

    /// A signal was rejected; sent only to its sender. `code` is the
    /// stable machine-readable reason, `message` the display text.
    Rejected { code: String, message: String },
    /// Heartbeat reply
    Heartbeat,
}

impl ServerEvent {
    /// Event name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::StateChanged { .. } => "state_changed",
            Self::CheckCreated { .. } => "check_created",
            Self::RollRecorded { .. } => "roll_recorded",
            Self::OutcomePreviewed { .. } => "outcome_previewed",
            Self::EffectsApplied { .. } => "effects_applied",
            Self::CheckCleared { .. } => "check_cleared",
            Self::AidRecorded { .. } => "aid_recorded",
            Self::AidDiscarded { .. } => "aid_discarded",
            Self::PhaseBegan { .. } => "phase_began",
            Self::StepCompleted { .. } => "step_completed",
            Self::PhaseAdvanced { .. } => "phase_advanced",
            Self::TurnBegan { .. } => "turn_began",
            Self::SettlementFounded { .. } => "settlement_founded",
            Self::Rejected { .. } => "rejected",
            Self::Heartbeat => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_signal_uses_type_tag() {
        let signal = ClientSignal::ExecuteCheck {
            check_id: "trade-commodities".to_string(),
            skill: "trade".to_string(),
            selection: None,
        };
        let json = serde_json::to_value(&signal).expect("serialize");
        assert_eq!(json["type"], "ExecuteCheck");
        assert_eq!(json["check_id"], "trade-commodities");
    }

    #[test]
    fn test_unknown_signal_deserializes_without_error() {
        let raw = r#"{"type":"SomethingFromTheFuture","payload":1}"#;
        let signal: ClientSignal = serde_json::from_str(raw).expect("deserialize");
        assert!(matches!(signal, ClientSignal::Unknown));
    }

    #[test]
    fn test_selection_data_is_tagged_by_kind() {
        let selection = SelectionData::Structure {
            structure_name: "Granary".to_string(),
        };
        let json = serde_json::to_value(&selection).expect("serialize");
        assert_eq!(json["kind"], "Structure");
        assert_eq!(json["structure_name"], "Granary");
    }

    #[test]
    fn test_confirm_defaults_to_no_edits() {
        let raw = r#"{"type":"ConfirmResolution","instance_id":"6f9a9c3e-2cf6-4c34-87a4-53a26861e4f0"}"#;
        let signal: ClientSignal = serde_json::from_str(raw).expect("deserialize");
        match signal {
            ClientSignal::ConfirmResolution { edited, .. } => assert!(edited.is_none()),
            other => panic!("expected ConfirmResolution, got {other:?}"),
        }
    }

    #[test]
    fn test_participant_role_parses_case_insensitively() {
        assert_eq!(
            "Facilitator".parse::<ParticipantRole>().expect("parse"),
            ParticipantRole::Facilitator
        );
        assert!("spectator".parse::<ParticipantRole>().is_err());
    }

    #[test]
    fn test_rejected_event_round_trips() {
        let event = ServerEvent::Rejected {
            code: "duplicateInstance".to_string(),
            message: "Check already attempted".to_string(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let back: ServerEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.name(), "rejected");
    }
}
