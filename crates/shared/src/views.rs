//! View types - read-only projections of kingdom state for session clients
//!
//! Views carry raw uuids and plain strings so hosts can render or forward
//! them without reaching into domain internals. The engine's session module
//! builds them from `KingdomState` after each commit; nothing here mutates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use regent_domain::{CheckKind, DegreeOfSuccess, InstanceStatus, Phase, Resource, SelectionKind};

/// A signed resource delta, used both in views and in facilitator edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub resource: Resource,
    pub value: i64,
}

/// One ledger balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBalance {
    pub resource: Resource,
    pub amount: i64,
}

/// One step of the current phase checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepView {
    pub step_id: String,
    pub name: String,
    pub completed: bool,
}

/// The current phase and its checklist. `begun` is false between an
/// advance and the next begin, when no steps exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseView {
    pub current: Phase,
    pub begun: bool,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementView {
    pub settlement_id: Uuid,
    pub name: String,
    pub founded_turn: u32,
}

/// Roll diagnostics for display. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollView {
    pub die: i32,
    pub modifier: i32,
    pub total: i32,
    pub dc: i32,
    pub formula: String,
}

/// The previewed effects of an instance, ready for confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionView {
    pub numeric_modifiers: Vec<ResourceDelta>,
    pub manual_effects: Vec<String>,
    /// Display strings; the structured actions stay engine-side.
    pub complex_actions: Vec<String>,
}

/// One in-flight check instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInstanceView {
    pub instance_id: Uuid,
    pub check_id: String,
    pub check_name: String,
    pub kind: CheckKind,
    pub initiated_by: Uuid,
    pub actor_name: String,
    pub skill: String,
    pub status: InstanceStatus,
    pub outcome: Option<DegreeOfSuccess>,
    pub effect_text: Option<String>,
    pub roll: Option<RollView>,
    pub resolution: Option<ResolutionView>,
    pub turn_number: u32,
}

/// A pending aid contribution awaiting its target's roll or preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidView {
    pub check_id: String,
    pub contributor_id: Uuid,
    pub contributor_name: String,
    pub skill: String,
    pub outcome: DegreeOfSuccess,
    pub bonus: i32,
}

/// One confirmed check this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogView {
    pub instance_id: Uuid,
    pub check_id: String,
    pub kind: CheckKind,
    pub actor_name: String,
    pub outcome: DegreeOfSuccess,
}

/// Full kingdom snapshot broadcast after every commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KingdomView {
    pub kingdom_id: Uuid,
    pub name: String,
    pub turn_number: u32,
    pub phase: PhaseView,
    pub balances: Vec<ResourceBalance>,
    pub settlements: Vec<SettlementView>,
    pub instances: Vec<CheckInstanceView>,
    pub pending_aid: Vec<AidView>,
    pub action_log: Vec<ActionLogView>,
}

/// Catalog entry summary, sent once on join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub check_id: String,
    pub name: String,
    pub kind: CheckKind,
    pub description: String,
    pub skills: Vec<String>,
    pub base_dc: i32,
    pub required_selection: Option<SelectionKind>,
}
