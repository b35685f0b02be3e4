//! Check instances - in-flight action and incident resolutions
//!
//! A check instance is one attempt at a catalog check by one actor. It walks
//! pending -> rolled -> previewed -> applied and is then removed from the
//! active set ("cleared"). Clearing before apply is the cancellation path and
//! is the only way to release the (check, player) slot without consequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DomainError;
use crate::ids::{ArmyId, CheckId, CheckInstanceId, PlayerId, SettlementId};
use crate::resources::Resource;

/// Whether an attempt was player-initiated or randomly triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKind {
    Action,
    Incident,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Action => write!(f, "action"),
            CheckKind::Incident => write!(f, "incident"),
        }
    }
}

/// Degree of success of a completed roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DegreeOfSuccess {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl DegreeOfSuccess {
    /// Classify a check total against a DC: beating the DC by 10 or more is
    /// a critical success, missing by 10 or more a critical failure.
    pub fn from_check(total: i32, dc: i32) -> Self {
        if total >= dc + 10 {
            DegreeOfSuccess::CriticalSuccess
        } else if total >= dc {
            DegreeOfSuccess::Success
        } else if total <= dc - 10 {
            DegreeOfSuccess::CriticalFailure
        } else {
            DegreeOfSuccess::Failure
        }
    }

    /// One step better (natural 20 adjustment).
    pub fn improved(self) -> Self {
        match self {
            DegreeOfSuccess::CriticalFailure => DegreeOfSuccess::Failure,
            DegreeOfSuccess::Failure => DegreeOfSuccess::Success,
            _ => DegreeOfSuccess::CriticalSuccess,
        }
    }

    /// One step worse (natural 1 adjustment).
    pub fn degraded(self) -> Self {
        match self {
            DegreeOfSuccess::CriticalSuccess => DegreeOfSuccess::Success,
            DegreeOfSuccess::Success => DegreeOfSuccess::Failure,
            _ => DegreeOfSuccess::CriticalFailure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DegreeOfSuccess::CriticalSuccess | DegreeOfSuccess::Success
        )
    }
}

impl fmt::Display for DegreeOfSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegreeOfSuccess::CriticalSuccess => write!(f, "criticalSuccess"),
            DegreeOfSuccess::Success => write!(f, "success"),
            DegreeOfSuccess::Failure => write!(f, "failure"),
            DegreeOfSuccess::CriticalFailure => write!(f, "criticalFailure"),
        }
    }
}

/// Lifecycle status of a check instance.
///
/// "Cleared" is not a status: a cleared instance is removed from the
/// active set entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    Pending,
    Rolled,
    Previewed,
    Applied,
}

/// Diagnostic payload from the roll subsystem.
///
/// The pipeline stores and displays this but never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollBreakdown {
    die: i32,
    modifier: i32,
    total: i32,
    dc: i32,
    formula: String,
}

impl RollBreakdown {
    pub fn new(die: i32, modifier: i32, total: i32, dc: i32) -> Self {
        Self {
            die,
            modifier,
            total,
            dc,
            formula: format!("d20({}) + modifier({}) = {} vs DC {}", die, modifier, total, dc),
        }
    }

    pub fn die(&self) -> i32 {
        self.die
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn dc(&self) -> i32 {
        self.dc
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }
}

/// A signed delta to one ledger resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericModifier {
    pub resource: Resource,
    pub value: i64,
}

impl NumericModifier {
    pub fn new(resource: Resource, value: i64) -> Self {
        Self { resource, value }
    }
}

impl fmt::Display for NumericModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.resource, self.value)
    }
}

/// A structural side effect executed by a black-box manager at apply time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComplexAction {
    /// Found a new settlement with the given name.
    FoundSettlement { name: String },
    /// Damage a random structure in the targeted settlement.
    DamageStructure { settlement_id: SettlementId },
    /// Muster a new army.
    RecruitArmy { name: String },
    /// Disband an existing army.
    DisbandArmy { army_id: ArmyId },
    /// Free-form effect the table resolves by hand.
    Custom { description: String },
}

impl ComplexAction {
    pub fn found_settlement(name: impl Into<String>) -> Self {
        Self::FoundSettlement { name: name.into() }
    }

    pub fn custom(description: impl Into<String>) -> Self {
        Self::Custom {
            description: description.into(),
        }
    }

    /// Name of the action kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ComplexAction::FoundSettlement { .. } => "foundSettlement",
            ComplexAction::DamageStructure { .. } => "damageStructure",
            ComplexAction::RecruitArmy { .. } => "recruitArmy",
            ComplexAction::DisbandArmy { .. } => "disbandArmy",
            ComplexAction::Custom { .. } => "custom",
        }
    }

    /// Validate the action's payload.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            ComplexAction::FoundSettlement { name } | ComplexAction::RecruitArmy { name } => {
                if name.trim().is_empty() {
                    return Err(DomainError::validation(format!(
                        "{} requires a non-empty name",
                        self.kind_name()
                    )));
                }
                Ok(())
            }
            ComplexAction::Custom { description } => {
                if description.trim().is_empty() {
                    return Err(DomainError::validation(
                        "custom action requires a description",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Everything the apply step will do for one outcome.
///
/// Recomputed wholesale by each `store_outcome` call; it never accumulates
/// across calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionData {
    numeric_modifiers: Vec<NumericModifier>,
    manual_effects: Vec<String>,
    complex_actions: Vec<ComplexAction>,
}

impl ResolutionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn numeric_modifiers(&self) -> &[NumericModifier] {
        &self.numeric_modifiers
    }

    pub fn manual_effects(&self) -> &[String] {
        &self.manual_effects
    }

    pub fn complex_actions(&self) -> &[ComplexAction] {
        &self.complex_actions
    }

    // === Builder Methods ===

    pub fn with_modifier(mut self, resource: Resource, value: i64) -> Self {
        self.numeric_modifiers.push(NumericModifier::new(resource, value));
        self
    }

    pub fn with_manual_effect(mut self, effect: impl Into<String>) -> Self {
        self.manual_effects.push(effect.into());
        self
    }

    pub fn with_complex_action(mut self, action: ComplexAction) -> Self {
        self.complex_actions.push(action);
        self
    }

    pub fn push_manual_effect(&mut self, effect: impl Into<String>) {
        self.manual_effects.push(effect.into());
    }

    /// Sum of all numeric deltas per resource, for display and tests.
    pub fn net_delta(&self, resource: Resource) -> i64 {
        self.numeric_modifiers
            .iter()
            .filter(|m| m.resource == resource)
            .map(|m| m.value)
            .sum()
    }
}

/// What kind of pre-roll selection a check requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionKind {
    Settlement,
    Structure,
    Faction,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKind::Settlement => write!(f, "settlement"),
            SelectionKind::Structure => write!(f, "structure"),
            SelectionKind::Faction => write!(f, "faction"),
        }
    }
}

/// A concrete pre-roll selection supplied by the player.
///
/// Settlements are kingdom entities and are validated for existence;
/// structures and factions belong to black-box managers, so only presence
/// is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectionValue {
    Settlement { settlement_id: SettlementId },
    Structure { structure_name: String },
    Faction { faction_name: String },
}

impl SelectionValue {
    pub fn kind(&self) -> SelectionKind {
        match self {
            SelectionValue::Settlement { .. } => SelectionKind::Settlement,
            SelectionValue::Structure { .. } => SelectionKind::Structure,
            SelectionValue::Faction { .. } => SelectionKind::Faction,
        }
    }
}

/// Per-check auxiliary data, set before the roll and read during apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckMetadata {
    selection: Option<SelectionValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, String>,
}

impl CheckMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: SelectionValue) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn selection(&self) -> Option<&SelectionValue> {
        self.selection.as_ref()
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// One in-flight attempt at a catalog check by one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInstance {
    id: CheckInstanceId,
    check_id: CheckId,
    kind: CheckKind,
    initiated_by: PlayerId,
    actor_name: String,
    skill: String,
    status: InstanceStatus,
    outcome: Option<DegreeOfSuccess>,
    #[serde(default)]
    effect_text: Option<String>,
    #[serde(default)]
    roll: Option<RollBreakdown>,
    #[serde(default)]
    resolution: Option<ResolutionData>,
    metadata: CheckMetadata,
    turn_number: u32,
    created_at: DateTime<Utc>,
}

impl CheckInstance {
    pub fn new(
        id: CheckInstanceId,
        check_id: CheckId,
        kind: CheckKind,
        initiated_by: PlayerId,
        actor_name: impl Into<String>,
        skill: impl Into<String>,
        metadata: CheckMetadata,
        turn_number: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            check_id,
            kind,
            initiated_by,
            actor_name: actor_name.into(),
            skill: skill.into(),
            status: InstanceStatus::Pending,
            outcome: None,
            effect_text: None,
            roll: None,
            resolution: None,
            metadata,
            turn_number,
            created_at,
        }
    }

    // === Accessors ===

    pub fn id(&self) -> CheckInstanceId {
        self.id
    }

    pub fn check_id(&self) -> &CheckId {
        &self.check_id
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn initiated_by(&self) -> PlayerId {
        self.initiated_by
    }

    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    pub fn skill(&self) -> &str {
        &self.skill
    }

    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<DegreeOfSuccess> {
        self.outcome
    }

    pub fn effect_text(&self) -> Option<&str> {
        self.effect_text.as_deref()
    }

    pub fn roll(&self) -> Option<&RollBreakdown> {
        self.roll.as_ref()
    }

    pub fn resolution(&self) -> Option<&ResolutionData> {
        self.resolution.as_ref()
    }

    pub fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // === Lifecycle ===

    /// Record the completed roll: pending -> rolled.
    pub fn record_roll(
        &mut self,
        outcome: DegreeOfSuccess,
        breakdown: RollBreakdown,
    ) -> Result<(), DomainError> {
        match self.status {
            InstanceStatus::Pending => {
                self.outcome = Some(outcome);
                self.roll = Some(breakdown);
                self.status = InstanceStatus::Rolled;
                Ok(())
            }
            InstanceStatus::Applied => Err(DomainError::AlreadyApplied(self.id)),
            other => Err(DomainError::invalid_transition(format!(
                "cannot record a roll for instance {} in status {:?}",
                self.id, other
            ))),
        }
    }

    /// Store (or re-store) the computed outcome preview: pending/rolled ->
    /// previewed, or refresh an existing preview. Each call fully replaces
    /// the resolution data. Callable any number of times before apply, which
    /// is what outcome overrides and aid recomputation rely on.
    pub fn store_outcome(
        &mut self,
        outcome: DegreeOfSuccess,
        effect_text: impl Into<String>,
        resolution: ResolutionData,
    ) -> Result<(), DomainError> {
        match self.status {
            InstanceStatus::Pending | InstanceStatus::Rolled | InstanceStatus::Previewed => {
                self.outcome = Some(outcome);
                self.effect_text = Some(effect_text.into());
                self.resolution = Some(resolution);
                self.status = InstanceStatus::Previewed;
                Ok(())
            }
            InstanceStatus::Applied => Err(DomainError::AlreadyApplied(self.id)),
        }
    }

    /// Irreversibly mark effects as applied: previewed -> applied.
    pub fn mark_applied(&mut self) -> Result<(), DomainError> {
        match self.status {
            InstanceStatus::Previewed => {
                self.status = InstanceStatus::Applied;
                Ok(())
            }
            _ => Err(DomainError::AlreadyApplied(self.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_instance() -> CheckInstance {
        CheckInstance::new(
            CheckInstanceId::new(),
            CheckId::new("trade-commodities"),
            CheckKind::Action,
            PlayerId::new(),
            "Amiri",
            "trade",
            CheckMetadata::new(),
            1,
            Utc::now(),
        )
    }

    #[test]
    fn test_degree_from_check_margins() {
        assert_eq!(
            DegreeOfSuccess::from_check(28, 18),
            DegreeOfSuccess::CriticalSuccess
        );
        assert_eq!(DegreeOfSuccess::from_check(18, 18), DegreeOfSuccess::Success);
        assert_eq!(DegreeOfSuccess::from_check(17, 18), DegreeOfSuccess::Failure);
        assert_eq!(
            DegreeOfSuccess::from_check(8, 18),
            DegreeOfSuccess::CriticalFailure
        );
    }

    #[test]
    fn test_degree_step_adjustments() {
        assert_eq!(
            DegreeOfSuccess::Failure.improved(),
            DegreeOfSuccess::Success
        );
        assert_eq!(
            DegreeOfSuccess::CriticalSuccess.improved(),
            DegreeOfSuccess::CriticalSuccess
        );
        assert_eq!(
            DegreeOfSuccess::Success.degraded(),
            DegreeOfSuccess::Failure
        );
        assert_eq!(
            DegreeOfSuccess::CriticalFailure.degraded(),
            DegreeOfSuccess::CriticalFailure
        );
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut instance = pending_instance();
        assert_eq!(instance.status(), InstanceStatus::Pending);

        instance
            .record_roll(
                DegreeOfSuccess::Success,
                RollBreakdown::new(13, 5, 18, 18),
            )
            .expect("roll");
        assert_eq!(instance.status(), InstanceStatus::Rolled);
        assert_eq!(instance.outcome(), Some(DegreeOfSuccess::Success));

        instance
            .store_outcome(
                DegreeOfSuccess::Success,
                "Gain 2 gold",
                ResolutionData::new().with_modifier(Resource::Gold, 2),
            )
            .expect("preview");
        assert_eq!(instance.status(), InstanceStatus::Previewed);
        assert_eq!(instance.effect_text(), Some("Gain 2 gold"));

        instance.mark_applied().expect("apply");
        assert_eq!(instance.status(), InstanceStatus::Applied);
    }

    #[test]
    fn test_store_outcome_replaces_resolution_wholesale() {
        let mut instance = pending_instance();
        instance
            .store_outcome(
                DegreeOfSuccess::Success,
                "Gain 2 gold",
                ResolutionData::new().with_modifier(Resource::Gold, 2),
            )
            .expect("first preview");
        instance
            .store_outcome(
                DegreeOfSuccess::CriticalFailure,
                "Lose 1 gold, gain 1 unrest",
                ResolutionData::new()
                    .with_modifier(Resource::Gold, -1)
                    .with_modifier(Resource::Unrest, 1),
            )
            .expect("override");

        let resolution = instance.resolution().expect("resolution");
        assert_eq!(resolution.net_delta(Resource::Gold), -1);
        assert_eq!(resolution.net_delta(Resource::Unrest), 1);
        assert_eq!(instance.outcome(), Some(DegreeOfSuccess::CriticalFailure));
        // Still previewed: overrides do not change status.
        assert_eq!(instance.status(), InstanceStatus::Previewed);
    }

    #[test]
    fn test_mark_applied_requires_preview() {
        let mut instance = pending_instance();
        let err = instance.mark_applied().unwrap_err();
        assert!(matches!(err, DomainError::AlreadyApplied(_)));
    }

    #[test]
    fn test_applied_instance_rejects_further_transitions() {
        let mut instance = pending_instance();
        instance
            .store_outcome(DegreeOfSuccess::Success, "ok", ResolutionData::new())
            .expect("preview");
        instance.mark_applied().expect("apply");

        assert!(matches!(
            instance
                .store_outcome(DegreeOfSuccess::Failure, "no", ResolutionData::new())
                .unwrap_err(),
            DomainError::AlreadyApplied(_)
        ));
        assert!(matches!(
            instance.mark_applied().unwrap_err(),
            DomainError::AlreadyApplied(_)
        ));
    }

    #[test]
    fn test_complex_action_validation() {
        assert!(ComplexAction::found_settlement("Stagfell").validate().is_ok());
        assert!(ComplexAction::found_settlement("   ").validate().is_err());
        assert!(ComplexAction::custom("").validate().is_err());
    }

    #[test]
    fn test_instance_serde_uses_camel_case() {
        let instance = pending_instance();
        let json = serde_json::to_value(&instance).expect("serialize");
        assert!(json.get("checkId").is_some());
        assert!(json.get("initiatedBy").is_some());
        assert_eq!(json["status"], "pending");
    }
}
