//! Check definitions - the static catalog entries players attempt
//!
//! Definitions are data, not behavior: per-outcome effect text, numeric
//! modifiers, manual effects, complex actions, and resource requirements.
//! The engine interprets them when an instance is previewed and applied.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::check::{CheckKind, ComplexAction, DegreeOfSuccess, NumericModifier, SelectionKind};
use crate::error::DomainError;
use crate::ids::CheckId;
use crate::resources::Resource;

/// A minimum resource balance an outcome demands before it may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    resource: Resource,
    minimum: i64,
}

impl Requirement {
    pub fn new(resource: Resource, minimum: i64) -> Self {
        Self { resource, minimum }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn minimum(&self) -> i64 {
        self.minimum
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.minimum, self.resource)
    }
}

/// Everything one outcome of a check does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSpec {
    /// Narrative description shown to players.
    pub effect_text: String,
    /// Ledger deltas applied on confirmation.
    pub modifiers: Vec<NumericModifier>,
    /// Effects the table applies by hand.
    pub manual_effects: Vec<String>,
    /// Structural effects executed by black-box managers after apply.
    pub complex_actions: Vec<ComplexAction>,
    /// Balances that must be on hand before this outcome can be applied.
    pub requirements: Vec<Requirement>,
}

impl OutcomeSpec {
    pub fn new(effect_text: impl Into<String>) -> Self {
        Self {
            effect_text: effect_text.into(),
            modifiers: Vec::new(),
            manual_effects: Vec::new(),
            complex_actions: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, resource: Resource, value: i64) -> Self {
        self.modifiers.push(NumericModifier::new(resource, value));
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

    pub fn with_requirement(mut self, resource: Resource, minimum: i64) -> Self {
        self.requirements.push(Requirement::new(resource, minimum));
        self
    }
}

/// Per-degree outcomes for a check. Success and failure are always
/// present; the critical variants fall back to their plain counterpart
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcomes {
    pub success: OutcomeSpec,
    pub failure: OutcomeSpec,
    pub critical_success: Option<OutcomeSpec>,
    pub critical_failure: Option<OutcomeSpec>,
}

impl CheckOutcomes {
    pub fn simple(success: OutcomeSpec, failure: OutcomeSpec) -> Self {
        Self {
            success,
            failure,
            critical_success: None,
            critical_failure: None,
        }
    }

    pub fn with_critical_success(mut self, spec: OutcomeSpec) -> Self {
        self.critical_success = Some(spec);
        self
    }

    pub fn with_critical_failure(mut self, spec: OutcomeSpec) -> Self {
        self.critical_failure = Some(spec);
        self
    }

    /// The spec for a degree, falling back to plain success/failure where
    /// no critical variant is authored.
    pub fn for_degree(&self, degree: DegreeOfSuccess) -> &OutcomeSpec {
        match degree {
            DegreeOfSuccess::CriticalSuccess => {
                self.critical_success.as_ref().unwrap_or(&self.success)
            }
            DegreeOfSuccess::Success => &self.success,
            DegreeOfSuccess::Failure => &self.failure,
            DegreeOfSuccess::CriticalFailure => {
                self.critical_failure.as_ref().unwrap_or(&self.failure)
            }
        }
    }
}

/// One catalog entry: a named check players can attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDefinition {
    id: CheckId,
    name: String,
    kind: CheckKind,
    description: String,
    skills: Vec<String>,
    base_dc: i32,
    required_selection: Option<SelectionKind>,
    outcomes: CheckOutcomes,
}

impl CheckDefinition {
    pub fn new(
        id: impl Into<CheckId>,
        name: impl Into<String>,
        kind: CheckKind,
        base_dc: i32,
        outcomes: CheckOutcomes,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: String::new(),
            skills: Vec::new(),
            base_dc,
            required_selection: None,
            outcomes,
        }
    }

    // === Accessors ===

    pub fn id(&self) -> &CheckId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn base_dc(&self) -> i32 {
        self.base_dc
    }

    pub fn required_selection(&self) -> Option<SelectionKind> {
        self.required_selection
    }

    pub fn outcomes(&self) -> &CheckOutcomes {
        &self.outcomes
    }

    /// Shortcut for `outcomes().for_degree(degree)`.
    pub fn outcome_for(&self, degree: DegreeOfSuccess) -> &OutcomeSpec {
        self.outcomes.for_degree(degree)
    }

    // === Builder Methods ===

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    pub fn with_selection(mut self, kind: SelectionKind) -> Self {
        self.required_selection = Some(kind);
        self
    }

    /// Validate the definition's payload.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Check definition requires a name"));
        }
        if self.skills.is_empty() {
            return Err(DomainError::validation(format!(
                "Check '{}' requires at least one skill",
                self.id
            )));
        }
        if self.base_dc < 1 {
            return Err(DomainError::validation(format!(
                "Check '{}' requires a DC of at least 1",
                self.id
            )));
        }
        for action in self
            .outcomes
            .success
            .complex_actions
            .iter()
            .chain(self.outcomes.failure.complex_actions.iter())
            .chain(
                self.outcomes
                    .critical_success
                    .iter()
                    .flat_map(|o| o.complex_actions.iter()),
            )
            .chain(
                self.outcomes
                    .critical_failure
                    .iter()
                    .flat_map(|o| o.complex_actions.iter()),
            )
        {
            action.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> CheckDefinition {
        CheckDefinition::new(
            "trade-commodities",
            "Trade Commodities",
            CheckKind::Action,
            18,
            CheckOutcomes::simple(
                OutcomeSpec::new("Gain 2 gold")
                    .with_modifier(Resource::Gold, 2)
                    .with_requirement(Resource::Lumber, 1),
                OutcomeSpec::new("No deal"),
            )
            .with_critical_failure(
                OutcomeSpec::new("Lose 1 gold, gain 1 unrest")
                    .with_modifier(Resource::Gold, -1)
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_skill("trade")
    }

    #[test]
    fn test_for_degree_falls_back_to_plain_outcomes() {
        let def = definition();
        // No critical success authored: fall back to success.
        assert_eq!(
            def.outcome_for(DegreeOfSuccess::CriticalSuccess).effect_text,
            "Gain 2 gold"
        );
        // Critical failure is authored: use it.
        assert_eq!(
            def.outcome_for(DegreeOfSuccess::CriticalFailure).effect_text,
            "Lose 1 gold, gain 1 unrest"
        );
    }

    #[test]
    fn test_requirements_are_per_outcome() {
        let def = definition();
        assert_eq!(def.outcome_for(DegreeOfSuccess::Success).requirements.len(), 1);
        assert!(def
            .outcome_for(DegreeOfSuccess::Failure)
            .requirements
            .is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_skills() {
        let def = CheckDefinition::new(
            "noop",
            "Noop",
            CheckKind::Action,
            10,
            CheckOutcomes::default(),
        );
        assert!(matches!(
            def.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn test_definition_serde_uses_camel_case() {
        let def = definition();
        let json = serde_json::to_value(&def).expect("serialize");
        assert!(json.get("baseDc").is_some());
        assert!(json.get("requiredSelection").is_some());
        assert_eq!(json["outcomes"]["success"]["effectText"], "Gain 2 gold");
    }
}
