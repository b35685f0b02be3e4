//! Preview computation shared across the pipeline.
//!
//! Pure helpers that turn a catalog definition and the current aid pool
//! into either a roll request or a stored preview. Both are rebuilt from
//! scratch on every call, so a refreshed preview replaces the previous one
//! instead of accumulating on top of it.

use regent_domain::{AidContribution, CheckDefinition, DegreeOfSuccess, ResolutionData};

use crate::infrastructure::ports::{RollModifier, RollRequest};

/// Build the roll request for an attempt, folding pending aid in as
/// labelled modifier lines.
pub(crate) fn roll_request(
    definition: &CheckDefinition,
    actor_name: &str,
    skill: &str,
    aid: &[AidContribution],
) -> RollRequest {
    RollRequest {
        check_id: definition.id().clone(),
        check_name: definition.name().to_string(),
        actor_name: actor_name.to_string(),
        skill: skill.to_string(),
        dc: definition.base_dc(),
        modifiers: aid
            .iter()
            .map(|a| RollModifier::new(a.label(), a.bonus()))
            .collect(),
    }
}

/// Compute the preview for a rolled (or overridden) degree: the catalog
/// payload for that outcome, plus one manual-effect line for every
/// contribution that was not part of the roll itself.
pub(crate) fn build_resolution(
    definition: &CheckDefinition,
    outcome: DegreeOfSuccess,
    late_aid: &[AidContribution],
) -> (String, ResolutionData) {
    let outcome_spec = definition.outcome_for(outcome);
    let mut resolution = ResolutionData::new();
    for modifier in &outcome_spec.modifiers {
        resolution = resolution.with_modifier(modifier.resource, modifier.value);
    }
    for effect in &outcome_spec.manual_effects {
        resolution = resolution.with_manual_effect(effect.clone());
    }
    for action in &outcome_spec.complex_actions {
        resolution = resolution.with_complex_action(action.clone());
    }
    for aid in late_aid {
        resolution.push_manual_effect(aid.label());
    }
    (outcome_spec.effect_text.clone(), resolution)
}
