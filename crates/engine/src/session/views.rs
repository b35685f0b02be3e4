//! Domain-to-view projections.
//!
//! Everything a host renders comes through here: `KingdomState` becomes a
//! `KingdomView` snapshot, `KingdomEvent`s become `ServerEvent`s. Domain
//! ids flatten to raw uuids and check ids to their slugs at this boundary.

use regent_domain::{
    ActionLogEntry, AidContribution, CheckDefinition, CheckInstance, ComplexAction, KingdomEvent,
    KingdomState, PhaseState, Resource, ResolutionData, RollBreakdown, Settlement,
};
use regent_shared::{
    ActionLogView, AidView, CheckInstanceView, CheckSummary, KingdomView, PhaseView,
    ResolutionView, ResourceBalance, ResourceDelta, RollView, ServerEvent, SettlementView,
    StepView,
};

use crate::infrastructure::ports::CheckCatalogPort;

/// Project the full state for broadcast. Check names come from the
/// catalog; an instance whose definition has gone missing falls back to
/// its slug rather than hiding the instance.
pub fn kingdom_view(state: &KingdomState, catalog: &dyn CheckCatalogPort) -> KingdomView {
    KingdomView {
        kingdom_id: state.id().to_uuid(),
        name: state.name().to_string(),
        turn_number: state.turn_number(),
        phase: phase_view(state.phase()),
        balances: Resource::all()
            .iter()
            .map(|&resource| ResourceBalance {
                resource,
                amount: state.ledger().amount(resource),
            })
            .collect(),
        settlements: state.settlements().iter().map(settlement_view).collect(),
        instances: state
            .instances()
            .iter()
            .map(|instance| instance_view(instance, catalog))
            .collect(),
        pending_aid: state.aid().iter().map(aid_view).collect(),
        action_log: state.action_log().iter().map(log_view).collect(),
    }
}

/// Catalog entry summary for the join handshake.
pub fn check_summary(definition: &CheckDefinition) -> CheckSummary {
    CheckSummary {
        check_id: definition.id().as_str().to_string(),
        name: definition.name().to_string(),
        kind: definition.kind(),
        description: definition.description().to_string(),
        skills: definition.skills().to_vec(),
        base_dc: definition.base_dc(),
        required_selection: definition.required_selection(),
    }
}

/// Map a committed domain event to its session counterpart.
pub fn server_event(event: &KingdomEvent) -> ServerEvent {
    match event {
        KingdomEvent::InstanceCreated {
            instance_id,
            check_id,
            actor_name,
            ..
        } => ServerEvent::CheckCreated {
            instance_id: instance_id.to_uuid(),
            check_id: check_id.as_str().to_string(),
            actor_name: actor_name.clone(),
        },
        KingdomEvent::RollRecorded {
            instance_id,
            check_id,
            outcome,
            die,
            total,
            dc,
        } => ServerEvent::RollRecorded {
            instance_id: instance_id.to_uuid(),
            check_id: check_id.as_str().to_string(),
            outcome: *outcome,
            die: *die,
            total: *total,
            dc: *dc,
        },
        KingdomEvent::OutcomePreviewed {
            instance_id,
            check_id,
            outcome,
            effect_text,
        } => ServerEvent::OutcomePreviewed {
            instance_id: instance_id.to_uuid(),
            check_id: check_id.as_str().to_string(),
            outcome: *outcome,
            effect_text: effect_text.clone(),
        },
        KingdomEvent::EffectsApplied {
            instance_id,
            check_id,
            outcome,
            ..
        } => ServerEvent::EffectsApplied {
            instance_id: instance_id.to_uuid(),
            check_id: check_id.as_str().to_string(),
            outcome: *outcome,
        },
        KingdomEvent::InstanceCleared {
            instance_id,
            check_id,
        } => ServerEvent::CheckCleared {
            instance_id: instance_id.to_uuid(),
            check_id: check_id.as_str().to_string(),
        },
        KingdomEvent::AidRecorded {
            check_id,
            contributor_name,
            bonus,
            ..
        } => ServerEvent::AidRecorded {
            check_id: check_id.as_str().to_string(),
            contributor_name: contributor_name.clone(),
            bonus: *bonus,
        },
        KingdomEvent::AidDiscarded { check_id, .. } => ServerEvent::AidDiscarded {
            check_id: check_id.as_str().to_string(),
        },
        KingdomEvent::PhaseBegan { phase } => ServerEvent::PhaseBegan { phase: *phase },
        KingdomEvent::StepCompleted { phase, step_id } => ServerEvent::StepCompleted {
            phase: *phase,
            step_id: step_id.clone(),
        },
        KingdomEvent::PhaseAdvanced { from, to } => ServerEvent::PhaseAdvanced {
            from: *from,
            to: *to,
        },
        KingdomEvent::TurnBegan { turn_number } => ServerEvent::TurnBegan {
            turn_number: *turn_number,
        },
        KingdomEvent::SettlementFounded {
            settlement_id,
            name,
        } => ServerEvent::SettlementFounded {
            settlement_id: settlement_id.to_uuid(),
            name: name.clone(),
        },
    }
}

fn phase_view(phase: &PhaseState) -> PhaseView {
    PhaseView {
        current: phase.current(),
        begun: phase.is_begun(),
        steps: phase
            .steps()
            .iter()
            .map(|step| StepView {
                step_id: step.step_id().to_string(),
                name: step.name().to_string(),
                completed: step.is_completed(),
            })
            .collect(),
    }
}

fn settlement_view(settlement: &Settlement) -> SettlementView {
    SettlementView {
        settlement_id: settlement.id().to_uuid(),
        name: settlement.name().to_string(),
        founded_turn: settlement.founded_turn(),
    }
}

fn instance_view(instance: &CheckInstance, catalog: &dyn CheckCatalogPort) -> CheckInstanceView {
    let check_name = catalog
        .get(instance.check_id())
        .map(|definition| definition.name().to_string())
        .unwrap_or_else(|| instance.check_id().as_str().to_string());
    CheckInstanceView {
        instance_id: instance.id().to_uuid(),
        check_id: instance.check_id().as_str().to_string(),
        check_name,
        kind: instance.kind(),
        initiated_by: instance.initiated_by().to_uuid(),
        actor_name: instance.actor_name().to_string(),
        skill: instance.skill().to_string(),
        status: instance.status(),
        outcome: instance.outcome(),
        effect_text: instance.effect_text().map(str::to_string),
        roll: instance.roll().map(roll_view),
        resolution: instance.resolution().map(resolution_view),
        turn_number: instance.turn_number(),
    }
}

fn roll_view(breakdown: &RollBreakdown) -> RollView {
    RollView {
        die: breakdown.die(),
        modifier: breakdown.modifier(),
        total: breakdown.total(),
        dc: breakdown.dc(),
        formula: breakdown.formula().to_string(),
    }
}

fn resolution_view(resolution: &ResolutionData) -> ResolutionView {
    ResolutionView {
        numeric_modifiers: resolution
            .numeric_modifiers()
            .iter()
            .map(|modifier| ResourceDelta {
                resource: modifier.resource,
                value: modifier.value,
            })
            .collect(),
        manual_effects: resolution.manual_effects().to_vec(),
        complex_actions: resolution
            .complex_actions()
            .iter()
            .map(action_label)
            .collect(),
    }
}

fn action_label(action: &ComplexAction) -> String {
    match action {
        ComplexAction::FoundSettlement { name } => format!("Found settlement: {name}"),
        ComplexAction::DamageStructure { settlement_id } => {
            format!("Damage a structure in settlement {settlement_id}")
        }
        ComplexAction::RecruitArmy { name } => format!("Recruit army: {name}"),
        ComplexAction::DisbandArmy { army_id } => format!("Disband army {army_id}"),
        ComplexAction::Custom { description } => description.clone(),
    }
}

fn aid_view(aid: &AidContribution) -> AidView {
    AidView {
        check_id: aid.check_id().as_str().to_string(),
        contributor_id: aid.contributor().to_uuid(),
        contributor_name: aid.contributor_name().to_string(),
        skill: aid.skill().to_string(),
        outcome: aid.outcome(),
        bonus: aid.bonus(),
    }
}

fn log_view(entry: &ActionLogEntry) -> ActionLogView {
    ActionLogView {
        instance_id: entry.instance_id().to_uuid(),
        check_id: entry.check_id().as_str().to_string(),
        kind: entry.kind(),
        actor_name: entry.actor_name().to_string(),
        outcome: entry.outcome(),
    }
}
