//! Kingdom state - the aggregate every operation reads and mutates
//!
//! `KingdomState` owns the ledger, the phase tracker, settlements, the
//! active check instances, pending aid, and the current turn's action log.
//! Every mutation validates its own preconditions and records the domain
//! events it produced; the store drains those events after a commit.

use serde::{Deserialize, Serialize};

use crate::aid::AidContribution;
use crate::catalog::CheckDefinition;
use crate::check::{
    CheckInstance, CheckKind, DegreeOfSuccess, InstanceStatus, ResolutionData, RollBreakdown,
};
use crate::error::DomainError;
use crate::events::KingdomEvent;
use crate::ids::{CheckId, CheckInstanceId, KingdomId, PlayerId, SettlementId};
use crate::phase::{Phase, PhaseState};
use crate::resources::{Resource, ResourceLedger};

/// A founded settlement. Structures inside it belong to the black-box
/// settlement manager; the kingdom only tracks existence, which drives
/// resource collection and consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    id: SettlementId,
    name: String,
    founded_turn: u32,
}

impl Settlement {
    pub fn new(id: SettlementId, name: impl Into<String>, founded_turn: u32) -> Self {
        Self {
            id,
            name: name.into(),
            founded_turn,
        }
    }

    pub fn id(&self) -> SettlementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn founded_turn(&self) -> u32 {
        self.founded_turn
    }
}

/// One confirmed check this turn. The log is the proof a confirmation
/// happened, which is what makes a repeated confirm detectable after the
/// instance itself is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    instance_id: CheckInstanceId,
    check_id: CheckId,
    kind: CheckKind,
    player: PlayerId,
    actor_name: String,
    outcome: DegreeOfSuccess,
    turn_number: u32,
}

impl ActionLogEntry {
    pub fn instance_id(&self) -> CheckInstanceId {
        self.instance_id
    }

    pub fn check_id(&self) -> &CheckId {
        &self.check_id
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    pub fn outcome(&self) -> DegreeOfSuccess {
        self.outcome
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }
}

/// Result of advancing past a phase boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseAdvance {
    /// Phase now current.
    pub phase: Phase,
    /// Set when the advance rolled the turn over.
    pub new_turn: Option<u32>,
    /// Instances dropped by turn rollover.
    pub cleared_instances: Vec<CheckInstanceId>,
}

/// The kingdom aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KingdomState {
    id: KingdomId,
    name: String,
    turn_number: u32,
    phase: PhaseState,
    ledger: ResourceLedger,
    settlements: Vec<Settlement>,
    instances: Vec<CheckInstance>,
    aid: Vec<AidContribution>,
    action_log: Vec<ActionLogEntry>,
    #[serde(skip)]
    pending_events: Vec<KingdomEvent>,
}

impl KingdomState {
    /// A new kingdom on turn one, Status phase already begun, empty
    /// ledger. Starting balances and settlements are seeded via the
    /// builders.
    pub fn new(id: KingdomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            turn_number: 1,
            phase: PhaseState::started(),
            ledger: ResourceLedger::new(),
            settlements: Vec::new(),
            instances: Vec::new(),
            aid: Vec::new(),
            action_log: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    // === Accessors ===

    pub fn id(&self) -> KingdomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn current_phase(&self) -> Phase {
        self.phase.current()
    }

    pub fn phase(&self) -> &PhaseState {
        &self.phase
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.id() == id)
    }

    pub fn instances(&self) -> &[CheckInstance] {
        &self.instances
    }

    pub fn instance(&self, id: CheckInstanceId) -> Option<&CheckInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    /// The active instance holding the (check, player) slot, if any.
    pub fn instance_for(&self, check_id: &CheckId, player: PlayerId) -> Option<&CheckInstance> {
        self.instances
            .iter()
            .find(|i| i.check_id() == check_id && i.initiated_by() == player)
    }

    pub fn aid(&self) -> &[AidContribution] {
        &self.aid
    }

    pub fn aid_for(&self, check_id: &CheckId) -> Vec<&AidContribution> {
        self.aid.iter().filter(|a| a.check_id() == check_id).collect()
    }

    pub fn action_log(&self) -> &[ActionLogEntry] {
        &self.action_log
    }

    /// Whether this player has confirmed an action this turn. Incidents
    /// are logged too but do not occupy the action slot.
    pub fn has_acted(&self, player: PlayerId) -> bool {
        self.action_log
            .iter()
            .any(|e| e.kind == CheckKind::Action && e.player == player)
    }

    /// Food consumed per turn: one per settlement.
    pub fn consumption(&self) -> i64 {
        self.settlements.len() as i64
    }

    pub fn pending_events(&self) -> &[KingdomEvent] {
        &self.pending_events
    }

    /// Drain accumulated events. The store calls this after a commit.
    pub fn take_events(&mut self) -> Vec<KingdomEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // === Builder Methods ===

    pub fn with_balance(mut self, resource: Resource, amount: i64) -> Self {
        self.ledger = self.ledger.with_balance(resource, amount);
        self
    }

    pub fn with_settlement(mut self, name: impl Into<String>) -> Self {
        self.settlements.push(Settlement::new(
            SettlementId::new(),
            name.into(),
            self.turn_number,
        ));
        self
    }

    // === Check Lifecycle ===

    /// Register a new pending instance. Actions allow one active instance
    /// per (check, initiating player) pair; an incident admits a single
    /// active instance for the whole kingdom, whoever took it on.
    pub fn create_instance(&mut self, instance: CheckInstance) -> Result<(), DomainError> {
        let holder = match instance.kind() {
            CheckKind::Action => {
                self.instance_for(instance.check_id(), instance.initiated_by())
            }
            CheckKind::Incident => self
                .instances
                .iter()
                .find(|i| i.check_id() == instance.check_id()),
        };
        if let Some(existing) = holder {
            return Err(DomainError::DuplicateInstance {
                check_id: existing.check_id().clone(),
                player_id: existing.initiated_by(),
            });
        }
        self.pending_events.push(KingdomEvent::InstanceCreated {
            instance_id: instance.id(),
            check_id: instance.check_id().clone(),
            kind: instance.kind(),
            initiated_by: instance.initiated_by(),
            actor_name: instance.actor_name().to_string(),
        });
        self.instances.push(instance);
        Ok(())
    }

    /// Record a completed roll against a pending instance.
    pub fn record_roll(
        &mut self,
        instance_id: CheckInstanceId,
        outcome: DegreeOfSuccess,
        breakdown: RollBreakdown,
    ) -> Result<(), DomainError> {
        let (die, total, dc) = (breakdown.die(), breakdown.total(), breakdown.dc());
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id() == instance_id)
            .ok_or(DomainError::InstanceNotFound(instance_id))?;
        let check_id = instance.check_id().clone();
        instance.record_roll(outcome, breakdown)?;
        self.pending_events.push(KingdomEvent::RollRecorded {
            instance_id,
            check_id,
            outcome,
            die,
            total,
            dc,
        });
        Ok(())
    }

    /// Store or refresh the outcome preview for an instance.
    pub fn store_outcome(
        &mut self,
        instance_id: CheckInstanceId,
        outcome: DegreeOfSuccess,
        effect_text: impl Into<String>,
        resolution: ResolutionData,
    ) -> Result<(), DomainError> {
        let effect_text = effect_text.into();
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id() == instance_id)
            .ok_or(DomainError::InstanceNotFound(instance_id))?;
        let check_id = instance.check_id().clone();
        instance.store_outcome(outcome, effect_text.clone(), resolution)?;
        self.pending_events.push(KingdomEvent::OutcomePreviewed {
            instance_id,
            check_id,
            outcome,
            effect_text,
        });
        Ok(())
    }

    /// Confirm a previewed instance: check requirements and the action
    /// slot, apply numeric modifiers to the ledger, log the action,
    /// discard leftover aid, and clear the instance. Fails without any
    /// mutation; in particular a requirements failure leaves the instance
    /// previewed so the player can retry after trading.
    ///
    /// Returns the applied instance, whose resolution data tells the
    /// caller which manual effects and complex actions remain to run.
    pub fn apply_check(
        &mut self,
        instance_id: CheckInstanceId,
        confirmed_by: PlayerId,
        definition: &CheckDefinition,
        edited_resolution: Option<ResolutionData>,
    ) -> Result<CheckInstance, DomainError> {
        let index = match self.instances.iter().position(|i| i.id() == instance_id) {
            Some(index) => index,
            None => {
                // A confirmed instance leaves a log entry behind; its
                // absence means the id never existed or was cancelled.
                return Err(if self.log_has_instance(instance_id) {
                    DomainError::AlreadyApplied(instance_id)
                } else {
                    DomainError::InstanceNotFound(instance_id)
                });
            }
        };

        // Validate everything before mutating anything.
        let (outcome, kind, initiated_by, check_id, actor_name, effect_text) = {
            let instance = &self.instances[index];
            match instance.status() {
                InstanceStatus::Previewed => {}
                InstanceStatus::Applied => return Err(DomainError::AlreadyApplied(instance_id)),
                other => {
                    return Err(DomainError::invalid_transition(format!(
                        "Instance {} must be previewed before confirmation, found {:?}",
                        instance_id, other
                    )))
                }
            }
            let outcome = instance.outcome().ok_or_else(|| {
                DomainError::invalid_transition(format!(
                    "Instance {} is previewed without an outcome",
                    instance_id
                ))
            })?;
            (
                outcome,
                instance.kind(),
                instance.initiated_by(),
                instance.check_id().clone(),
                instance.actor_name().to_string(),
                instance.effect_text().unwrap_or_default().to_string(),
            )
        };

        let missing = self
            .ledger
            .unmet(&definition.outcome_for(outcome).requirements);
        if !missing.is_empty() {
            return Err(DomainError::requirements_not_met(missing));
        }
        if kind == CheckKind::Action && self.has_acted(initiated_by) {
            return Err(DomainError::ActionAlreadyTaken(initiated_by));
        }

        if let Some(edited) = edited_resolution {
            self.instances[index].store_outcome(outcome, effect_text, edited)?;
        }
        let resolution = self.instances[index].resolution().cloned().unwrap_or_default();
        for modifier in resolution.numeric_modifiers() {
            self.ledger.apply_delta(modifier.resource, modifier.value);
        }

        self.instances[index].mark_applied()?;
        self.pending_events.push(KingdomEvent::EffectsApplied {
            instance_id,
            check_id: check_id.clone(),
            outcome,
            applied_by: confirmed_by,
        });
        self.action_log.push(ActionLogEntry {
            instance_id,
            check_id: check_id.clone(),
            kind,
            player: initiated_by,
            actor_name,
            outcome,
            turn_number: self.turn_number,
        });
        self.discard_aid_for(&check_id);

        let instance = self.instances.remove(index);
        self.pending_events.push(KingdomEvent::InstanceCleared {
            instance_id,
            check_id,
        });
        Ok(instance)
    }

    /// Remove an instance from the active set without touching the ledger
    /// or the log. Pending aid stays so a follow-up attempt can use it.
    pub fn clear_instance(
        &mut self,
        instance_id: CheckInstanceId,
    ) -> Result<CheckInstance, DomainError> {
        let index = self
            .instances
            .iter()
            .position(|i| i.id() == instance_id)
            .ok_or(DomainError::InstanceNotFound(instance_id))?;
        let instance = self.instances.remove(index);
        self.pending_events.push(KingdomEvent::InstanceCleared {
            instance_id,
            check_id: instance.check_id().clone(),
        });
        Ok(instance)
    }

    /// Cancel an attempt: clear the instance and discard its pending aid.
    pub fn cancel_check(
        &mut self,
        instance_id: CheckInstanceId,
    ) -> Result<CheckInstance, DomainError> {
        let instance = self.clear_instance(instance_id)?;
        let check_id = instance.check_id().clone();
        self.discard_aid_for(&check_id);
        Ok(instance)
    }

    /// Whether an instance id was confirmed earlier this turn. Lets
    /// callers tell a repeated confirmation apart from an id that never
    /// existed.
    pub fn log_has_instance(&self, instance_id: CheckInstanceId) -> bool {
        self.action_log.iter().any(|e| e.instance_id == instance_id)
    }

    /// Spend fame to retry an active instance: debit the cost, drop the
    /// old attempt, and register its replacement as pending. Pending aid
    /// for the check stays for the new roll. Run inside one store update;
    /// a rejection aborts the commit with nothing debited.
    pub fn begin_reroll(
        &mut self,
        instance_id: CheckInstanceId,
        replacement: CheckInstance,
        fame_cost: i64,
    ) -> Result<CheckInstance, DomainError> {
        if self.instance(instance_id).is_none() {
            return Err(if self.log_has_instance(instance_id) {
                DomainError::AlreadyApplied(instance_id)
            } else {
                DomainError::InstanceNotFound(instance_id)
            });
        }
        self.ledger.debit(Resource::Fame, fame_cost)?;
        let old = self.clear_instance(instance_id)?;
        self.create_instance(replacement)?;
        Ok(old)
    }

    /// Undo a reroll whose replacement roll never completed: drop the
    /// replacement if it is still active and return the fame, leaving the
    /// ledger where it was before the reroll was requested.
    pub fn abort_reroll(&mut self, instance_id: CheckInstanceId, fame_cost: i64) {
        let _ = self.clear_instance(instance_id);
        self.ledger.apply_delta(Resource::Fame, fame_cost);
    }

    // === Aid ===

    /// Record an aid contribution toward an active check. A second
    /// contribution by the same player for the same check replaces the
    /// first. Returns `false` when no active instance exists for the
    /// check, in which case the contribution is discarded.
    pub fn record_aid(&mut self, contribution: AidContribution) -> bool {
        let target_active = self
            .instances
            .iter()
            .any(|i| i.check_id() == contribution.check_id());
        if !target_active {
            self.pending_events.push(KingdomEvent::AidDiscarded {
                check_id: contribution.check_id().clone(),
                contributor: contribution.contributor(),
            });
            return false;
        }
        self.aid.retain(|a| {
            !(a.check_id() == contribution.check_id()
                && a.contributor() == contribution.contributor())
        });
        self.pending_events.push(KingdomEvent::AidRecorded {
            check_id: contribution.check_id().clone(),
            contributor: contribution.contributor(),
            contributor_name: contribution.contributor_name().to_string(),
            bonus: contribution.bonus(),
        });
        self.aid.push(contribution);
        true
    }

    /// Drain specific contributors' pending aid for a check once it has
    /// been merged into the check's roll. Merged contributions live on in
    /// the roll breakdown; consumption is not a discard, so no events are
    /// recorded. Contributions by anyone not listed stay pending.
    pub fn consume_aid(
        &mut self,
        check_id: &CheckId,
        contributors: &[PlayerId],
    ) -> Vec<AidContribution> {
        let (taken, kept) = std::mem::take(&mut self.aid)
            .into_iter()
            .partition(|a| a.check_id() == check_id && contributors.contains(&a.contributor()));
        self.aid = kept;
        taken
    }

    /// Discard all pending contributions for a check.
    pub fn discard_aid_for(&mut self, check_id: &CheckId) -> usize {
        let (discarded, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.aid)
            .into_iter()
            .partition(|a| a.check_id() == check_id);
        self.aid = kept;
        for aid in &discarded {
            self.pending_events.push(KingdomEvent::AidDiscarded {
                check_id: aid.check_id().clone(),
                contributor: aid.contributor(),
            });
        }
        discarded.len()
    }

    // === Turn Structure ===

    /// Begin a phase, materializing its checklist. Idempotent for the
    /// current phase. Steps with nothing to do complete themselves:
    /// Unrest when unrest is zero, Upkeep's consumption when no
    /// settlement eats.
    pub fn begin_phase(&mut self, phase: Phase) -> Result<bool, DomainError> {
        if !self.phase.begin(phase)? {
            return Ok(false);
        }
        self.pending_events.push(KingdomEvent::PhaseBegan { phase });
        match phase {
            Phase::Unrest if self.ledger.amount(Resource::Unrest) == 0 => {
                self.complete_step(phase, "check-unrest")?;
                self.complete_step(phase, "resolve-incident")?;
            }
            Phase::Upkeep if self.consumption() == 0 => {
                self.complete_step(phase, "pay-consumption")?;
            }
            _ => {}
        }
        Ok(true)
    }

    /// Complete one step of the current phase. The step's resource effect
    /// runs exactly once, on first completion; repeats return `Ok(false)`
    /// and change nothing.
    pub fn complete_step(&mut self, phase: Phase, step_id: &str) -> Result<bool, DomainError> {
        if !self.phase.complete_step(phase, step_id)? {
            return Ok(false);
        }
        self.apply_step_effect(step_id);
        self.pending_events.push(KingdomEvent::StepCompleted {
            phase,
            step_id: step_id.to_string(),
        });
        Ok(true)
    }

    fn apply_step_effect(&mut self, step_id: &str) {
        match step_id {
            "gain-fame" => {
                self.ledger.apply_delta(Resource::Fame, 1);
            }
            "collect-resources" => {
                let count = self.settlements.len() as i64;
                self.ledger.apply_delta(Resource::Gold, count);
                self.ledger.apply_delta(Resource::Food, count);
            }
            "pay-consumption" => {
                let required = self.consumption();
                self.ledger.pay_consumption(required);
            }
            _ => {}
        }
    }

    /// Advance to the next phase once the current one's steps are all
    /// complete. Advancing past Upkeep rolls the turn over: the turn
    /// counter increments, live instances and aid are dropped, and the
    /// action log resets. The new phase starts un-begun.
    pub fn advance_phase(&mut self, from: Phase) -> Result<PhaseAdvance, DomainError> {
        let next = self.phase.advance(from)?;
        self.pending_events
            .push(KingdomEvent::PhaseAdvanced { from, to: next });

        let mut advance = PhaseAdvance {
            phase: next,
            new_turn: None,
            cleared_instances: Vec::new(),
        };
        if from == Phase::Upkeep {
            self.turn_number += 1;
            for instance in std::mem::take(&mut self.instances) {
                self.pending_events.push(KingdomEvent::InstanceCleared {
                    instance_id: instance.id(),
                    check_id: instance.check_id().clone(),
                });
                advance.cleared_instances.push(instance.id());
            }
            for aid in std::mem::take(&mut self.aid) {
                self.pending_events.push(KingdomEvent::AidDiscarded {
                    check_id: aid.check_id().clone(),
                    contributor: aid.contributor(),
                });
            }
            self.action_log.clear();
            self.pending_events.push(KingdomEvent::TurnBegan {
                turn_number: self.turn_number,
            });
            advance.new_turn = Some(self.turn_number);
        }
        Ok(advance)
    }

    // === Settlements ===

    /// Found a new settlement, effective immediately.
    pub fn found_settlement(
        &mut self,
        name: impl Into<String>,
    ) -> Result<SettlementId, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation(
                "Settlement requires a non-empty name",
            ));
        }
        let settlement = Settlement::new(SettlementId::new(), name, self.turn_number);
        let id = settlement.id();
        self.pending_events.push(KingdomEvent::SettlementFounded {
            settlement_id: id,
            name: settlement.name().to_string(),
        });
        self.settlements.push(settlement);
        Ok(id)
    }
}
