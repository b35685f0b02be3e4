//! Turn phases and the per-phase step checklist
//!
//! `PhaseState` is purely mechanical: it tracks which phase is current,
//! which steps exist, and which are complete. Resource effects of steps and
//! turn rollover bookkeeping live on `KingdomState`, which drives this type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// The five phases of a kingdom turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Status,
    Resources,
    Unrest,
    Actions,
    Upkeep,
}

impl Phase {
    pub fn all() -> [Phase; 5] {
        [
            Phase::Status,
            Phase::Resources,
            Phase::Unrest,
            Phase::Actions,
            Phase::Upkeep,
        ]
    }

    /// The phase that follows this one. Upkeep wraps around to Status,
    /// which is what starts the next turn.
    pub fn next(self) -> Phase {
        match self {
            Phase::Status => Phase::Resources,
            Phase::Resources => Phase::Unrest,
            Phase::Unrest => Phase::Actions,
            Phase::Actions => Phase::Upkeep,
            Phase::Upkeep => Phase::Status,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Status => "status",
            Phase::Resources => "resources",
            Phase::Unrest => "unrest",
            Phase::Actions => "actions",
            Phase::Upkeep => "upkeep",
        }
    }

    /// The fixed step checklist for this phase.
    pub fn step_templates(self) -> &'static [StepTemplate] {
        match self {
            Phase::Status => &[StepTemplate {
                id: "gain-fame",
                name: "Gain Fame",
            }],
            Phase::Resources => &[StepTemplate {
                id: "collect-resources",
                name: "Collect Resources",
            }],
            Phase::Unrest => &[
                StepTemplate {
                    id: "check-unrest",
                    name: "Check Unrest",
                },
                StepTemplate {
                    id: "resolve-incident",
                    name: "Resolve Incident",
                },
            ],
            Phase::Actions => &[StepTemplate {
                id: "take-actions",
                name: "Take Actions",
            }],
            Phase::Upkeep => &[
                StepTemplate {
                    id: "pay-consumption",
                    name: "Pay Consumption",
                },
                StepTemplate {
                    id: "end-of-turn",
                    name: "End of Turn",
                },
            ],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static definition of one step within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTemplate {
    pub id: &'static str,
    pub name: &'static str,
}

/// One step of the current phase, with its completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStep {
    step_id: String,
    name: String,
    completed: bool,
}

impl PhaseStep {
    fn from_template(template: &StepTemplate) -> Self {
        Self {
            step_id: template.id.to_string(),
            name: template.name.to_string(),
            completed: false,
        }
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Tracks the current phase and its step checklist.
///
/// An empty step list means the phase has been reached but not yet begun;
/// `begin` materializes the checklist from the phase's templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseState {
    current: Phase,
    steps: Vec<PhaseStep>,
}

impl PhaseState {
    /// A fresh tracker positioned at Status, not yet begun.
    pub fn new() -> Self {
        Self {
            current: Phase::Status,
            steps: Vec::new(),
        }
    }

    /// A tracker for a brand-new kingdom: Status already begun, so turn
    /// one starts on its checklist without a separate begin call.
    pub fn started() -> Self {
        Self {
            current: Phase::Status,
            steps: Phase::Status
                .step_templates()
                .iter()
                .map(PhaseStep::from_template)
                .collect(),
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn steps(&self) -> &[PhaseStep] {
        &self.steps
    }

    pub fn is_begun(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn all_complete(&self) -> bool {
        self.is_begun() && self.steps.iter().all(PhaseStep::is_completed)
    }

    /// Begin the given phase by materializing its step checklist.
    ///
    /// Returns `true` on first initialization, `false` if the phase was
    /// already begun (repeat calls are harmless no-ops).
    pub fn begin(&mut self, phase: Phase) -> Result<bool, DomainError> {
        if phase != self.current {
            return Err(DomainError::phase_mismatch(self.current, phase));
        }
        if self.is_begun() {
            return Ok(false);
        }
        self.steps = phase
            .step_templates()
            .iter()
            .map(PhaseStep::from_template)
            .collect();
        Ok(true)
    }

    /// Mark a step of the given phase complete.
    ///
    /// Returns `true` on first completion (the caller applies the step's
    /// effect exactly then), `false` when the step was already complete.
    pub fn complete_step(&mut self, phase: Phase, step_id: &str) -> Result<bool, DomainError> {
        if phase != self.current {
            return Err(DomainError::phase_mismatch(self.current, phase));
        }
        if !self.is_begun() {
            return Err(DomainError::validation(format!(
                "Phase {} has not begun; no steps to complete",
                self.current
            )));
        }
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.step_id == step_id)
            .ok_or_else(|| DomainError::unknown_step(phase, step_id))?;
        if step.completed {
            return Ok(false);
        }
        step.completed = true;
        Ok(true)
    }

    /// Advance to the next phase once every step of the current one is
    /// complete. The new phase is left un-begun; its steps materialize on
    /// the next `begin`. Returns the new current phase.
    pub fn advance(&mut self, from: Phase) -> Result<Phase, DomainError> {
        if from != self.current {
            return Err(DomainError::phase_mismatch(self.current, from));
        }
        if !self.all_complete() {
            return Err(DomainError::StepsIncomplete(self.current));
        }
        self.current = self.current.next();
        self.steps.clear();
        Ok(self.current)
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::new()
    }
}
