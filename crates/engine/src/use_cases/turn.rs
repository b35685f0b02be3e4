//! Turn-structure use cases.
//!
//! The facilitator drives the five-phase turn loop: begin a phase,
//! complete its steps, advance to the next. All the arithmetic lives in
//! the domain; these use cases just put each call inside a store commit.

use std::sync::Arc;

use regent_domain::{DomainError, KingdomEvent, Phase};

use crate::infrastructure::ports::{KingdomStorePort, StoreError};

pub struct BeginPhase {
    store: Arc<dyn KingdomStorePort>,
}

impl BeginPhase {
    pub fn new(store: Arc<dyn KingdomStorePort>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, phase: Phase) -> Result<(), TurnError> {
        self.store
            .atomic_update(Box::new(move |state| {
                state.begin_phase(phase).map(|_| ())
            }))
            .await?;
        tracing::info!(phase = %phase, "Phase begun");
        Ok(())
    }
}

pub struct CompleteStep {
    store: Arc<dyn KingdomStorePort>,
}

impl CompleteStep {
    pub fn new(store: Arc<dyn KingdomStorePort>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, phase: Phase, step_id: &str) -> Result<(), TurnError> {
        let owned_step = step_id.to_string();
        self.store
            .atomic_update(Box::new(move |state| {
                state.complete_step(phase, &owned_step).map(|_| ())
            }))
            .await?;
        tracing::info!(phase = %phase, step_id, "Phase step completed");
        Ok(())
    }
}

pub struct AdvancePhase {
    store: Arc<dyn KingdomStorePort>,
}

impl AdvancePhase {
    pub fn new(store: Arc<dyn KingdomStorePort>) -> Self {
        Self { store }
    }

    /// Advance past `from`, returning the phase now current. Advancing
    /// past Upkeep rolls the turn over.
    pub async fn execute(&self, from: Phase) -> Result<Phase, TurnError> {
        let committed = self
            .store
            .atomic_update(Box::new(move |state| {
                state.advance_phase(from).map(|_| ())
            }))
            .await?;
        let next = committed.state.current_phase();
        tracing::info!(from = %from, to = %next, "Phase advanced");
        for event in &committed.events {
            if let KingdomEvent::TurnBegan { turn_number } = event {
                tracing::info!(turn_number, "Turn rolled over");
            }
        }
        Ok(next)
    }
}

/// The turn-structure use cases, bundled for composition.
pub struct TurnUseCases {
    pub begin_phase: Arc<BeginPhase>,
    pub complete_step: Arc<CompleteStep>,
    pub advance_phase: Arc<AdvancePhase>,
}

impl TurnUseCases {
    pub fn new(begin_phase: BeginPhase, complete_step: CompleteStep, advance_phase: AdvancePhase) -> Self {
        Self {
            begin_phase: Arc::new(begin_phase),
            complete_step: Arc::new(complete_step),
            advance_phase: Arc::new(advance_phase),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for TurnError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(domain) => TurnError::Domain(domain),
            StoreError::Unavailable(message) => TurnError::StoreUnavailable(message),
        }
    }
}
