//! The participant hub.
//!
//! The hub is the engine's session boundary: hosts register participants,
//! forward their signals, and read events off each participant's channel.
//! Role checks happen here, before a signal reaches a use case, and every
//! committed store update fans back out as events plus a fresh snapshot.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use regent_domain::{
    CheckId, CheckInstanceId, CheckKind, DomainError, PlayerId, ResolutionData, SelectionValue,
    SettlementId,
};
use regent_shared::{
    ClientSignal, ParticipantInfo, ParticipantRole, ResolutionEdit, SelectionData, ServerEvent,
};

use crate::infrastructure::ports::{CheckCatalogPort, Committed, KingdomStorePort, StoreError};
use crate::session::views;
use crate::use_cases::{AidCheck, AidError, CheckError, CheckUseCases, RerollCheck, TurnError, TurnUseCases};

/// Events buffered per participant before the hub starts dropping them.
const PARTICIPANT_BUFFER: usize = 64;

struct Participant {
    info: ParticipantInfo,
    sender: mpsc::Sender<ServerEvent>,
}

pub struct ParticipantHub {
    store: Arc<dyn KingdomStorePort>,
    catalog: Arc<dyn CheckCatalogPort>,
    checks: Arc<CheckUseCases>,
    aid: Arc<AidCheck>,
    reroll: Arc<RerollCheck>,
    turn: Arc<TurnUseCases>,
    participants: DashMap<Uuid, Participant>,
}

impl ParticipantHub {
    pub fn new(
        store: Arc<dyn KingdomStorePort>,
        catalog: Arc<dyn CheckCatalogPort>,
        checks: Arc<CheckUseCases>,
        aid: Arc<AidCheck>,
        reroll: Arc<RerollCheck>,
        turn: Arc<TurnUseCases>,
    ) -> Self {
        Self {
            store,
            catalog,
            checks,
            aid,
            reroll,
            turn,
            participants: DashMap::new(),
        }
    }

    /// Spawn the fan-out task that relays committed updates to every
    /// participant. Call once, from inside the runtime.
    pub fn start(self: &Arc<Self>) {
        let hub = self.clone();
        let mut commits = self.store.subscribe();
        tokio::spawn(async move {
            loop {
                match commits.recv().await {
                    Ok(committed) => hub.fan_out(&committed),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Hub lagged behind store commits");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Store subscription closed; hub fan-out stopped");
        });
    }

    /// Register a participant. The returned receiver starts with a
    /// `Welcome` carrying the catalog and the current snapshot; everyone
    /// already present hears `ParticipantJoined`.
    pub async fn join(
        &self,
        name: &str,
        role: ParticipantRole,
    ) -> Result<(ParticipantInfo, mpsc::Receiver<ServerEvent>), StoreError> {
        let state = self.store.read().await?;
        let info = ParticipantInfo {
            participant_id: Uuid::new_v4(),
            name: name.to_string(),
            role,
        };
        let (sender, receiver) = mpsc::channel(PARTICIPANT_BUFFER);
        let welcome = ServerEvent::Welcome {
            participant: info.clone(),
            catalog: self
                .catalog
                .list()
                .iter()
                .map(|definition| views::check_summary(definition))
                .collect(),
            state: views::kingdom_view(&state, self.catalog.as_ref()),
        };
        // The fresh channel has room for the welcome.
        let _ = sender.try_send(welcome);
        self.broadcast(&ServerEvent::ParticipantJoined {
            participant: info.clone(),
        });
        self.participants.insert(
            info.participant_id,
            Participant {
                info: info.clone(),
                sender,
            },
        );
        tracing::info!(
            participant_id = %info.participant_id,
            name = %info.name,
            role = ?info.role,
            "Participant joined"
        );
        Ok((info, receiver))
    }

    /// Deregister a participant and tell the rest.
    pub fn leave(&self, participant_id: Uuid) {
        if let Some((_, participant)) = self.participants.remove(&participant_id) {
            self.broadcast(&ServerEvent::ParticipantLeft { participant_id });
            tracing::info!(
                participant_id = %participant_id,
                name = %participant.info.name,
                "Participant left"
            );
        }
    }

    /// Handle one signal on behalf of a participant. Rejections go back to
    /// the sender alone; state changes reach everyone via the fan-out.
    pub async fn handle_signal(&self, participant_id: Uuid, signal: ClientSignal) {
        tracing::debug!(
            participant_id = %participant_id,
            signal = signal.name(),
            "Signal received"
        );
        if let Err(err) = self.dispatch(participant_id, signal).await {
            if err.quiet() {
                tracing::debug!(
                    participant_id = %participant_id,
                    error = %err,
                    "Signal dropped quietly"
                );
                return;
            }
            self.send_to(
                participant_id,
                ServerEvent::Rejected {
                    code: err.code().to_string(),
                    message: err.to_string(),
                },
            );
        }
    }

    async fn dispatch(
        &self,
        participant_id: Uuid,
        signal: ClientSignal,
    ) -> Result<(), SignalError> {
        let (name, role) = match self.participants.get(&participant_id) {
            Some(entry) => (entry.info.name.clone(), entry.info.role),
            None => return Err(SignalError::UnknownParticipant(participant_id)),
        };
        let player = PlayerId::from_uuid(participant_id);
        let facilitator = role == ParticipantRole::Facilitator;

        match signal {
            ClientSignal::ExecuteCheck {
                check_id,
                skill,
                selection,
            } => {
                self.checks
                    .execute
                    .execute(
                        player,
                        &name,
                        CheckId::new(check_id),
                        &skill,
                        selection.map(selection_value),
                    )
                    .await?;
                Ok(())
            }
            ClientSignal::TriggerIncident {
                check_id,
                target_player_id,
                skill,
            } => {
                if !facilitator {
                    return Err(SignalError::FacilitatorOnly("trigger an incident"));
                }
                let check_id = CheckId::new(check_id);
                let definition = self
                    .catalog
                    .get(&check_id)
                    .ok_or_else(|| CheckError::UnknownCheck(check_id.clone()))?;
                if definition.kind() != CheckKind::Incident {
                    return Err(CheckError::Domain(DomainError::validation(format!(
                        "Check '{check_id}' is not an incident"
                    )))
                    .into());
                }
                let target_name = self
                    .participants
                    .get(&target_player_id)
                    .map(|entry| entry.info.name.clone())
                    .unwrap_or_else(|| "Unknown ruler".to_string());
                self.checks
                    .execute
                    .execute(
                        PlayerId::from_uuid(target_player_id),
                        &target_name,
                        check_id,
                        &skill,
                        None,
                    )
                    .await?;
                Ok(())
            }
            ClientSignal::OverrideOutcome {
                instance_id,
                outcome,
            } => {
                if !facilitator {
                    return Err(SignalError::FacilitatorOnly("override an outcome"));
                }
                self.checks
                    .override_outcome
                    .execute(CheckInstanceId::from_uuid(instance_id), outcome)
                    .await?;
                Ok(())
            }
            ClientSignal::ConfirmResolution {
                instance_id,
                edited,
            } => {
                self.checks
                    .confirm
                    .execute(
                        CheckInstanceId::from_uuid(instance_id),
                        player,
                        facilitator,
                        edited.map(resolution_data),
                    )
                    .await?;
                Ok(())
            }
            ClientSignal::CancelCheck { instance_id } => {
                self.checks
                    .cancel
                    .execute(CheckInstanceId::from_uuid(instance_id), player, facilitator)
                    .await?;
                Ok(())
            }
            ClientSignal::AidCheck {
                check_id,
                skill,
                rank,
            } => {
                self.aid
                    .execute(player, &name, CheckId::new(check_id), &skill, rank)
                    .await?;
                Ok(())
            }
            ClientSignal::RerollCheck { instance_id } => {
                self.reroll
                    .execute(CheckInstanceId::from_uuid(instance_id), player, facilitator)
                    .await?;
                Ok(())
            }
            ClientSignal::BeginPhase { phase } => {
                if !facilitator {
                    return Err(SignalError::FacilitatorOnly("begin a phase"));
                }
                self.turn.begin_phase.execute(phase).await?;
                Ok(())
            }
            ClientSignal::CompleteStep { phase, step_id } => {
                if !facilitator {
                    return Err(SignalError::FacilitatorOnly("complete a step"));
                }
                self.turn.complete_step.execute(phase, &step_id).await?;
                Ok(())
            }
            ClientSignal::AdvancePhase { phase } => {
                if !facilitator {
                    return Err(SignalError::FacilitatorOnly("advance the phase"));
                }
                self.turn.advance_phase.execute(phase).await?;
                Ok(())
            }
            ClientSignal::RequestState => {
                let (revision, state) = self.store.read_with_revision().await?;
                self.send_to(
                    participant_id,
                    ServerEvent::StateChanged {
                        revision,
                        state: views::kingdom_view(&state, self.catalog.as_ref()),
                    },
                );
                Ok(())
            }
            ClientSignal::Heartbeat => {
                self.send_to(participant_id, ServerEvent::Heartbeat);
                Ok(())
            }
            ClientSignal::Unknown => Err(SignalError::Unsupported),
        }
    }

    fn fan_out(&self, committed: &Committed) {
        tracing::debug!(
            revision = committed.revision,
            events = committed.events.len(),
            "Fanning out commit"
        );
        for event in &committed.events {
            self.broadcast(&views::server_event(event));
        }
        self.broadcast(&ServerEvent::StateChanged {
            revision: committed.revision,
            state: views::kingdom_view(&committed.state, self.catalog.as_ref()),
        });
    }

    fn broadcast(&self, event: &ServerEvent) {
        for entry in self.participants.iter() {
            self.deliver(entry.value(), event.clone());
        }
    }

    fn send_to(&self, participant_id: Uuid, event: ServerEvent) {
        if let Some(entry) = self.participants.get(&participant_id) {
            self.deliver(entry.value(), event);
        }
    }

    fn deliver(&self, participant: &Participant, event: ServerEvent) {
        if participant.sender.try_send(event).is_err() {
            tracing::warn!(
                participant_id = %participant.info.participant_id,
                "Dropping event for slow participant"
            );
        }
    }
}

fn selection_value(selection: SelectionData) -> SelectionValue {
    match selection {
        SelectionData::Settlement { settlement_id } => SelectionValue::Settlement {
            settlement_id: SettlementId::from_uuid(settlement_id),
        },
        SelectionData::Structure { structure_name } => {
            SelectionValue::Structure { structure_name }
        }
        SelectionData::Faction { faction_name } => SelectionValue::Faction { faction_name },
    }
}

fn resolution_data(edit: ResolutionEdit) -> ResolutionData {
    let mut resolution = ResolutionData::new();
    for delta in edit.numeric_modifiers {
        resolution = resolution.with_modifier(delta.resource, delta.value);
    }
    for line in edit.manual_effects {
        resolution = resolution.with_manual_effect(line);
    }
    resolution
}

/// A rejected signal, with a stable code for hosts to branch on.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(Uuid),

    #[error("Only the facilitator may {0}")]
    FacilitatorOnly(&'static str),

    #[error("This engine does not understand that signal")]
    Unsupported,

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Aid(#[from] AidError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SignalError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownParticipant(_) => "unknownParticipant",
            Self::FacilitatorOnly(_) => "facilitatorOnly",
            Self::Unsupported => "unsupportedSignal",
            Self::Check(err) => check_code(err),
            Self::Aid(err) => aid_code(err),
            Self::Turn(err) => turn_code(err),
            Self::Store(err) => store_code(err),
        }
    }

    /// A cancelled roll is the participant changing their mind, not a
    /// fault worth a rejection event.
    fn quiet(&self) -> bool {
        matches!(
            self,
            Self::Check(CheckError::RollCancelled) | Self::Aid(AidError::RollCancelled)
        )
    }
}

fn check_code(err: &CheckError) -> &'static str {
    match err {
        CheckError::UnknownCheck(_) => "unknownCheck",
        CheckError::RollCancelled => "rollCancelled",
        CheckError::RollFailed(_) => "rollFailed",
        CheckError::Domain(domain) => domain_code(domain),
        CheckError::StoreUnavailable(_) => "storeUnavailable",
    }
}

fn aid_code(err: &AidError) -> &'static str {
    match err {
        AidError::UnknownCheck(_) => "unknownCheck",
        AidError::NoActiveTarget(_) => "noActiveTarget",
        AidError::Discarded(_) => "aidDiscarded",
        AidError::RollCancelled => "rollCancelled",
        AidError::RollFailed(_) => "rollFailed",
        AidError::Domain(domain) => domain_code(domain),
        AidError::StoreUnavailable(_) => "storeUnavailable",
    }
}

fn turn_code(err: &TurnError) -> &'static str {
    match err {
        TurnError::Domain(domain) => domain_code(domain),
        TurnError::StoreUnavailable(_) => "storeUnavailable",
    }
}

fn store_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::Rejected(domain) => domain_code(domain),
        StoreError::Unavailable(_) => "storeUnavailable",
    }
}

fn domain_code(err: &DomainError) -> &'static str {
    match err {
        DomainError::DuplicateInstance { .. } => "duplicateInstance",
        DomainError::AlreadyApplied(_) => "alreadyApplied",
        DomainError::PhaseMismatch { .. } => "phaseMismatch",
        DomainError::StepsIncomplete(_) => "stepsIncomplete",
        DomainError::RequirementsNotMet { .. } => "requirementsNotMet",
        DomainError::InsufficientResource { .. } => "insufficientResource",
        DomainError::ActionAlreadyTaken(_) => "actionAlreadyTaken",
        DomainError::InstanceNotFound(_) => "instanceNotFound",
        DomainError::SelectionRequired { .. } => "selectionRequired",
        DomainError::UnknownStep { .. } => "unknownStep",
        DomainError::InvalidTransition(_) => "invalidTransition",
        DomainError::Validation(_) => "validation",
    }
}
