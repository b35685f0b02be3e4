//! Aid-another use case.
//!
//! Aid is a secondary roll against a flat DC, taken while someone else's
//! attempt is active. Its bonus folds into the target's roll when it is
//! still pending at roll time; landing after the roll, it becomes a
//! manual effect line on the target's preview instead.

use std::sync::Arc;

use regent_domain::{
    AidContribution, CheckId, CheckInstanceId, DegreeOfSuccess, DomainError, InstanceStatus,
    KingdomEvent, PlayerId, ProficiencyRank,
};

use crate::infrastructure::ports::{
    CheckCatalogPort, CheckRollPort, ClockPort, KingdomStorePort, RollError, RollRequest,
    StoreError,
};
use crate::use_cases::check::build_resolution;

pub struct AidCheck {
    store: Arc<dyn KingdomStorePort>,
    roll: Arc<dyn CheckRollPort>,
    catalog: Arc<dyn CheckCatalogPort>,
    clock: Arc<dyn ClockPort>,
    aid_dc: i32,
}

impl AidCheck {
    pub fn new(
        store: Arc<dyn KingdomStorePort>,
        roll: Arc<dyn CheckRollPort>,
        catalog: Arc<dyn CheckCatalogPort>,
        clock: Arc<dyn ClockPort>,
        aid_dc: i32,
    ) -> Self {
        Self {
            store,
            roll,
            catalog,
            clock,
            aid_dc,
        }
    }

    /// Roll an aid check toward another player's active attempt on
    /// `check_id` and record the contribution.
    pub async fn execute(
        &self,
        contributor: PlayerId,
        contributor_name: &str,
        check_id: CheckId,
        skill: &str,
        rank: ProficiencyRank,
    ) -> Result<AidContribution, AidError> {
        // 1. There must be something to aid before the dice come out.
        let definition = self
            .catalog
            .get(&check_id)
            .ok_or_else(|| AidError::UnknownCheck(check_id.clone()))?;
        let state = self.store.read().await?;
        if !state.instances().iter().any(|i| i.check_id() == &check_id) {
            return Err(AidError::NoActiveTarget(check_id));
        }

        // 2. Roll against the flat aid DC. No modifiers are tracked for
        //    aid rolls; rank only matters for the bonus.
        let reply = self
            .roll
            .request_roll(RollRequest {
                check_id: check_id.clone(),
                check_name: format!("Aid: {}", definition.name()),
                actor_name: contributor_name.to_string(),
                skill: skill.to_string(),
                dc: self.aid_dc,
                modifiers: Vec::new(),
            })
            .await?;
        let contribution = AidContribution::new(
            contributor,
            contributor_name,
            check_id.clone(),
            skill,
            rank,
            reply.outcome,
            self.clock.now(),
        );

        // 3. Record it, refreshing any previewed target so the new line
        //    shows up without a re-roll. A vanished target still commits,
        //    so the discard event reaches subscribers.
        let committed = {
            let recorded = contribution.clone();
            let check_id = check_id.clone();
            let definition = definition.clone();
            self.store
                .atomic_update(Box::new(move |state| {
                    if !state.record_aid(recorded) {
                        return Ok(());
                    }
                    let targets: Vec<(CheckInstanceId, DegreeOfSuccess)> = state
                        .instances()
                        .iter()
                        .filter(|i| {
                            i.check_id() == &check_id && i.status() == InstanceStatus::Previewed
                        })
                        .filter_map(|i| i.outcome().map(|outcome| (i.id(), outcome)))
                        .collect();
                    if targets.is_empty() {
                        return Ok(());
                    }
                    let pool: Vec<AidContribution> =
                        state.aid_for(&check_id).into_iter().cloned().collect();
                    for (target_id, outcome) in targets {
                        let (effect_text, resolution) =
                            build_resolution(&definition, outcome, &pool);
                        state.store_outcome(target_id, outcome, effect_text, resolution)?;
                    }
                    Ok(())
                }))
                .await?
        };

        let discarded = committed.events.iter().any(|event| {
            matches!(event, KingdomEvent::AidDiscarded { contributor: c, .. } if *c == contributor)
        });
        if discarded {
            tracing::warn!(
                check_id = %check_id,
                contributor = %contributor,
                "Aid rolled but the target was gone; contribution discarded"
            );
            return Err(AidError::Discarded(check_id));
        }

        tracing::info!(
            check_id = %check_id,
            contributor = %contributor,
            bonus = contribution.bonus(),
            "Aid recorded"
        );
        Ok(contribution)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AidError {
    #[error("Unknown check: {0}")]
    UnknownCheck(CheckId),

    #[error("No active attempt on '{0}' to aid")]
    NoActiveTarget(CheckId),

    #[error("Aid for '{0}' was discarded; the target is no longer active")]
    Discarded(CheckId),

    #[error("Roll cancelled")]
    RollCancelled,

    #[error("Roll failed: {0}")]
    RollFailed(String),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AidError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(domain) => AidError::Domain(domain),
            StoreError::Unavailable(message) => AidError::StoreUnavailable(message),
        }
    }
}

impl From<RollError> for AidError {
    fn from(err: RollError) -> Self {
        match err {
            RollError::Cancelled => AidError::RollCancelled,
            RollError::Failed(message) => AidError::RollFailed(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use async_trait::async_trait;

    use regent_domain::{
        CheckInstance, CheckKind, CheckMetadata, KingdomId, KingdomState, Resource, RollBreakdown,
    };

    use crate::infrastructure::catalog::StaticCatalog;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory_store::InMemoryKingdomStore;
    use crate::infrastructure::ports::{MockCheckRollPort, RollReply};

    fn pending_trade(state: &mut KingdomState, player: PlayerId) -> CheckInstanceId {
        let instance_id = CheckInstanceId::new();
        state
            .create_instance(CheckInstance::new(
                instance_id,
                CheckId::new("trade-commodities"),
                CheckKind::Action,
                player,
                "Valerie",
                "trade",
                CheckMetadata::new(),
                1,
                Utc::now(),
            ))
            .unwrap();
        instance_id
    }

    fn build_use_case(
        initial: KingdomState,
        roll: MockCheckRollPort,
    ) -> (AidCheck, Arc<InMemoryKingdomStore>) {
        let store = Arc::new(InMemoryKingdomStore::new(initial, 16));
        let use_case = AidCheck::new(
            store.clone(),
            Arc::new(roll),
            Arc::new(StaticCatalog::builtin()),
            Arc::new(FixedClock(Utc::now())),
            15,
        );
        (use_case, store)
    }

    fn reply(outcome: DegreeOfSuccess) -> RollReply {
        RollReply {
            outcome,
            breakdown: RollBreakdown::new(14, 0, 14, 15),
        }
    }

    #[tokio::test]
    async fn aid_success_records_bonus() {
        let mut initial = KingdomState::new(KingdomId::new(), "Greenbelt");
        pending_trade(&mut initial, PlayerId::new());
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .withf(|request| {
                request.dc == 15
                    && request.modifiers.is_empty()
                    && request.check_name == "Aid: Trade Commodities"
            })
            .times(1)
            .returning(|_| Ok(reply(DegreeOfSuccess::Success)));
        let (use_case, store) = build_use_case(initial, roll);

        let contribution = use_case
            .execute(
                PlayerId::new(),
                "Bren",
                CheckId::new("trade-commodities"),
                "trade",
                ProficiencyRank::Trained,
            )
            .await
            .unwrap();

        assert_eq!(contribution.bonus(), 1);
        let state = store.read().await.unwrap();
        assert_eq!(state.aid_for(&CheckId::new("trade-commodities")).len(), 1);
    }

    #[tokio::test]
    async fn aid_on_previewed_target_refreshes_preview() {
        let catalog = StaticCatalog::builtin();
        let mut initial = KingdomState::new(KingdomId::new(), "Greenbelt");
        let instance_id = pending_trade(&mut initial, PlayerId::new());
        let definition = catalog.get(&CheckId::new("trade-commodities")).unwrap();
        let (effect_text, resolution) =
            build_resolution(&definition, DegreeOfSuccess::Success, &[]);
        initial
            .store_outcome(instance_id, DegreeOfSuccess::Success, effect_text, resolution)
            .unwrap();

        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .returning(|_| Ok(reply(DegreeOfSuccess::CriticalSuccess)));
        let (use_case, store) = build_use_case(initial, roll);

        use_case
            .execute(
                PlayerId::new(),
                "Bren",
                CheckId::new("trade-commodities"),
                "trade",
                ProficiencyRank::Master,
            )
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        let resolution = state
            .instance(instance_id)
            .and_then(CheckInstance::resolution)
            .expect("resolution");
        assert_eq!(resolution.manual_effects().len(), 1);
        assert_eq!(resolution.manual_effects()[0], "Aid from Bren (trade): +3");
        // The refreshed preview keeps the original outcome's numbers.
        assert_eq!(resolution.net_delta(Resource::Gold), 2);
    }

    #[tokio::test]
    async fn aid_without_target_is_rejected_before_rolling() {
        let initial = KingdomState::new(KingdomId::new(), "Greenbelt");
        // No expectations: the roller must never be reached.
        let (use_case, _store) = build_use_case(initial, MockCheckRollPort::new());

        let err = use_case
            .execute(
                PlayerId::new(),
                "Bren",
                CheckId::new("trade-commodities"),
                "trade",
                ProficiencyRank::Trained,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AidError::NoActiveTarget(_)));
    }

    /// Roll port that clears the aid target mid-roll, standing in for the
    /// target confirming or cancelling while the aid dice are out.
    struct ClearingRoller {
        store: Arc<InMemoryKingdomStore>,
        target: CheckInstanceId,
    }

    #[async_trait]
    impl CheckRollPort for ClearingRoller {
        async fn request_roll(&self, _request: RollRequest) -> Result<RollReply, RollError> {
            let target = self.target;
            self.store
                .atomic_update(Box::new(move |state| {
                    state.cancel_check(target).map(|_| ())
                }))
                .await
                .map_err(RollError::failed)?;
            Ok(reply(DegreeOfSuccess::Success))
        }
    }

    #[tokio::test]
    async fn aid_discarded_when_target_vanishes_during_roll() {
        let mut initial = KingdomState::new(KingdomId::new(), "Greenbelt");
        let target = pending_trade(&mut initial, PlayerId::new());
        let store = Arc::new(InMemoryKingdomStore::new(initial, 16));
        let use_case = AidCheck::new(
            store.clone(),
            Arc::new(ClearingRoller {
                store: store.clone(),
                target,
            }),
            Arc::new(StaticCatalog::builtin()),
            Arc::new(FixedClock(Utc::now())),
            15,
        );

        let err = use_case
            .execute(
                PlayerId::new(),
                "Bren",
                CheckId::new("trade-commodities"),
                "trade",
                ProficiencyRank::Trained,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AidError::Discarded(_)));
        let state = store.read().await.unwrap();
        assert!(state.aid_for(&CheckId::new("trade-commodities")).is_empty());
    }

    #[tokio::test]
    async fn aid_roll_cancelled_propagates() {
        let mut initial = KingdomState::new(KingdomId::new(), "Greenbelt");
        pending_trade(&mut initial, PlayerId::new());
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .returning(|_| Err(RollError::Cancelled));
        let (use_case, store) = build_use_case(initial, roll);

        let err = use_case
            .execute(
                PlayerId::new(),
                "Bren",
                CheckId::new("trade-commodities"),
                "trade",
                ProficiencyRank::Trained,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AidError::RollCancelled));
        assert!(store
            .read()
            .await
            .unwrap()
            .aid_for(&CheckId::new("trade-commodities"))
            .is_empty());
    }
}
