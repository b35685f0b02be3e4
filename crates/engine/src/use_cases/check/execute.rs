//! Execute-check use case.

use std::sync::Arc;

use regent_domain::{
    AidContribution, CheckDefinition, CheckId, CheckInstance, CheckInstanceId, CheckMetadata,
    DomainError, KingdomState, PlayerId, SelectionValue,
};

use crate::infrastructure::ports::{CheckCatalogPort, CheckRollPort, ClockPort, KingdomStorePort};

use super::commit_rolled_preview;
use super::error::CheckError;
use super::resolution::roll_request;

/// Drives one attempt from creation through the roll to a stored preview.
///
/// The pending instance is committed before the roll is requested, so the
/// slot is held across the suspension; a roll that never completes clears
/// it again. Nothing touches the ledger until the preview is confirmed.
pub struct ExecuteCheck {
    store: Arc<dyn KingdomStorePort>,
    roll: Arc<dyn CheckRollPort>,
    catalog: Arc<dyn CheckCatalogPort>,
    clock: Arc<dyn ClockPort>,
}

impl ExecuteCheck {
    pub fn new(
        store: Arc<dyn KingdomStorePort>,
        roll: Arc<dyn CheckRollPort>,
        catalog: Arc<dyn CheckCatalogPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            roll,
            catalog,
            clock,
        }
    }

    /// Start and roll an attempt.
    ///
    /// # Arguments
    /// * `player` - Initiating player; owns the attempt's slot
    /// * `actor_name` - Display name the attempt is rolled under
    /// * `check_id` - Catalog entry to attempt
    /// * `skill` - Skill to roll with; must be one the entry lists
    /// * `selection` - Pre-roll target, where the entry requires one
    ///
    /// # Returns
    /// The id of the new instance, left previewed for confirmation.
    pub async fn execute(
        &self,
        player: PlayerId,
        actor_name: &str,
        check_id: CheckId,
        skill: &str,
        selection: Option<SelectionValue>,
    ) -> Result<CheckInstanceId, CheckError> {
        // 1. Resolve the catalog entry and validate the request shape.
        let definition = self
            .catalog
            .get(&check_id)
            .ok_or_else(|| CheckError::UnknownCheck(check_id.clone()))?;
        validate_request(&definition, skill, selection.as_ref())?;

        // 2. Commit the pending instance; the slot guard runs against the
        //    store's working copy, not a stale read.
        let instance_id = CheckInstanceId::new();
        let created_at = self.clock.now();
        let committed = {
            let check_id = check_id.clone();
            let kind = definition.kind();
            let actor_name = actor_name.to_string();
            let skill = skill.to_string();
            self.store
                .atomic_update(Box::new(move |state| {
                    let metadata = build_metadata(state, selection)?;
                    state.create_instance(CheckInstance::new(
                        instance_id,
                        check_id,
                        kind,
                        player,
                        actor_name,
                        skill,
                        metadata,
                        state.turn_number(),
                        created_at,
                    ))
                }))
                .await?
        };
        tracing::info!(
            instance_id = %instance_id,
            check_id = %check_id,
            player = %player,
            "Check attempt started"
        );

        // 3. Fold the aid pool as it stood at creation into the roll.
        let folded: Vec<AidContribution> = committed
            .state
            .aid_for(&check_id)
            .into_iter()
            .cloned()
            .collect();
        let request = roll_request(&definition, actor_name, skill, &folded);

        // 4. Wait for the roll. An abandoned roll releases the slot.
        let reply = match self.roll.request_roll(request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.discard_attempt(instance_id).await;
                return Err(err.into());
            }
        };
        tracing::info!(
            instance_id = %instance_id,
            outcome = %reply.outcome,
            die = reply.breakdown.die(),
            total = reply.breakdown.total(),
            "Check rolled"
        );

        // 5. Record the roll and store the computed preview in one commit.
        commit_rolled_preview(self.store.as_ref(), definition, instance_id, reply, folded).await?;

        Ok(instance_id)
    }

    /// Clear an attempt whose roll never completed. A failure here is
    /// logged and swallowed; the roll error is what the caller surfaces.
    async fn discard_attempt(&self, instance_id: CheckInstanceId) {
        let result = self
            .store
            .atomic_update(Box::new(move |state| {
                state.clear_instance(instance_id).map(|_| ())
            }))
            .await;
        if let Err(err) = result {
            tracing::warn!(
                instance_id = %instance_id,
                error = %err,
                "Failed to clear attempt after abandoned roll"
            );
        }
    }
}

fn validate_request(
    definition: &CheckDefinition,
    skill: &str,
    selection: Option<&SelectionValue>,
) -> Result<(), CheckError> {
    if !definition.skills().iter().any(|s| s == skill) {
        return Err(DomainError::validation(format!(
            "Check '{}' cannot be rolled with {skill}",
            definition.id()
        ))
        .into());
    }
    match (definition.required_selection(), selection) {
        (None, _) => Ok(()),
        (Some(kind), Some(value)) if value.kind() == kind => Ok(()),
        (Some(kind), _) => Err(DomainError::SelectionRequired {
            check_id: definition.id().clone(),
            kind,
        }
        .into()),
    }
}

fn build_metadata(
    state: &KingdomState,
    selection: Option<SelectionValue>,
) -> Result<CheckMetadata, DomainError> {
    let Some(selection) = selection else {
        return Ok(CheckMetadata::new());
    };
    if let SelectionValue::Settlement { settlement_id } = &selection {
        if state.settlement(*settlement_id).is_none() {
            return Err(DomainError::validation(format!(
                "Unknown settlement: {settlement_id}"
            )));
        }
    }
    Ok(CheckMetadata::new().with_selection(selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use regent_domain::{
        CheckKind, DegreeOfSuccess, InstanceStatus, KingdomId, ProficiencyRank, Resource,
        RollBreakdown, SettlementId,
    };

    use crate::infrastructure::catalog::StaticCatalog;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory_store::InMemoryKingdomStore;
    use crate::infrastructure::ports::{MockCheckRollPort, RollError, RollReply, RollRequest};

    fn kingdom() -> KingdomState {
        KingdomState::new(KingdomId::new(), "Greenbelt")
            .with_balance(Resource::Gold, 5)
            .with_balance(Resource::Food, 4)
            .with_settlement("Stagfell")
    }

    fn build_use_case(
        initial: KingdomState,
        roll: MockCheckRollPort,
    ) -> (ExecuteCheck, Arc<InMemoryKingdomStore>) {
        let store = Arc::new(InMemoryKingdomStore::new(initial, 16));
        let use_case = ExecuteCheck::new(
            store.clone(),
            Arc::new(roll),
            Arc::new(StaticCatalog::builtin()),
            Arc::new(FixedClock(Utc::now())),
        );
        (use_case, store)
    }

    fn reply(outcome: DegreeOfSuccess, die: i32, modifier: i32, dc: i32) -> RollReply {
        RollReply {
            outcome,
            breakdown: RollBreakdown::new(die, modifier, die + modifier, dc),
        }
    }

    fn trade_aid(contributor: PlayerId) -> AidContribution {
        AidContribution::new(
            contributor,
            "Bren",
            CheckId::new("trade-commodities"),
            "trade",
            ProficiencyRank::Trained,
            DegreeOfSuccess::Success,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn when_roll_succeeds_then_attempt_is_previewed() {
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .withf(|request| request.check_id.as_str() == "trade-commodities" && request.dc == 14)
            .times(1)
            .returning(|_| Ok(reply(DegreeOfSuccess::Success, 12, 0, 14)));
        let (use_case, store) = build_use_case(kingdom(), roll);
        let player = PlayerId::new();

        let instance_id = use_case
            .execute(
                player,
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        let instance = state.instance(instance_id).expect("instance");
        assert_eq!(instance.status(), InstanceStatus::Previewed);
        assert_eq!(instance.outcome(), Some(DegreeOfSuccess::Success));
        assert_eq!(
            instance.effect_text(),
            Some("Caravans return with a tidy profit.")
        );
        let resolution = instance.resolution().expect("resolution");
        assert_eq!(resolution.net_delta(Resource::Gold), 2);
        // Nothing is applied until the player confirms.
        assert_eq!(state.ledger().amount(Resource::Gold), 5);
    }

    #[tokio::test]
    async fn when_check_is_unknown_then_nothing_is_written() {
        let (use_case, store) = build_use_case(kingdom(), MockCheckRollPort::new());

        let err = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("raise-the-dead"),
                "magic",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::UnknownCheck(_)));
        assert!(store.read().await.unwrap().instances().is_empty());
    }

    #[tokio::test]
    async fn when_skill_is_not_listed_then_request_is_rejected() {
        let (use_case, store) = build_use_case(kingdom(), MockCheckRollPort::new());

        let err = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("trade-commodities"),
                "warfare",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::Validation(_))
        ));
        assert!(store.read().await.unwrap().instances().is_empty());
    }

    #[tokio::test]
    async fn when_required_selection_is_missing_then_request_is_rejected() {
        let (use_case, _store) = build_use_case(kingdom(), MockCheckRollPort::new());

        let err = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("build-structure"),
                "engineering",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::SelectionRequired { .. })
        ));
    }

    #[tokio::test]
    async fn when_selection_matches_then_it_is_stored_on_the_instance() {
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .returning(|_| Ok(reply(DegreeOfSuccess::Failure, 4, 0, 15)));
        let initial = kingdom();
        let settlement_id = initial.settlements()[0].id();
        let (use_case, store) = build_use_case(initial, roll);

        let instance_id = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("build-structure"),
                "engineering",
                Some(SelectionValue::Settlement { settlement_id }),
            )
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        let instance = state.instance(instance_id).expect("instance");
        assert!(matches!(
            instance.metadata().selection(),
            Some(SelectionValue::Settlement { settlement_id: found }) if *found == settlement_id
        ));
    }

    #[tokio::test]
    async fn when_selected_settlement_is_unknown_then_request_is_rejected() {
        let (use_case, store) = build_use_case(kingdom(), MockCheckRollPort::new());

        let err = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("build-structure"),
                "engineering",
                Some(SelectionValue::Settlement {
                    settlement_id: SettlementId::new(),
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::Validation(_))
        ));
        assert!(store.read().await.unwrap().instances().is_empty());
    }

    #[tokio::test]
    async fn when_slot_is_held_then_second_attempt_is_rejected() {
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .times(1)
            .returning(|_| Ok(reply(DegreeOfSuccess::Success, 12, 0, 14)));
        let (use_case, _store) = build_use_case(kingdom(), roll);
        let player = PlayerId::new();

        use_case
            .execute(
                player,
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap();
        let err = use_case
            .execute(
                player,
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::DuplicateInstance { .. })
        ));
    }

    #[tokio::test]
    async fn when_roll_is_cancelled_then_slot_is_released() {
        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .times(1)
            .returning(|_| Err(RollError::Cancelled));
        let (use_case, store) = build_use_case(kingdom(), roll);

        let err = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::RollCancelled));
        assert!(store.read().await.unwrap().instances().is_empty());
    }

    #[tokio::test]
    async fn when_aid_is_pending_then_it_folds_into_the_roll() {
        let mut initial = kingdom();
        // Another player already has an attempt open, which is what lets
        // the contribution be recorded ahead of this one.
        initial
            .create_instance(CheckInstance::new(
                CheckInstanceId::new(),
                CheckId::new("trade-commodities"),
                CheckKind::Action,
                PlayerId::new(),
                "Valerie",
                "trade",
                CheckMetadata::new(),
                1,
                Utc::now(),
            ))
            .unwrap();
        assert!(initial.record_aid(trade_aid(PlayerId::new())));

        let mut roll = MockCheckRollPort::new();
        roll.expect_request_roll()
            .withf(|request| request.modifiers.len() == 1 && request.modifier_total() == 1)
            .times(1)
            .returning(|_| Ok(reply(DegreeOfSuccess::Success, 13, 1, 14)));
        let (use_case, store) = build_use_case(initial, roll);

        let instance_id = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        // Folded aid is consumed, not repeated as a manual line.
        assert!(state.aid_for(&CheckId::new("trade-commodities")).is_empty());
        let resolution = state
            .instance(instance_id)
            .and_then(CheckInstance::resolution)
            .expect("resolution");
        assert!(resolution.manual_effects().is_empty());
    }

    /// Roll port that records an aid contribution mid-roll, standing in
    /// for a contribution landing while the roll surface is open.
    struct AidingRoller {
        store: Arc<InMemoryKingdomStore>,
        contribution: Mutex<Option<AidContribution>>,
    }

    #[async_trait]
    impl CheckRollPort for AidingRoller {
        async fn request_roll(&self, request: RollRequest) -> Result<RollReply, RollError> {
            let contribution = self.contribution.lock().unwrap().take();
            if let Some(contribution) = contribution {
                self.store
                    .atomic_update(Box::new(move |state| {
                        state.record_aid(contribution);
                        Ok(())
                    }))
                    .await
                    .map_err(RollError::failed)?;
            }
            Ok(reply(DegreeOfSuccess::Success, 12, 0, request.dc))
        }
    }

    #[tokio::test]
    async fn when_aid_arrives_during_the_roll_then_it_shows_as_a_manual_line() {
        let store = Arc::new(InMemoryKingdomStore::new(kingdom(), 16));
        let contribution = trade_aid(PlayerId::new());
        let roller = AidingRoller {
            store: store.clone(),
            contribution: Mutex::new(Some(contribution.clone())),
        };
        let use_case = ExecuteCheck::new(
            store.clone(),
            Arc::new(roller),
            Arc::new(StaticCatalog::builtin()),
            Arc::new(FixedClock(Utc::now())),
        );

        let instance_id = use_case
            .execute(
                PlayerId::new(),
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        let resolution = state
            .instance(instance_id)
            .and_then(CheckInstance::resolution)
            .expect("resolution");
        assert_eq!(resolution.manual_effects().len(), 1);
        assert_eq!(resolution.manual_effects()[0], contribution.label());
        // The contribution stays pending until apply or cancel discards it.
        assert_eq!(state.aid_for(&CheckId::new("trade-commodities")).len(), 1);
    }
}
