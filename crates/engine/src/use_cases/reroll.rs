//! Reroll use case.
//!
//! A reroll spends fame to retry an active attempt: the old instance is
//! dropped, a fresh one takes its slot, and the dice go out again.
//! Pending aid stays put so it folds into the new roll.

use std::sync::Arc;

use regent_domain::{AidContribution, CheckInstance, CheckInstanceId, DomainError, PlayerId};

use crate::infrastructure::ports::{
    CheckCatalogPort, CheckRollPort, ClockPort, KingdomStorePort,
};
use crate::use_cases::check::{commit_rolled_preview, roll_request, CheckError};

pub struct RerollCheck {
    store: Arc<dyn KingdomStorePort>,
    roll: Arc<dyn CheckRollPort>,
    catalog: Arc<dyn CheckCatalogPort>,
    clock: Arc<dyn ClockPort>,
    fame_cost: i64,
}

impl RerollCheck {
    pub fn new(
        store: Arc<dyn KingdomStorePort>,
        roll: Arc<dyn CheckRollPort>,
        catalog: Arc<dyn CheckCatalogPort>,
        clock: Arc<dyn ClockPort>,
        fame_cost: i64,
    ) -> Self {
        Self {
            store,
            roll,
            catalog,
            clock,
            fame_cost,
        }
    }

    /// Retry an active attempt, returning the replacement's id.
    pub async fn execute(
        &self,
        instance_id: CheckInstanceId,
        requested_by: PlayerId,
        facilitator: bool,
    ) -> Result<CheckInstanceId, CheckError> {
        // 1. Read the attempt being retried. Its identity fields are fixed
        //    for the instance's lifetime, so the replacement can be built
        //    up front; a racing change still aborts the swap below.
        let state = self.store.read().await?;
        let old = match state.instance(instance_id) {
            Some(instance) => instance,
            None if state.log_has_instance(instance_id) => {
                return Err(DomainError::AlreadyApplied(instance_id).into());
            }
            None => return Err(DomainError::InstanceNotFound(instance_id).into()),
        };
        if !facilitator && old.initiated_by() != requested_by {
            return Err(DomainError::validation(
                "Only the initiating player or the facilitator may reroll an attempt",
            )
            .into());
        }
        let definition = self
            .catalog
            .get(old.check_id())
            .ok_or_else(|| CheckError::UnknownCheck(old.check_id().clone()))?;
        let replacement = CheckInstance::new(
            CheckInstanceId::new(),
            old.check_id().clone(),
            old.kind(),
            old.initiated_by(),
            old.actor_name(),
            old.skill(),
            old.metadata().clone(),
            state.turn_number(),
            self.clock.now(),
        );
        let new_id = replacement.id();
        let check_id = replacement.check_id().clone();
        let actor_name = replacement.actor_name().to_string();
        let skill = replacement.skill().to_string();

        // 2. Debit the fame and swap the instances in one commit.
        let cost = self.fame_cost;
        let committed = self
            .store
            .atomic_update(Box::new(move |state| {
                state.begin_reroll(instance_id, replacement, cost).map(|_| ())
            }))
            .await?;
        tracing::info!(
            instance_id = %new_id,
            replaced = %instance_id,
            check_id = %check_id,
            "Check rerolled"
        );

        // 3. Roll again with whatever aid is pending now.
        let folded: Vec<AidContribution> = committed
            .state
            .aid_for(&check_id)
            .into_iter()
            .cloned()
            .collect();
        let request = roll_request(&definition, &actor_name, &skill, &folded);

        // 4. An abandoned roll takes the replacement back out and refunds
        //    the fame, as if the reroll was never requested.
        let reply = match self.roll.request_roll(request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.rollback(new_id).await;
                return Err(err.into());
            }
        };

        // 5. Record the new roll and preview.
        commit_rolled_preview(self.store.as_ref(), definition, new_id, reply, folded).await?;

        Ok(new_id)
    }

    async fn rollback(&self, new_id: CheckInstanceId) {
        let cost = self.fame_cost;
        let result = self
            .store
            .atomic_update(Box::new(move |state| {
                state.abort_reroll(new_id, cost);
                Ok(())
            }))
            .await;
        if let Err(err) = result {
            tracing::warn!(
                instance_id = %new_id,
                error = %err,
                "Failed to roll back an abandoned reroll"
            );
        }
    }
}
