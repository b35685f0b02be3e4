//! Cancel-check use case.

use std::sync::Arc;

use regent_domain::{CheckInstanceId, DomainError, PlayerId};

use crate::infrastructure::ports::KingdomStorePort;

use super::error::CheckError;

/// Abandons an active attempt, releasing its slot and discarding any
/// pending aid aimed at it. Nothing is written to the ledger or the log.
pub struct CancelCheck {
    store: Arc<dyn KingdomStorePort>,
}

impl CancelCheck {
    pub fn new(store: Arc<dyn KingdomStorePort>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        instance_id: CheckInstanceId,
        requested_by: PlayerId,
        facilitator: bool,
    ) -> Result<(), CheckError> {
        self.store
            .atomic_update(Box::new(move |state| {
                let instance = state
                    .instance(instance_id)
                    .ok_or(DomainError::InstanceNotFound(instance_id))?;
                if !facilitator && instance.initiated_by() != requested_by {
                    return Err(DomainError::validation(
                        "Only the initiating player or the facilitator may cancel an attempt",
                    ));
                }
                state.cancel_check(instance_id).map(|_| ())
            }))
            .await?;
        tracing::info!(
            instance_id = %instance_id,
            requested_by = %requested_by,
            "Check cancelled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use regent_domain::{
        AidContribution, CheckId, CheckInstance, CheckKind, CheckMetadata, DegreeOfSuccess,
        KingdomId, KingdomState, ProficiencyRank,
    };

    use crate::infrastructure::memory_store::InMemoryKingdomStore;

    fn seeded() -> (KingdomState, CheckInstanceId, PlayerId) {
        let mut state = KingdomState::new(KingdomId::new(), "Greenbelt");
        let player = PlayerId::new();
        let instance_id = CheckInstanceId::new();
        state
            .create_instance(CheckInstance::new(
                instance_id,
                CheckId::new("claim-territory"),
                CheckKind::Action,
                player,
                "Elara",
                "exploration",
                CheckMetadata::new(),
                1,
                Utc::now(),
            ))
            .unwrap();
        assert!(state.record_aid(AidContribution::new(
            PlayerId::new(),
            "Bren",
            CheckId::new("claim-territory"),
            "exploration",
            ProficiencyRank::Trained,
            DegreeOfSuccess::Success,
            Utc::now(),
        )));
        (state, instance_id, player)
    }

    #[tokio::test]
    async fn when_initiator_cancels_then_slot_and_aid_are_released() {
        let (state, instance_id, player) = seeded();
        let store = Arc::new(InMemoryKingdomStore::new(state, 16));
        let use_case = CancelCheck::new(store.clone());

        use_case.execute(instance_id, player, false).await.unwrap();

        let state = store.read().await.unwrap();
        assert!(state.instances().is_empty());
        assert!(state.aid_for(&CheckId::new("claim-territory")).is_empty());
        assert!(state.action_log().is_empty());
    }

    #[tokio::test]
    async fn when_a_stranger_cancels_then_rejected() {
        let (state, instance_id, _player) = seeded();
        let store = Arc::new(InMemoryKingdomStore::new(state, 16));
        let use_case = CancelCheck::new(store.clone());

        let err = use_case
            .execute(instance_id, PlayerId::new(), false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::Validation(_))
        ));
        assert_eq!(store.read().await.unwrap().instances().len(), 1);
    }

    #[tokio::test]
    async fn when_instance_is_unknown_then_not_found() {
        let (state, _instance_id, player) = seeded();
        let store = Arc::new(InMemoryKingdomStore::new(state, 16));
        let use_case = CancelCheck::new(store);

        let err = use_case
            .execute(CheckInstanceId::new(), player, false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Domain(DomainError::InstanceNotFound(_))
        ));
    }
}
