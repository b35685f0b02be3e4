//! Complex effect execution.

use std::sync::Arc;

use async_trait::async_trait;

use regent_domain::{ComplexAction, KingdomId};

use crate::infrastructure::ports::{ComplexEffectPort, EffectError, KingdomStorePort};

/// Runs complex actions against the kingdom store.
///
/// Settlement founding is the only action that mutates engine state today.
/// The rest resolve at the table, so they are logged for the record and
/// reported as handled.
pub struct StoreBackedEffects {
    store: Arc<dyn KingdomStorePort>,
}

impl StoreBackedEffects {
    pub fn new(store: Arc<dyn KingdomStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ComplexEffectPort for StoreBackedEffects {
    async fn execute(
        &self,
        kingdom_id: KingdomId,
        action: &ComplexAction,
    ) -> Result<(), EffectError> {
        match action {
            ComplexAction::FoundSettlement { name } => {
                let name = name.clone();
                self.store
                    .atomic_update(Box::new(move |state| {
                        state.found_settlement(name).map(|_| ())
                    }))
                    .await
                    .map_err(EffectError::failed)?;
                Ok(())
            }
            other => {
                tracing::info!(
                    kingdom_id = %kingdom_id,
                    action = other.kind_name(),
                    "Complex action left for table resolution"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::InMemoryKingdomStore;
    use regent_domain::{KingdomId, KingdomState};

    fn setup() -> (Arc<InMemoryKingdomStore>, StoreBackedEffects, KingdomId) {
        let kingdom_id = KingdomId::new();
        let store = Arc::new(InMemoryKingdomStore::new(
            KingdomState::new(kingdom_id, "Aldermark"),
            16,
        ));
        let effects = StoreBackedEffects::new(store.clone());
        (store, effects, kingdom_id)
    }

    #[tokio::test]
    async fn found_settlement_reaches_the_store() {
        let (store, effects, kingdom_id) = setup();

        effects
            .execute(kingdom_id, &ComplexAction::found_settlement("Rivergate"))
            .await
            .unwrap();

        let state = store.read().await.unwrap();
        assert_eq!(state.settlements().len(), 1);
        assert_eq!(state.settlements()[0].name(), "Rivergate");
    }

    #[tokio::test]
    async fn narrated_actions_do_not_touch_state() {
        let (store, effects, kingdom_id) = setup();

        effects
            .execute(
                kingdom_id,
                &ComplexAction::custom("The bridge at Ford's Rest collapses"),
            )
            .await
            .unwrap();

        assert!(store.read().await.unwrap().settlements().is_empty());
    }

    #[tokio::test]
    async fn invalid_settlement_name_surfaces_as_failure() {
        let (_store, effects, kingdom_id) = setup();

        let err = effects
            .execute(kingdom_id, &ComplexAction::found_settlement("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, EffectError::Failed(_)));
    }
}
