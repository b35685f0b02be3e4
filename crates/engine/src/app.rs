//! Application composition root.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regent_domain::{KingdomId, KingdomState, Resource};

use crate::infrastructure::catalog::StaticCatalog;
use crate::infrastructure::clock::{SystemClock, SystemRandom};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::dice::TabletopRoller;
use crate::infrastructure::effects::StoreBackedEffects;
use crate::infrastructure::memory_store::InMemoryKingdomStore;
use crate::infrastructure::ports::{
    CheckCatalogPort, CheckRollPort, ClockPort, ComplexEffectPort, KingdomStorePort,
};
use crate::session::ParticipantHub;
use crate::use_cases::{
    AdvancePhase, AidCheck, BeginPhase, CancelCheck, CheckUseCases, CompleteStep,
    ConfirmResolution, ExecuteCheck, OverrideOutcome, RerollCheck, TurnUseCases,
};

/// Install the process-wide tracing subscriber, env-filtered with a
/// debug default for the engine's own spans. Hosts call this once at
/// startup, before building an [`App`].
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regent_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// The composed engine: use cases wired around ports, plus the hub hosts
/// talk to. Hosts own transports and lifecycles; the engine owns rules.
pub struct App {
    pub config: EngineConfig,
    pub store: Arc<dyn KingdomStorePort>,
    pub catalog: Arc<dyn CheckCatalogPort>,
    pub checks: Arc<CheckUseCases>,
    pub aid: Arc<AidCheck>,
    pub reroll: Arc<RerollCheck>,
    pub turn: Arc<TurnUseCases>,
    pub hub: Arc<ParticipantHub>,
}

impl App {
    /// Build an engine around a freshly seeded kingdom.
    pub fn new(config: EngineConfig) -> Self {
        let initial = KingdomState::new(KingdomId::new(), &config.kingdom_name)
            .with_balance(Resource::Fame, config.starting_fame)
            .with_balance(Resource::Gold, 5)
            .with_balance(Resource::Food, 4)
            .with_settlement("First Landing");
        Self::with_state(config, initial)
    }

    /// Build an engine around existing state, with the default in-memory
    /// store, local dice, and built-in catalog.
    pub fn with_state(config: EngineConfig, initial: KingdomState) -> Self {
        let store: Arc<dyn KingdomStorePort> =
            Arc::new(InMemoryKingdomStore::new(initial, config.event_capacity));
        let roll: Arc<dyn CheckRollPort> = Arc::new(TabletopRoller::new(Arc::new(SystemRandom)));
        let catalog: Arc<dyn CheckCatalogPort> = Arc::new(StaticCatalog::builtin());
        let effects: Arc<dyn ComplexEffectPort> = Arc::new(StoreBackedEffects::new(store.clone()));
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
        Self::compose(config, store, roll, catalog, effects, clock)
    }

    /// Wire the use cases and hub around the given port implementations.
    ///
    /// The hub's fan-out task is not spawned here; call
    /// [`ParticipantHub::start`] once, from inside the runtime.
    pub fn compose(
        config: EngineConfig,
        store: Arc<dyn KingdomStorePort>,
        roll: Arc<dyn CheckRollPort>,
        catalog: Arc<dyn CheckCatalogPort>,
        effects: Arc<dyn ComplexEffectPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let checks = Arc::new(CheckUseCases::new(
            ExecuteCheck::new(store.clone(), roll.clone(), catalog.clone(), clock.clone()),
            ConfirmResolution::new(store.clone(), catalog.clone(), effects),
            CancelCheck::new(store.clone()),
            OverrideOutcome::new(store.clone(), catalog.clone()),
        ));
        let aid = Arc::new(AidCheck::new(
            store.clone(),
            roll.clone(),
            catalog.clone(),
            clock.clone(),
            config.aid_dc,
        ));
        let reroll = Arc::new(RerollCheck::new(
            store.clone(),
            roll,
            catalog.clone(),
            clock,
            config.reroll_fame_cost,
        ));
        let turn = Arc::new(TurnUseCases::new(
            BeginPhase::new(store.clone()),
            CompleteStep::new(store.clone()),
            AdvancePhase::new(store.clone()),
        ));
        let hub = Arc::new(ParticipantHub::new(
            store.clone(),
            catalog.clone(),
            checks.clone(),
            aid.clone(),
            reroll.clone(),
            turn.clone(),
        ));
        Self {
            config,
            store,
            catalog,
            checks,
            aid,
            reroll,
            turn,
            hub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use regent_domain::{CheckId, InstanceStatus, PlayerId};

    #[tokio::test]
    async fn app_composes_and_serves_a_check() {
        let app = App::new(EngineConfig::default());
        let player = PlayerId::new();

        // Real dice: the degree varies, but the attempt always lands
        // previewed and holds the slot.
        let instance_id = app
            .checks
            .execute
            .execute(
                player,
                "Elara",
                CheckId::new("trade-commodities"),
                "trade",
                None,
            )
            .await
            .unwrap();

        let state = app.store.read().await.unwrap();
        let instance = state.instance(instance_id).expect("instance");
        assert_eq!(instance.status(), InstanceStatus::Previewed);
        assert!(instance.outcome().is_some());
    }
}
