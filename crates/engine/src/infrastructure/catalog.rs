//! Built-in check catalog.
//!
//! Definitions are compiled into the engine. The catalog port keeps the
//! door open for loading them from data files later without touching the
//! resolution pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use regent_domain::{
    CheckDefinition, CheckId, CheckKind, CheckOutcomes, ComplexAction, OutcomeSpec, Resource,
    SelectionKind,
};

use crate::infrastructure::ports::CheckCatalogPort;

/// Catalog of check definitions compiled into the engine.
pub struct StaticCatalog {
    checks: HashMap<CheckId, Arc<CheckDefinition>>,
    order: Vec<CheckId>,
}

impl StaticCatalog {
    /// The standard kingdom action and incident set.
    pub fn builtin() -> Self {
        Self::from_definitions(builtin_definitions())
    }

    /// Build a catalog from explicit definitions. Later definitions with a
    /// duplicate id replace earlier ones.
    pub fn from_definitions(definitions: Vec<CheckDefinition>) -> Self {
        let mut checks = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            let id = definition.id().clone();
            if checks.insert(id.clone(), Arc::new(definition)).is_none() {
                order.push(id);
            }
        }
        Self { checks, order }
    }
}

impl CheckCatalogPort for StaticCatalog {
    fn get(&self, id: &CheckId) -> Option<Arc<CheckDefinition>> {
        self.checks.get(id).cloned()
    }

    fn list(&self) -> Vec<Arc<CheckDefinition>> {
        self.order
            .iter()
            .filter_map(|id| self.checks.get(id).cloned())
            .collect()
    }
}

fn builtin_definitions() -> Vec<CheckDefinition> {
    vec![
        // === Actions ===
        CheckDefinition::new(
            "trade-commodities",
            "Trade Commodities",
            CheckKind::Action,
            14,
            CheckOutcomes::simple(
                OutcomeSpec::new("Caravans return with a tidy profit.")
                    .with_modifier(Resource::Gold, 2),
                OutcomeSpec::new("The markets are flat; nothing gained."),
            )
            .with_critical_success(
                OutcomeSpec::new("A bidding war breaks out over your goods.")
                    .with_modifier(Resource::Gold, 4)
                    .with_modifier(Resource::Luxuries, 1),
            )
            .with_critical_failure(
                OutcomeSpec::new("A caravan is swindled and word spreads.")
                    .with_modifier(Resource::Gold, -1)
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Send trade caravans to neighbouring realms.")
        .with_skill("trade"),
        CheckDefinition::new(
            "claim-territory",
            "Claim Territory",
            CheckKind::Action,
            16,
            CheckOutcomes::simple(
                OutcomeSpec::new("Surveyors stake the new border.")
                    .with_manual_effect("Mark the claimed hex on the regional map"),
                OutcomeSpec::new("The expedition turns back without planting a flag."),
            )
            .with_critical_success(
                OutcomeSpec::new("The locals welcome your banner outright.")
                    .with_modifier(Resource::Unrest, -1)
                    .with_manual_effect("Mark the claimed hex on the regional map"),
            )
            .with_critical_failure(
                OutcomeSpec::new("The expedition sparks a border dispute.")
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Extend the kingdom's borders into surveyed land.")
        .with_skill("exploration")
        .with_skill("warfare"),
        CheckDefinition::new(
            "build-structure",
            "Build Structure",
            CheckKind::Action,
            15,
            CheckOutcomes::simple(
                OutcomeSpec::new("The structure goes up on schedule.")
                    .with_requirement(Resource::Lumber, 2)
                    .with_requirement(Resource::Stone, 1)
                    .with_modifier(Resource::Lumber, -2)
                    .with_modifier(Resource::Stone, -1)
                    .with_manual_effect("Add the structure to the settlement sheet"),
                OutcomeSpec::new("Ground is broken but little else gets done."),
            )
            .with_critical_success(
                OutcomeSpec::new("The build finishes early and under budget.")
                    .with_requirement(Resource::Lumber, 2)
                    .with_requirement(Resource::Stone, 1)
                    .with_modifier(Resource::Lumber, -2)
                    .with_modifier(Resource::Stone, -1)
                    .with_modifier(Resource::Unrest, -1)
                    .with_manual_effect("Add the structure to the settlement sheet"),
            )
            .with_critical_failure(
                OutcomeSpec::new("A scaffold collapse wastes good timber.")
                    .with_modifier(Resource::Lumber, -1),
            ),
        )
        .with_description("Raise a new structure in one of your settlements.")
        .with_skill("engineering")
        .with_selection(SelectionKind::Settlement),
        CheckDefinition::new(
            "found-settlement",
            "Found Settlement",
            CheckKind::Action,
            18,
            CheckOutcomes::simple(
                OutcomeSpec::new("Settlers raise the first palisade.")
                    .with_requirement(Resource::Gold, 3)
                    .with_modifier(Resource::Gold, -3)
                    .with_complex_action(ComplexAction::found_settlement("Frontier charter")),
                OutcomeSpec::new("The chosen site proves unworkable."),
            )
            .with_critical_success(
                OutcomeSpec::new("The new town draws settlers from three realms.")
                    .with_requirement(Resource::Gold, 3)
                    .with_modifier(Resource::Gold, -3)
                    .with_modifier(Resource::Fame, 1)
                    .with_complex_action(ComplexAction::found_settlement("Frontier charter")),
            )
            .with_critical_failure(
                OutcomeSpec::new("The expedition limps home demoralised.")
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Charter a new settlement on claimed land.")
        .with_skill("politics"),
        CheckDefinition::new(
            "celebrate-holiday",
            "Celebrate Holiday",
            CheckKind::Action,
            12,
            CheckOutcomes::simple(
                OutcomeSpec::new("The feast lifts spirits across the kingdom.")
                    .with_requirement(Resource::Gold, 1)
                    .with_modifier(Resource::Gold, -1)
                    .with_modifier(Resource::Unrest, -1),
                OutcomeSpec::new("The celebration fizzles in the rain."),
            )
            .with_critical_success(
                OutcomeSpec::new("Songs about the festival reach foreign courts.")
                    .with_requirement(Resource::Gold, 1)
                    .with_modifier(Resource::Gold, -1)
                    .with_modifier(Resource::Unrest, -2)
                    .with_modifier(Resource::Fame, 1),
            )
            .with_critical_failure(
                OutcomeSpec::new("A brawl breaks out at the feast tables.")
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Declare a public holiday to ease tensions.")
        .with_skill("politics")
        .with_skill("arts"),
        CheckDefinition::new(
            "recruit-army",
            "Recruit Army",
            CheckKind::Action,
            16,
            CheckOutcomes::simple(
                OutcomeSpec::new("A levy company musters under your banner.")
                    .with_modifier(Resource::Food, -1)
                    .with_complex_action(ComplexAction::RecruitArmy {
                        name: "Levy company".into(),
                    }),
                OutcomeSpec::new("Few answer the muster call."),
            )
            .with_critical_failure(
                OutcomeSpec::new("Press gangs sour the villages on the crown.")
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Raise a new army from the populace.")
        .with_skill("warfare"),
        // === Incidents ===
        CheckDefinition::new(
            "bandit-raid",
            "Bandit Raid",
            CheckKind::Incident,
            15,
            CheckOutcomes::simple(
                OutcomeSpec::new("The raiders are driven off at the border.")
                    .with_manual_effect("Describe the skirmish at the border"),
                OutcomeSpec::new("The bandits loot an outlying village.")
                    .with_modifier(Resource::Gold, -2)
                    .with_modifier(Resource::Unrest, 1),
            )
            .with_critical_success(
                OutcomeSpec::new("Your riders capture the bandits' own stores.")
                    .with_modifier(Resource::Gold, 1),
            )
            .with_critical_failure(
                OutcomeSpec::new("The raid cuts deep into the heartland.")
                    .with_modifier(Resource::Gold, -3)
                    .with_modifier(Resource::Food, -1)
                    .with_modifier(Resource::Unrest, 2)
                    .with_complex_action(ComplexAction::custom(
                        "A structure in the raided settlement is damaged",
                    )),
            ),
        )
        .with_description("Raiders probe the kingdom's defences.")
        .with_skill("warfare")
        .with_skill("intrigue"),
        CheckDefinition::new(
            "food-spoilage",
            "Food Spoilage",
            CheckKind::Incident,
            14,
            CheckOutcomes::simple(
                OutcomeSpec::new("Quick work by the granary keepers saves the stores."),
                OutcomeSpec::new("Rot claims part of the granaries.")
                    .with_modifier(Resource::Food, -2),
            )
            .with_critical_failure(
                OutcomeSpec::new("Blight spreads through every storehouse.")
                    .with_modifier(Resource::Food, -4)
                    .with_modifier(Resource::Unrest, 1),
            ),
        )
        .with_description("Damp weather threatens the kingdom's stores.")
        .with_skill("agriculture"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regent_domain::DegreeOfSuccess;

    #[test]
    fn builtin_definitions_are_valid() {
        for definition in builtin_definitions() {
            definition
                .validate()
                .unwrap_or_else(|e| panic!("{} invalid: {e}", definition.id()));
        }
    }

    #[test]
    fn get_returns_shared_definition() {
        let catalog = StaticCatalog::builtin();
        let id = CheckId::new("trade-commodities");
        let definition = catalog.get(&id).expect("builtin check");
        assert_eq!(definition.name(), "Trade Commodities");
        assert_eq!(
            definition
                .outcome_for(DegreeOfSuccess::Success)
                .modifiers
                .len(),
            1
        );
        assert!(catalog.get(&CheckId::new("missing")).is_none());
    }

    #[test]
    fn list_keeps_definition_order() {
        let catalog = StaticCatalog::builtin();
        let listed = catalog.list();
        assert_eq!(listed.len(), 8);
        assert_eq!(listed[0].id().as_str(), "trade-commodities");
        assert_eq!(listed[7].id().as_str(), "food-spoilage");
    }
}
