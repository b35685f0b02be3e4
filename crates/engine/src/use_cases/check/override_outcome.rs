//! Override-outcome use case.

use std::sync::Arc;

use regent_domain::{
    AidContribution, CheckInstanceId, DegreeOfSuccess, DomainError, InstanceStatus,
};

use crate::infrastructure::ports::{CheckCatalogPort, KingdomStorePort};

use super::error::CheckError;
use super::resolution::build_resolution;

/// Replaces a previewed outcome with a facilitator-chosen degree and
/// rebuilds the preview from the catalog entry for that degree.
///
/// Role gating lives in the session hub; this use case trusts its caller.
pub struct OverrideOutcome {
    store: Arc<dyn KingdomStorePort>,
    catalog: Arc<dyn CheckCatalogPort>,
}

impl OverrideOutcome {
    pub fn new(store: Arc<dyn KingdomStorePort>, catalog: Arc<dyn CheckCatalogPort>) -> Self {
        Self { store, catalog }
    }

    pub async fn execute(
        &self,
        instance_id: CheckInstanceId,
        outcome: DegreeOfSuccess,
    ) -> Result<(), CheckError> {
        let catalog = self.catalog.clone();
        self.store
            .atomic_update(Box::new(move |state| {
                let instance = state
                    .instance(instance_id)
                    .ok_or(DomainError::InstanceNotFound(instance_id))?;
                if instance.status() != InstanceStatus::Previewed {
                    return Err(DomainError::invalid_transition(format!(
                        "Instance {instance_id} must be previewed before an override"
                    )));
                }
                let definition = catalog.get(instance.check_id()).ok_or_else(|| {
                    DomainError::validation(format!(
                        "Check missing from catalog: {}",
                        instance.check_id()
                    ))
                })?;
                let pending: Vec<AidContribution> = state
                    .aid_for(definition.id())
                    .into_iter()
                    .cloned()
                    .collect();
                let (effect_text, resolution) = build_resolution(&definition, outcome, &pending);
                state.store_outcome(instance_id, outcome, effect_text, resolution)
            }))
            .await?;
        tracing::info!(
            instance_id = %instance_id,
            outcome = %outcome,
            "Outcome overridden"
        );
        Ok(())
    }
}
