//! Confirm-resolution use case.

use std::sync::{Arc, Mutex};

use regent_domain::{CheckInstanceId, ComplexAction, DomainError, PlayerId, ResolutionData};

use crate::infrastructure::ports::{CheckCatalogPort, ComplexEffectPort, KingdomStorePort};

use super::error::CheckError;

/// Applies a previewed resolution to the ledger and action log, then runs
/// any complex actions it carried.
///
/// The ledger change and the log entry land in one store commit; complex
/// actions run after it, against the committed state. A failed complex
/// action does not roll the confirmation back, it is logged for the
/// facilitator to repair by hand.
pub struct ConfirmResolution {
    store: Arc<dyn KingdomStorePort>,
    catalog: Arc<dyn CheckCatalogPort>,
    effects: Arc<dyn ComplexEffectPort>,
}

impl ConfirmResolution {
    pub fn new(
        store: Arc<dyn KingdomStorePort>,
        catalog: Arc<dyn CheckCatalogPort>,
        effects: Arc<dyn ComplexEffectPort>,
    ) -> Self {
        Self {
            store,
            catalog,
            effects,
        }
    }

    /// Confirm a previewed attempt.
    ///
    /// `edited` replaces the previewed numbers and text lines when the
    /// facilitator adjusted them; the stored complex actions always ride
    /// along unchanged.
    pub async fn execute(
        &self,
        instance_id: CheckInstanceId,
        confirmed_by: PlayerId,
        facilitator: bool,
        edited: Option<ResolutionData>,
    ) -> Result<(), CheckError> {
        // 1. Apply inside one commit, stashing the actions to run after it.
        let stash: Arc<Mutex<Vec<ComplexAction>>> = Arc::new(Mutex::new(Vec::new()));
        let committed = {
            let stash = stash.clone();
            let catalog = self.catalog.clone();
            self.store
                .atomic_update(Box::new(move |state| {
                    let instance = match state.instance(instance_id) {
                        Some(instance) => instance,
                        None if state.log_has_instance(instance_id) => {
                            return Err(DomainError::AlreadyApplied(instance_id));
                        }
                        None => return Err(DomainError::InstanceNotFound(instance_id)),
                    };
                    if !facilitator && instance.initiated_by() != confirmed_by {
                        return Err(DomainError::validation(
                            "Only the initiating player or the facilitator may confirm an attempt",
                        ));
                    }
                    let stored_actions: Vec<ComplexAction> = instance
                        .resolution()
                        .map(|r| r.complex_actions().to_vec())
                        .unwrap_or_default();
                    let definition = catalog.get(instance.check_id()).ok_or_else(|| {
                        DomainError::validation(format!(
                            "Check missing from catalog: {}",
                            instance.check_id()
                        ))
                    })?;
                    // Edits replace numbers and text lines; the stored
                    // complex actions always ride along.
                    let merged = edited.map(|edit| {
                        stored_actions
                            .iter()
                            .cloned()
                            .fold(edit, ResolutionData::with_complex_action)
                    });
                    let applied =
                        state.apply_check(instance_id, confirmed_by, &definition, merged)?;
                    if let (Ok(mut guard), Some(resolution)) = (stash.lock(), applied.resolution())
                    {
                        guard.extend(resolution.complex_actions().iter().cloned());
                    }
                    Ok(())
                }))
                .await?
        };

        // 2. Run the complex actions the applied resolution carried.
        let actions = stash
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default();
        for action in &actions {
            if let Err(err) = self.effects.execute(committed.state.id(), action).await {
                tracing::warn!(
                    instance_id = %instance_id,
                    action = action.kind_name(),
                    error = %err,
                    "Complex action failed after confirm"
                );
            }
        }

        tracing::info!(
            instance_id = %instance_id,
            confirmed_by = %confirmed_by,
            revision = committed.revision,
            "Resolution applied"
        );
        Ok(())
    }
}
