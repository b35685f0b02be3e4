//! The check pipeline.
//!
//! One attempt travels create -> roll -> preview -> confirm (or cancel).
//! Each use case owns one leg of that journey; the preview math they
//! share lives in [`resolution`].

use std::sync::Arc;

use regent_domain::{AidContribution, CheckDefinition, CheckInstanceId, PlayerId};

use crate::infrastructure::ports::{KingdomStorePort, RollReply, StoreError};

mod cancel;
mod confirm;
mod error;
mod execute;
mod override_outcome;
mod resolution;

pub use cancel::CancelCheck;
pub use confirm::ConfirmResolution;
pub use error::CheckError;
pub use execute::ExecuteCheck;
pub use override_outcome::OverrideOutcome;

pub(crate) use resolution::{build_resolution, roll_request};

/// The check-pipeline use cases, bundled for composition.
pub struct CheckUseCases {
    pub execute: Arc<ExecuteCheck>,
    pub confirm: Arc<ConfirmResolution>,
    pub cancel: Arc<CancelCheck>,
    pub override_outcome: Arc<OverrideOutcome>,
}

impl CheckUseCases {
    pub fn new(
        execute: ExecuteCheck,
        confirm: ConfirmResolution,
        cancel: CancelCheck,
        override_outcome: OverrideOutcome,
    ) -> Self {
        Self {
            execute: Arc::new(execute),
            confirm: Arc::new(confirm),
            cancel: Arc::new(cancel),
            override_outcome: Arc::new(override_outcome),
        }
    }
}

/// Commit a finished roll: record the breakdown, consume the aid that was
/// folded into it, and store the preview for its outcome. Aid recorded
/// while the roll was out is not in the modifier total, so it lands as
/// manual effect lines instead.
pub(crate) async fn commit_rolled_preview(
    store: &dyn KingdomStorePort,
    definition: Arc<CheckDefinition>,
    instance_id: CheckInstanceId,
    reply: RollReply,
    folded: Vec<AidContribution>,
) -> Result<(), StoreError> {
    let contributors: Vec<PlayerId> = folded.iter().map(AidContribution::contributor).collect();
    let check_id = definition.id().clone();
    store
        .atomic_update(Box::new(move |state| {
            let RollReply { outcome, breakdown } = reply;
            state.record_roll(instance_id, outcome, breakdown)?;
            state.consume_aid(&check_id, &contributors);
            let late: Vec<AidContribution> =
                state.aid_for(&check_id).into_iter().cloned().collect();
            let (effect_text, resolution) = build_resolution(&definition, outcome, &late);
            state.store_outcome(instance_id, outcome, effect_text, resolution)
        }))
        .await
        .map(|_| ())
}
