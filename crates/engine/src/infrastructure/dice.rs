//! Local dice resolution for check rolls.

use std::sync::Arc;

use async_trait::async_trait;

use regent_domain::{DegreeOfSuccess, RollBreakdown};

use crate::infrastructure::ports::{CheckRollPort, RandomPort, RollError, RollReply, RollRequest};

/// Resolves check rolls with a local d20.
///
/// A natural 20 improves the degree one step and a natural 1 degrades it
/// one step, after the total is compared against the DC.
pub struct TabletopRoller {
    random: Arc<dyn RandomPort>,
}

impl TabletopRoller {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }
}

#[async_trait]
impl CheckRollPort for TabletopRoller {
    async fn request_roll(&self, request: RollRequest) -> Result<RollReply, RollError> {
        let die = self.random.gen_range(1, 20);
        let modifier = request.modifier_total();
        let total = die + modifier;

        let mut outcome = DegreeOfSuccess::from_check(total, request.dc);
        if die == 20 {
            outcome = outcome.improved();
        } else if die == 1 {
            outcome = outcome.degraded();
        }

        tracing::debug!(
            check_id = %request.check_id,
            die,
            total,
            dc = request.dc,
            outcome = %outcome,
            "Resolved check roll"
        );

        Ok(RollReply {
            outcome,
            breakdown: RollBreakdown::new(die, modifier, total, request.dc),
        })
    }
}
