//! The kingdom's resource ledger.
//!
//! All spendable and tracked counters live here. The ledger is only mutated
//! by the resolution pipeline's apply step and by turn scheduler steps;
//! nothing else writes to it directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Requirement;
use crate::error::DomainError;

/// Fame never rises above this; gains past the cap are lost.
pub const FAME_MAX: i64 = 3;

/// A tracked counter in the kingdom ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Gold,
    Food,
    Lumber,
    Stone,
    Ore,
    Luxuries,
    Fame,
    Unrest,
}

impl Resource {
    /// Every resource, in ledger display order.
    pub fn all() -> [Resource; 8] {
        [
            Resource::Gold,
            Resource::Food,
            Resource::Lumber,
            Resource::Stone,
            Resource::Ore,
            Resource::Luxuries,
            Resource::Fame,
            Resource::Unrest,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Gold => "gold",
            Resource::Food => "food",
            Resource::Lumber => "lumber",
            Resource::Stone => "stone",
            Resource::Ore => "ore",
            Resource::Luxuries => "luxuries",
            Resource::Fame => "fame",
            Resource::Unrest => "unrest",
        }
    }

    /// Upper bound for this resource, where the domain defines one.
    fn ceiling(&self) -> Option<i64> {
        match self {
            Resource::Fame => Some(FAME_MAX),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A requirement the current ledger cannot cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShortfall {
    pub resource: Resource,
    pub required: i64,
    pub available: i64,
}

impl fmt::Display for ResourceShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (need {}, have {})",
            self.resource, self.required, self.available
        )
    }
}

/// Mapping of resource -> signed amount.
///
/// Amounts never go below zero; deltas that would cross the floor are
/// clamped. Strict spends that must not clamp go through [`debit`].
///
/// [`debit`]: ResourceLedger::debit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    balances: BTreeMap<Resource, i64>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for tests and initial state.
    pub fn with_balance(mut self, resource: Resource, amount: i64) -> Self {
        self.balances.insert(resource, amount);
        self
    }

    pub fn amount(&self, resource: Resource) -> i64 {
        self.balances.get(&resource).copied().unwrap_or(0)
    }

    /// Iterate all resources with their current amounts, including zeroes.
    pub fn entries(&self) -> impl Iterator<Item = (Resource, i64)> + '_ {
        Resource::all().into_iter().map(|r| (r, self.amount(r)))
    }

    /// Applies a signed delta, clamping at the floor (zero) and at the
    /// resource ceiling where one is defined. Returns the delta that was
    /// actually applied after clamping.
    pub fn apply_delta(&mut self, resource: Resource, delta: i64) -> i64 {
        let current = self.amount(resource);
        let mut next = current.saturating_add(delta).max(0);
        if let Some(cap) = resource.ceiling() {
            next = next.min(cap);
        }
        self.balances.insert(resource, next);
        next - current
    }

    /// Strict spend: fails without mutating when the balance is short.
    pub fn debit(&mut self, resource: Resource, amount: i64) -> Result<(), DomainError> {
        let available = self.amount(resource);
        if available < amount {
            return Err(DomainError::InsufficientResource {
                resource,
                required: amount,
                available,
            });
        }
        self.balances.insert(resource, available - amount);
        Ok(())
    }

    /// Requirements the ledger cannot currently satisfy.
    pub fn unmet(&self, requirements: &[Requirement]) -> Vec<ResourceShortfall> {
        requirements
            .iter()
            .filter_map(|req| {
                let available = self.amount(req.resource());
                (available < req.minimum()).then(|| ResourceShortfall {
                    resource: req.resource(),
                    required: req.minimum(),
                    available,
                })
            })
            .collect()
    }

    /// Pays turn consumption from food. Any shortfall is converted to
    /// unrest point-for-point and food bottoms out at zero. Returns the
    /// shortfall.
    pub fn pay_consumption(&mut self, required: i64) -> i64 {
        let available = self.amount(Resource::Food);
        let shortfall = (required - available).max(0);
        self.balances
            .insert(Resource::Food, (available - required).max(0));
        if shortfall > 0 {
            self.apply_delta(Resource::Unrest, shortfall);
        }
        shortfall
    }
}
