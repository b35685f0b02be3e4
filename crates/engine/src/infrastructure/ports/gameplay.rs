// Port traits define the full contract - many methods are for future use
#![allow(dead_code)]

//! Gameplay ports: roll resolution, check catalog, complex effects.

use std::sync::Arc;

use async_trait::async_trait;

use regent_domain::{
    CheckDefinition, CheckId, ComplexAction, DegreeOfSuccess, KingdomId, RollBreakdown,
};

use super::error::{EffectError, RollError};

/// One labelled modifier line shown alongside a roll request.
#[derive(Debug, Clone)]
pub struct RollModifier {
    pub label: String,
    pub value: i32,
}

impl RollModifier {
    pub fn new(label: impl Into<String>, value: i32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Everything a roll surface needs to present and resolve one check roll.
#[derive(Debug, Clone)]
pub struct RollRequest {
    pub check_id: CheckId,
    pub check_name: String,
    pub actor_name: String,
    pub skill: String,
    pub dc: i32,
    pub modifiers: Vec<RollModifier>,
}

impl RollRequest {
    /// Sum of all modifier lines.
    pub fn modifier_total(&self) -> i32 {
        self.modifiers.iter().map(|m| m.value).sum()
    }
}

/// Result of a resolved roll.
#[derive(Debug, Clone)]
pub struct RollReply {
    pub outcome: DegreeOfSuccess,
    pub breakdown: RollBreakdown,
}

/// Resolves check rolls, whether by local dice or an external surface
/// that lets players throw physical dice and report the result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckRollPort: Send + Sync {
    async fn request_roll(&self, request: RollRequest) -> Result<RollReply, RollError>;
}

/// Read-only access to check definitions.
#[cfg_attr(test, mockall::automock)]
pub trait CheckCatalogPort: Send + Sync {
    fn get(&self, id: &CheckId) -> Option<Arc<CheckDefinition>>;
    fn list(&self) -> Vec<Arc<CheckDefinition>>;
}

/// Executes complex actions whose effects reach beyond the resource ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplexEffectPort: Send + Sync {
    async fn execute(
        &self,
        kingdom_id: KingdomId,
        action: &ComplexAction,
    ) -> Result<(), EffectError>;
}
