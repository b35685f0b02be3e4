//! Regent Shared - Types exchanged between the engine and session hosts
//!
//! This crate contains the session contract: signals participants send and
//! events the engine emits, plus the view types those events carry.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, uuid, thiserror and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - views and signals use raw `uuid::Uuid`; only
//!    vocabulary enums (phases, resources, degrees) come from the domain

pub mod messages;
pub mod views;

// =============================================================================
// Session Signal Types
// =============================================================================
pub use messages::{
    ClientSignal, ParticipantInfo, ParticipantRole, ResolutionEdit, SelectionData, ServerEvent,
    UnknownRoleError,
};

// =============================================================================
// View Types
// =============================================================================
pub use views::{
    ActionLogView, AidView, CheckInstanceView, CheckSummary, KingdomView, PhaseView,
    ResolutionView, ResourceBalance, ResourceDelta, RollView, SettlementView, StepView,
};
