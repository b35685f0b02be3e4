// Port traits define the full contract - many methods are for future use
#![allow(dead_code)]

//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Kingdom state storage (could swap the in-memory store -> Postgres)
//! - Roll resolution (could swap local dice -> an external tabletop surface)
//! - Check definitions (could swap the built-in catalog -> data files)
//! - Complex effects (could swap the logging stub -> a full world simulation)
//! - Clock/Random (for testing)

mod error;
mod gameplay;
mod store;
mod testing;

// =============================================================================
// Store Port
// =============================================================================
pub use store::{Committed, KingdomStorePort, UpdateFn};

// =============================================================================
// Gameplay Ports
// =============================================================================
pub use gameplay::{
    CheckCatalogPort, CheckRollPort, ComplexEffectPort, RollModifier, RollReply, RollRequest,
};

// =============================================================================
// Testability Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use gameplay::{MockCheckCatalogPort, MockCheckRollPort, MockComplexEffectPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{EffectError, RollError, StoreError};
