//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod dice;
pub mod effects;
pub mod memory_store;
pub mod ports;
