//! Session layer - the engine's boundary with hosting shells.

pub mod hub;
pub mod views;

pub use hub::{ParticipantHub, SignalError};
