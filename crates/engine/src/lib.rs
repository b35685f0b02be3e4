//! Regent Engine - Turn resolution, check lifecycle, and session fan-out
//!
//! The engine embeds in a hosting shell: the host owns transports and any
//! durable persistence, the engine owns the rules. [`App`] composes the use
//! cases around port implementations and hands the host a
//! [`session::ParticipantHub`] to route participant signals through.
//!
//! ```text
//! domain -> use_cases -> session
//!               ^
//!        infrastructure (ports + default adapters)
//! ```
//!
//! Every rule mutation funnels through [`infrastructure::ports::KingdomStorePort`],
//! so a commit is the single source of truth for both state and the events
//! the hub fans out.

pub mod app;
pub mod infrastructure;
pub mod session;
pub mod use_cases;

pub use app::{init_tracing, App};
