// Port traits define the full contract - many methods are for future use
#![allow(dead_code)]

//! Kingdom state store port.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use regent_domain::{DomainError, KingdomEvent, KingdomState};

use super::error::StoreError;

/// Mutation applied to a working copy of the state inside
/// [`KingdomStorePort::atomic_update`].
///
/// Returning an error aborts the whole update: the stored state stays as it
/// was and no events are published.
pub type UpdateFn = Box<dyn FnOnce(&mut KingdomState) -> Result<(), DomainError> + Send>;

/// A successfully committed state change.
#[derive(Debug, Clone)]
pub struct Committed {
    /// Monotonic revision, incremented once per committed update.
    pub revision: u64,
    /// Snapshot of the state after the update.
    pub state: Arc<KingdomState>,
    /// Domain events drained from the state during the update, in order.
    pub events: Vec<KingdomEvent>,
}

/// Serialized read-modify-write access to the kingdom state.
///
/// Updates run one at a time against the current state. Subscribers observe
/// every commit in revision order, so hosts can project the event stream
/// without missing a transition.
#[async_trait]
pub trait KingdomStorePort: Send + Sync {
    /// Snapshot of the current state.
    async fn read(&self) -> Result<KingdomState, StoreError>;

    /// Snapshot of the current state together with its commit revision,
    /// taken in one read so resync replies carry a coherent pair.
    async fn read_with_revision(&self) -> Result<(u64, KingdomState), StoreError>;

    /// Run `update` against a working copy and commit it if it returns Ok.
    async fn atomic_update(&self, update: UpdateFn) -> Result<Committed, StoreError>;

    /// Subscribe to committed changes.
    fn subscribe(&self) -> broadcast::Receiver<Committed>;
}
