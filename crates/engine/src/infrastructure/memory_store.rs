//! In-memory kingdom store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use regent_domain::KingdomState;

use crate::infrastructure::ports::{Committed, KingdomStorePort, StoreError, UpdateFn};

/// Single-kingdom store holding authoritative state in process memory.
///
/// A mutex serializes updates. Each mutation runs against a working copy,
/// so a rejected update leaves the stored state untouched. Every commit
/// bumps the revision and publishes the drained events on a broadcast
/// channel.
pub struct InMemoryKingdomStore {
    inner: Mutex<Inner>,
    commits: broadcast::Sender<Committed>,
}

struct Inner {
    state: KingdomState,
    revision: u64,
}

impl InMemoryKingdomStore {
    pub fn new(initial: KingdomState, event_capacity: usize) -> Self {
        let (commits, _) = broadcast::channel(event_capacity);
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                revision: 0,
            }),
            commits,
        }
    }
}

#[async_trait]
impl KingdomStorePort for InMemoryKingdomStore {
    async fn read(&self) -> Result<KingdomState, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.state.clone())
    }

    async fn read_with_revision(&self) -> Result<(u64, KingdomState), StoreError> {
        let inner = self.inner.lock().await;
        Ok((inner.revision, inner.state.clone()))
    }

    async fn atomic_update(&self, update: UpdateFn) -> Result<Committed, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut working = inner.state.clone();
        update(&mut working)?;
        let events = working.take_events();
        inner.revision += 1;
        inner.state = working;
        let committed = Committed {
            revision: inner.revision,
            state: Arc::new(inner.state.clone()),
            events,
        };
        // A send error just means nobody is subscribed yet.
        let _ = self.commits.send(committed.clone());
        tracing::debug!(revision = committed.revision, events = committed.events.len(), "Committed update");
        Ok(committed)
    }

    fn subscribe(&self) -> broadcast::Receiver<Committed> {
        self.commits.subscribe()
    }
}
