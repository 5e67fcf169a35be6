//! In-memory discovery service (no real radio, no persistence).
//!
//! The visible-peer set is driven programmatically via [`MemoryDiscovery::announce`],
//! which makes this implementation the backbone of the host simulation and of
//! the dispatch tests.

use std::collections::HashMap;
use std::sync::Arc;

use nearcast_primitives::Peer;
use parking_lot::Mutex;
use tracing::trace;

use crate::{DiscoveryService, DiscoverySubscription, Snapshot, SnapshotSender};

#[derive(Default)]
struct Inner {
    visible: Mutex<Snapshot>,
    sinks: Mutex<HashMap<u64, SnapshotSender>>,
    next_key: Mutex<u64>,
}

/// Channel-backed discovery service over a programmatic peer set.
#[derive(Clone, Default)]
pub struct MemoryDiscovery {
    inner: Arc<Inner>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible peer set and fan the new snapshot out to every
    /// open subscription. Closed sinks are pruned on the way.
    pub fn announce(&self, peers: Vec<Peer>) {
        *self.inner.visible.lock() = peers.clone();

        let mut sinks = self.inner.sinks.lock();
        sinks.retain(|key, sink| {
            let open = sink.send(peers.clone()).is_ok();
            if !open {
                trace!(key, "pruning closed discovery sink");
            }
            open
        });
    }

    /// The peers currently announced as visible.
    pub fn visible(&self) -> Snapshot {
        self.inner.visible.lock().clone()
    }

    /// Number of open subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.sinks.lock().len()
    }
}

impl DiscoveryService for MemoryDiscovery {
    type Subscription = MemorySubscription;

    fn open(&self, sink: SnapshotSender) -> MemorySubscription {
        let key = {
            let mut next = self.inner.next_key.lock();
            *next += 1;
            *next
        };

        // New subscribers learn the current enumeration right away.
        let _ = sink.send(self.inner.visible.lock().clone());
        self.inner.sinks.lock().insert(key, sink);

        trace!(key, "discovery subscription opened");
        MemorySubscription {
            key,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Subscription handle for [`MemoryDiscovery`]; invalidated explicitly or on drop.
pub struct MemorySubscription {
    key: u64,
    inner: Arc<Inner>,
}

impl DiscoverySubscription for MemorySubscription {
    fn invalidate(&self) {
        if self.inner.sinks.lock().remove(&self.key).is_some() {
            trace!(key = self.key, "discovery subscription invalidated");
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.invalidate();
    }
}
