//! Proximity discovery boundary.
//!
//! A discovery service periodically re-enumerates the peers visible on the
//! local channel and delivers each enumeration as a *full* snapshot, never a
//! delta. Consumers subscribe with a channel sink and tear the subscription
//! down by invalidating it (or dropping it).

pub mod memory;

pub use memory::{MemoryDiscovery, MemorySubscription};

use nearcast_primitives::Peer;
use tokio::sync::mpsc;

/// One full enumeration of currently-visible peers.
pub type Snapshot = Vec<Peer>;

/// Sink half handed to [`DiscoveryService::open`]; snapshots are delivered here.
pub type SnapshotSender = mpsc::UnboundedSender<Snapshot>;

/// Receiver half owned by the subscriber.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Snapshot>;

/// Create a snapshot delivery channel.
pub fn snapshot_channel() -> (SnapshotSender, SnapshotReceiver) {
    mpsc::unbounded_channel()
}

/// A source of visible-peer snapshots.
pub trait DiscoveryService {
    type Subscription: DiscoverySubscription;

    /// Open a subscription delivering snapshots into `sink`.
    ///
    /// The current enumeration is delivered immediately, then again whenever
    /// the visible set changes. Callers hold at most one subscription at a
    /// time.
    fn open(&self, sink: SnapshotSender) -> Self::Subscription;
}

/// Handle to an open discovery subscription.
///
/// Invalidation stops further deliveries and is idempotent. Dropping the
/// handle invalidates it as well, so a subscription can never outlive its
/// owner.
pub trait DiscoverySubscription: Send {
    fn invalidate(&self);
}
