//! Per-peer engagement records.

use nearcast_primitives::Peer;
use nearcast_transfer::SendOperation;
use tokio::task::AbortHandle;

/// What is currently active for one peer: a running send operation or a
/// pending delayed re-attempt. At most one engagement exists per peer.
pub(crate) enum Engagement<O: SendOperation> {
    InFlight(O),
    Scheduled(RetryHandle),
}

impl<O: SendOperation> core::fmt::Debug for Engagement<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InFlight(_) => f.write_str("InFlight(..)"),
            Self::Scheduled(_) => f.write_str("Scheduled(..)"),
        }
    }
}

impl<O: SendOperation> Engagement<O> {
    /// Cancel whatever this engagement holds. Idempotent for both tags; safe
    /// even if the underlying work already completed.
    pub(crate) fn cancel(&self) {
        match self {
            Self::InFlight(operation) => operation.cancel(),
            Self::Scheduled(retry) => retry.cancel(),
        }
    }
}

/// Cancelable handle to a scheduled re-attempt.
///
/// Firings carry the sequence number they were scheduled with; a firing whose
/// number no longer matches the table entry is stale and must be dropped.
pub(crate) struct RetryHandle {
    seq: u64,
    task: AbortHandle,
}

impl RetryHandle {
    pub(crate) fn new(seq: u64, task: AbortHandle) -> Self {
        Self { seq, task }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn cancel(&self) {
        self.task.abort();
    }
}

/// Message sent into the dispatcher when a scheduled re-attempt elapses.
pub(crate) struct RetryFiring {
    pub(crate) peer: Peer,
    pub(crate) seq: u64,
}
