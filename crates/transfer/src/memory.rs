//! In-memory transfer service (no wire protocol, no persistence).
//!
//! Two modes:
//! - manual: operations do nothing on resume; tests script lifecycle signals
//!   themselves via [`MemoryOperation::emit`] and assert on command counters.
//! - auto-completing: the first resume reports `Started` and, after a fixed
//!   delay, `Finished`, enough behaviour for an observable end-to-end run in
//!   the host binary.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nearcast_primitives::{Peer, PeerId};
use parking_lot::Mutex;
use tracing::trace;

use crate::{
    OperationEvent, OperationId, OperationSignal, Payload, SendOperation, SignalSender,
    TransferService,
};

struct ServiceInner {
    signals: SignalSender,
    auto_complete: Option<Duration>,
    next_id: AtomicU64,
    operations: Mutex<Vec<MemoryOperation>>,
}

/// Channel-backed transfer service that records every operation it creates.
#[derive(Clone)]
pub struct MemoryTransfer {
    inner: Arc<ServiceInner>,
}

impl MemoryTransfer {
    /// Manual-mode service: lifecycle signals are only ever emitted by the
    /// caller.
    pub fn new(signals: SignalSender) -> Self {
        Self::with_auto_complete(signals, None)
    }

    /// Operations report `Started` on first resume and `Finished` once
    /// `after` has elapsed, unless canceled first.
    pub fn auto_completing(signals: SignalSender, after: Duration) -> Self {
        Self::with_auto_complete(signals, Some(after))
    }

    fn with_auto_complete(signals: SignalSender, auto_complete: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                signals,
                auto_complete,
                next_id: AtomicU64::new(0),
                operations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Every operation created so far, in creation order.
    pub fn operations(&self) -> Vec<MemoryOperation> {
        self.inner.operations.lock().clone()
    }

    pub fn operation_count(&self) -> usize {
        self.inner.operations.lock().len()
    }

    /// The most recently created operation, if any.
    pub fn last_operation(&self) -> Option<MemoryOperation> {
        self.inner.operations.lock().last().cloned()
    }
}

impl TransferService for MemoryTransfer {
    type Operation = MemoryOperation;

    fn create(&self, peer: Peer, payload: Payload) -> MemoryOperation {
        let id = OperationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let operation = MemoryOperation {
            state: Arc::new(OpState {
                id,
                peer,
                payload,
                resumes: AtomicU32::new(0),
                cancels: AtomicU32::new(0),
                settled: AtomicBool::new(false),
            }),
            signals: self.inner.signals.clone(),
            auto_complete: self.inner.auto_complete,
        };

        trace!(%id, peer = %operation.state.peer.id(), "send operation created");
        self.inner.operations.lock().push(operation.clone());
        operation
    }
}

struct OpState {
    id: OperationId,
    peer: Peer,
    payload: Payload,
    resumes: AtomicU32,
    cancels: AtomicU32,
    settled: AtomicBool,
}

/// Handle to one in-memory operation. Clones share state, so service-side
/// bookkeeping and the consumer observe the same counters.
#[derive(Clone)]
pub struct MemoryOperation {
    state: Arc<OpState>,
    signals: SignalSender,
    auto_complete: Option<Duration>,
}

impl MemoryOperation {
    pub fn resume_count(&self) -> u32 {
        self.state.resumes.load(Ordering::Relaxed)
    }

    pub fn cancel_count(&self) -> u32 {
        self.state.cancels.load(Ordering::Relaxed)
    }

    pub fn payload(&self) -> &Payload {
        &self.state.payload
    }

    pub fn peer_descriptor(&self) -> &Peer {
        &self.state.peer
    }

    /// Deliver a lifecycle signal for this operation. Terminal events settle
    /// it; later auto-completion becomes a no-op.
    pub fn emit(&self, event: OperationEvent) {
        if event.is_terminal() {
            self.state.settled.store(true, Ordering::Relaxed);
        }
        let _ = self.signals.send(OperationSignal {
            id: self.state.id,
            peer: self.state.peer.id().clone(),
            event,
        });
    }
}

impl SendOperation for MemoryOperation {
    fn id(&self) -> OperationId {
        self.state.id
    }

    fn peer(&self) -> &PeerId {
        self.state.peer.id()
    }

    fn resume(&self) {
        let first = self.state.resumes.fetch_add(1, Ordering::Relaxed) == 0;
        if !first {
            return;
        }
        if let Some(after) = self.auto_complete {
            let operation = self.clone();
            tokio::spawn(async move {
                operation.emit(OperationEvent::Started);
                tokio::time::sleep(after).await;
                if !operation.state.settled.load(Ordering::Relaxed) {
                    operation.emit(OperationEvent::Finished);
                }
            });
        }
    }

    fn cancel(&self) {
        self.state.cancels.fetch_add(1, Ordering::Relaxed);
        if self.auto_complete.is_some() && !self.state.settled.load(Ordering::Relaxed) {
            self.emit(OperationEvent::Canceled);
        }
    }
}
