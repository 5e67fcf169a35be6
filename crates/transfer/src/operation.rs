//! Operation handles and lifecycle signals.

use std::fmt;

use nearcast_primitives::{Peer, PeerId};
use tokio::sync::mpsc;

use crate::Payload;

/// Opaque identity of one send attempt, assigned by the transfer service.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle events an operation can report.
///
/// Only `AskUser` and the terminal trio drive controller behaviour; the rest
/// exist because real transfer stacks report them and consumers must be able
/// to skip past them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperationEvent {
    NewOperation,
    Connecting,
    /// The remote side is showing a consent prompt. The operation stalls until
    /// it is resumed again.
    AskUser,
    WaitForAnswer,
    Started,
    Progress,
    Canceled,
    ErrorOccurred,
    Finished,
}

impl OperationEvent {
    /// Whether this event ends the operation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::ErrorOccurred | Self::Finished)
    }
}

/// One lifecycle delivery: which operation, which peer it was created for,
/// and what happened.
///
/// The peer is read back from the association stored on the operation at
/// creation time, so consumers never have to keep their own reverse index.
#[derive(Clone, Debug)]
pub struct OperationSignal {
    pub id: OperationId,
    pub peer: PeerId,
    pub event: OperationEvent,
}

/// Sink half a transfer service delivers lifecycle signals into.
pub type SignalSender = mpsc::UnboundedSender<OperationSignal>;

/// Receiver half owned by the consumer of lifecycle signals.
pub type SignalReceiver = mpsc::UnboundedReceiver<OperationSignal>;

/// Create a lifecycle signal channel.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}

/// Handle to one in-flight send operation.
///
/// `resume` and `cancel` are idempotent and always safe to call, including
/// after the operation has already reached a terminal event.
pub trait SendOperation: Send {
    fn id(&self) -> OperationId;

    /// The peer this operation was created for.
    fn peer(&self) -> &PeerId;

    /// Begin, or un-stall, the operation.
    fn resume(&self);

    fn cancel(&self);
}

/// Constructs send operations. Created operations are inert until the first
/// `resume` call.
pub trait TransferService {
    type Operation: SendOperation;

    fn create(&self, peer: Peer, payload: Payload) -> Self::Operation;
}
