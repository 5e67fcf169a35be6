//! Send-operation boundary.
//!
//! A transfer service constructs asynchronous send operations targeted at one
//! peer each. Operations are inert until resumed, deliver lifecycle signals
//! over a channel, and expose idempotent `resume`/`cancel` commands. The wire
//! protocol behind an operation is out of scope here; [`memory::MemoryTransfer`]
//! provides the in-process implementation used by the host simulation and the
//! dispatch tests.

pub mod memory;
mod operation;
mod payload;

pub use memory::{MemoryOperation, MemoryTransfer};
pub use operation::{
    signal_channel, OperationEvent, OperationId, OperationSignal, SendOperation, SignalReceiver,
    SignalSender, TransferService,
};
pub use payload::{FileIcon, IconError, IconFormat, Payload};
