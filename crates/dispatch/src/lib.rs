//! Peer lifecycle and operation-scheduling controller.
//!
//! The [`Dispatcher`] reconciles full visible-peer snapshots from a discovery
//! service against its table of per-peer engagements (a running send
//! operation or a pending delayed re-attempt), enforcing at most one
//! engagement per peer. Operation lifecycle signals drive re-resumes and
//! cool-down retries; vanished peers have their work canceled. All state is
//! mutated from a single execution context, the [`Dispatcher::run`] loop, so
//! the controller needs no locking.

mod config;
mod dispatcher;
mod engagement;
mod metrics;

pub use config::{ApproachHook, DispatcherConfig, PayloadOverrideHook, DEFAULT_RECHARGE};
pub use dispatcher::Dispatcher;
