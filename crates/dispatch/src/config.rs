//! Dispatcher configuration and policy hooks.

use std::path::PathBuf;
use std::time::Duration;

use nearcast_primitives::Peer;

/// Default cool-down before a peer is approached again after its operation
/// ended.
pub const DEFAULT_RECHARGE: Duration = Duration::from_secs(15);

/// Decides whether a newly visible peer should be approached at all.
pub type ApproachHook = Box<dyn Fn(&Peer) -> bool + Send>;

/// Optionally substitutes a per-peer payload path for the shared one. An
/// override skips icon preparation.
pub type PayloadOverrideHook = Box<dyn Fn(&Peer) -> Option<PathBuf> + Send>;

/// Static dispatcher configuration.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Cool-down between an operation ending and the next attempt at the
    /// same peer.
    pub recharge: Duration,
    /// Shared payload sent to every approved peer unless overridden.
    pub payload: PathBuf,
}

impl DispatcherConfig {
    pub fn new(payload: impl Into<PathBuf>) -> Self {
        Self {
            recharge: DEFAULT_RECHARGE,
            payload: payload.into(),
        }
    }
}
