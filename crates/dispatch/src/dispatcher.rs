//! Snapshot reconciliation, operation dispatch, and retry scheduling.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use nearcast_discovery::{
    snapshot_channel, DiscoveryService, DiscoverySubscription, Snapshot, SnapshotReceiver,
    SnapshotSender,
};
use nearcast_primitives::{Peer, PeerId};
use nearcast_transfer::{
    FileIcon, OperationEvent, OperationSignal, Payload, SendOperation, SignalReceiver,
    TransferService,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::config::{ApproachHook, DispatcherConfig, PayloadOverrideHook};
use crate::engagement::{Engagement, RetryFiring, RetryHandle};
use crate::metrics::DispatcherMetrics;

/// The peer lifecycle and operation-scheduling controller.
///
/// Owns the known-peer map and the per-peer engagement table. Everything is
/// mutated from the [`run`](Self::run) loop only; external services deliver
/// into channels and receive commands, never touching controller state.
pub struct Dispatcher<D: DiscoveryService, T: TransferService> {
    discovery: D,
    transfer: T,
    config: DispatcherConfig,

    /// Whether a newly visible peer should be approached. Default: always.
    should_approach: ApproachHook,
    /// Per-peer payload substitution. Default: none.
    payload_override: PayloadOverrideHook,

    /// Most recently reconciled visible set, keyed by identity.
    people: HashMap<PeerId, Peer>,
    /// Current work per peer. Membership here, not in `people`, is the source
    /// of truth for "work is already scheduled for this peer".
    engagements: HashMap<PeerId, Engagement<T::Operation>>,

    subscription: Option<D::Subscription>,
    snapshots_tx: SnapshotSender,
    snapshots_rx: SnapshotReceiver,
    signals_rx: SignalReceiver,
    retry_tx: mpsc::UnboundedSender<RetryFiring>,
    retry_rx: mpsc::UnboundedReceiver<RetryFiring>,
    next_retry_seq: u64,

    metrics: DispatcherMetrics,
}

impl<D: DiscoveryService, T: TransferService> Dispatcher<D, T> {
    /// Build a dispatcher around the two boundary services. `signals` is the
    /// receiver half of the lifecycle channel the transfer service delivers
    /// into.
    pub fn new(discovery: D, transfer: T, config: DispatcherConfig, signals: SignalReceiver) -> Self {
        let (snapshots_tx, snapshots_rx) = snapshot_channel();
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();

        Self {
            discovery,
            transfer,
            config,
            should_approach: Box::new(|_| true),
            payload_override: Box::new(|_| None),
            people: HashMap::new(),
            engagements: HashMap::new(),
            subscription: None,
            snapshots_tx,
            snapshots_rx,
            signals_rx: signals,
            retry_tx,
            retry_rx,
            next_retry_seq: 0,
            metrics: DispatcherMetrics::default(),
        }
    }

    /// Whether a discovery subscription is currently open.
    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn recharge(&self) -> Duration {
        self.config.recharge
    }

    /// Change the cool-down applied to re-attempts scheduled from now on.
    pub fn set_recharge(&mut self, recharge: Duration) {
        self.config.recharge = recharge;
    }

    pub fn set_should_approach(&mut self, hook: impl Fn(&Peer) -> bool + Send + 'static) {
        self.should_approach = Box::new(hook);
    }

    pub fn set_payload_override(
        &mut self,
        hook: impl Fn(&Peer) -> Option<PathBuf> + Send + 'static,
    ) {
        self.payload_override = Box::new(hook);
    }

    pub fn known_peer_count(&self) -> usize {
        self.people.len()
    }

    pub fn engagement_count(&self) -> usize {
        self.engagements.len()
    }

    /// Open the discovery subscription. No-op when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.subscription = Some(self.discovery.open(self.snapshots_tx.clone()));
        info!("dispatcher started");
    }

    /// Cancel every engagement, clear all state, and close the subscription.
    /// No-op when already idle.
    pub fn stop(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };

        for engagement in self.engagements.values() {
            engagement.cancel();
        }
        let drained = self.engagements.len() as u64;
        self.metrics.inc_engagements_canceled(drained);
        self.engagements.clear();
        self.people.clear();

        subscription.invalidate();
        info!(drained, "dispatcher stopped");
    }

    /// Drive the dispatcher until `shutdown` resolves.
    ///
    /// This loop is the controller's single execution context: snapshot
    /// deliveries, operation signals, and retry firings are all handled here,
    /// one at a time.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    debug!("dispatcher received shutdown signal");
                    break;
                }
                Some(snapshot) = self.snapshots_rx.recv() => self.handle_snapshot(snapshot),
                Some(signal) = self.signals_rx.recv() => self.handle_operation_signal(signal),
                Some(firing) = self.retry_rx.recv() => self.handle_retry_elapsed(firing),
                else => break,
            }
        }
        self.stop();
    }

    /// Reconcile one full visible-peer snapshot against the engagement table.
    fn handle_snapshot(&mut self, snapshot: Snapshot) {
        if !self.is_running() {
            trace!("snapshot delivered after stop, ignoring");
            return;
        }

        let mut fresh: HashMap<PeerId, Peer> = HashMap::with_capacity(snapshot.len());
        for peer in snapshot {
            // Engagement membership guards against double-starting a peer
            // that is mid-cooldown, even if it briefly left the known set.
            let aware =
                self.people.contains_key(peer.id()) || self.engagements.contains_key(peer.id());
            if !aware && (self.should_approach)(&peer) {
                self.start_operation(peer.clone());
            }
            fresh.insert(peer.id().clone(), peer);
        }

        let vanished: Vec<PeerId> = self
            .people
            .keys()
            .filter(|id| !fresh.contains_key(*id))
            .cloned()
            .collect();
        for id in &vanished {
            if let Some(engagement) = self.engagements.remove(id) {
                engagement.cancel();
                self.metrics.inc_engagements_canceled(1);
                debug!(peer = %id, "peer vanished, engagement canceled");
            }
        }

        self.people = fresh;
        trace!(
            known = self.people.len(),
            engaged = self.engagements.len(),
            "snapshot reconciled"
        );
    }

    /// Create, associate, and resume a send operation for `peer`, recording it
    /// as this peer's engagement. Callers guarantee no engagement exists.
    fn start_operation(&mut self, peer: Peer) {
        let payload = match (self.payload_override)(&peer) {
            Some(path) => Payload::file(path),
            None => {
                let mut payload = Payload::file(self.config.payload.clone());
                match FileIcon::prepare(&self.config.payload) {
                    Ok(icon) => payload = payload.with_icon(icon),
                    Err(err) => {
                        debug!(peer = %peer.id(), %err, "icon preparation failed, sending without icon");
                    }
                }
                payload
            }
        };

        let operation = self.transfer.create(peer.clone(), payload);
        operation.resume();
        self.metrics.inc_operations_started();
        debug!(peer = %peer.id(), id = %operation.id(), "send operation started");
        self.engagements
            .insert(peer.id().clone(), Engagement::InFlight(operation));
    }

    /// React to one operation lifecycle signal.
    ///
    /// Signals that do not match the peer's current in-flight operation are
    /// stale (the operation was canceled or already replaced) and are dropped;
    /// in particular a `Canceled` echo for a vanished peer must not resurrect
    /// it with a retry.
    fn handle_operation_signal(&mut self, signal: OperationSignal) {
        let OperationSignal { id, peer, event } = signal;

        let current = match self.engagements.get(&peer) {
            Some(Engagement::InFlight(operation)) => operation.id() == id,
            _ => false,
        };
        if !current {
            trace!(%id, peer = %peer, ?event, "signal for untracked operation ignored");
            return;
        }

        match event {
            OperationEvent::AskUser => {
                // The consent prompt stalls the operation until it is
                // explicitly resumed again.
                if let Some(Engagement::InFlight(operation)) = self.engagements.get(&peer) {
                    operation.resume();
                }
                self.metrics.inc_operation_resumes();
                debug!(%id, peer = %peer, "consent prompt surfaced, operation resumed");
            }
            event if event.is_terminal() => {
                let Some(descriptor) = self.people.get(&peer).cloned() else {
                    trace!(peer = %peer, "terminal signal for unknown peer ignored");
                    return;
                };
                debug!(%id, peer = %peer, ?event, "operation ended, scheduling re-attempt");
                self.schedule_retry(descriptor);
            }
            _ => {}
        }
    }

    /// Replace the peer's engagement with a cancelable delayed re-attempt.
    fn schedule_retry(&mut self, peer: Peer) {
        self.next_retry_seq += 1;
        let seq = self.next_retry_seq;
        let delay = self.config.recharge;
        let retry_tx = self.retry_tx.clone();
        let descriptor = peer.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = retry_tx.send(RetryFiring {
                peer: descriptor,
                seq,
            });
        });

        self.metrics.inc_retries_scheduled();
        trace!(peer = %peer.id(), ?delay, seq, "re-attempt scheduled");
        self.engagements.insert(
            peer.id().clone(),
            Engagement::Scheduled(RetryHandle::new(seq, task.abort_handle())),
        );
    }

    /// A scheduled re-attempt elapsed. Start over unless the entry was
    /// replaced or removed since scheduling.
    fn handle_retry_elapsed(&mut self, firing: RetryFiring) {
        let still_scheduled = matches!(
            self.engagements.get(firing.peer.id()),
            Some(Engagement::Scheduled(handle)) if handle.seq() == firing.seq
        );
        if !still_scheduled {
            trace!(peer = %firing.peer.id(), seq = firing.seq, "stale retry firing ignored");
            return;
        }

        self.engagements.remove(firing.peer.id());
        self.start_operation(firing.peer);
    }
}

impl<D: DiscoveryService, T: TransferService> Drop for Dispatcher<D, T> {
    fn drop(&mut self) {
        // No engagement may outlive the controller.
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use nearcast_discovery::MemoryDiscovery;
    use nearcast_transfer::{signal_channel, MemoryOperation, MemoryTransfer};

    use super::*;

    fn peer(token: &str) -> Peer {
        Peer::new(token, token.to_ascii_uppercase())
    }

    struct Fixture {
        dispatcher: Dispatcher<MemoryDiscovery, MemoryTransfer>,
        discovery: MemoryDiscovery,
        transfer: MemoryTransfer,
    }

    fn fixture(recharge: Duration) -> Fixture {
        let discovery = MemoryDiscovery::new();
        let (signal_tx, signal_rx) = signal_channel();
        let transfer = MemoryTransfer::new(signal_tx);
        let mut config = DispatcherConfig::new("/nonexistent/payload.jpg");
        config.recharge = recharge;
        let mut dispatcher =
            Dispatcher::new(discovery.clone(), transfer.clone(), config, signal_rx);
        dispatcher.start();
        Fixture {
            dispatcher,
            discovery,
            transfer,
        }
    }

    impl Fixture {
        /// Feed queued lifecycle signals through the controller, as the run
        /// loop would.
        fn pump_signals(&mut self) {
            while let Ok(signal) = self.dispatcher.signals_rx.try_recv() {
                self.dispatcher.handle_operation_signal(signal);
            }
        }

        /// Feed queued retry firings through the controller.
        fn pump_retries(&mut self) {
            while let Ok(firing) = self.dispatcher.retry_rx.try_recv() {
                self.dispatcher.handle_retry_elapsed(firing);
            }
        }

        fn operation_for(&self, token: &str) -> MemoryOperation {
            self.transfer
                .operations()
                .into_iter()
                .find(|op| op.peer().as_str() == token)
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_snapshot_starts_operations_for_new_peers() {
        let mut fx = fixture(Duration::from_secs(5));

        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);

        assert_eq!(fx.transfer.operation_count(), 2);
        assert_eq!(fx.dispatcher.engagement_count(), 2);
        assert_eq!(fx.dispatcher.known_peer_count(), 2);
        assert_eq!(fx.operation_for("a").resume_count(), 1);
        assert_eq!(fx.operation_for("b").resume_count(), 1);
    }

    #[tokio::test]
    async fn test_reconciliation_is_idempotent() {
        let mut fx = fixture(Duration::from_secs(5));

        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);
        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);

        assert_eq!(fx.transfer.operation_count(), 2);
        assert_eq!(fx.operation_for("a").cancel_count(), 0);
        assert_eq!(fx.operation_for("b").cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_vanished_peer_has_operation_canceled() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);

        fx.dispatcher.handle_snapshot(vec![peer("b")]);

        assert_eq!(fx.operation_for("a").cancel_count(), 1);
        assert_eq!(fx.dispatcher.engagement_count(), 1);
        assert_eq!(fx.dispatcher.known_peer_count(), 1);
        assert!(fx.dispatcher.people.contains_key(&PeerId::new("b")));
    }

    #[tokio::test]
    async fn test_rejected_peer_is_never_engaged() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.set_should_approach(|_| false);

        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        fx.dispatcher.handle_snapshot(vec![peer("a")]);

        assert_eq!(fx.transfer.operation_count(), 0);
        assert_eq!(fx.dispatcher.engagement_count(), 0);
        // The peer is still tracked as known.
        assert_eq!(fx.dispatcher.known_peer_count(), 1);
    }

    #[tokio::test]
    async fn test_changed_policy_applies_after_reappearance() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.set_should_approach(|_| false);
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        assert_eq!(fx.transfer.operation_count(), 0);

        fx.dispatcher.set_should_approach(|_| true);
        // Still known from the previous snapshot: not re-evaluated.
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        assert_eq!(fx.transfer.operation_count(), 0);

        // Vanish and reappear: evaluated afresh.
        fx.dispatcher.handle_snapshot(vec![]);
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        assert_eq!(fx.transfer.operation_count(), 1);
    }

    #[tokio::test]
    async fn test_ask_user_resumes_the_same_operation() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        let op = fx.operation_for("a");
        assert_eq!(op.resume_count(), 1);

        op.emit(OperationEvent::AskUser);
        fx.pump_signals();

        assert_eq!(op.resume_count(), 2);
        assert_matches!(
            fx.dispatcher.engagements.get(&PeerId::new("a")),
            Some(Engagement::InFlight(current)) if current.id() == op.id()
        );
    }

    #[tokio::test]
    async fn test_non_actionable_events_are_ignored() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        let op = fx.operation_for("a");

        op.emit(OperationEvent::Connecting);
        op.emit(OperationEvent::Started);
        op.emit(OperationEvent::Progress);
        fx.pump_signals();

        assert_eq!(op.resume_count(), 1);
        assert_eq!(fx.transfer.operation_count(), 1);
        assert_matches!(
            fx.dispatcher.engagements.get(&PeerId::new("a")),
            Some(Engagement::InFlight(_))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_event_schedules_and_fires_retry() {
        for terminal in [
            OperationEvent::Finished,
            OperationEvent::Canceled,
            OperationEvent::ErrorOccurred,
        ] {
            let mut fx = fixture(Duration::from_secs(5));
            fx.dispatcher.handle_snapshot(vec![peer("a")]);
            let op = fx.operation_for("a");

            op.emit(terminal);
            fx.pump_signals();
            assert_matches!(
                fx.dispatcher.engagements.get(&PeerId::new("a")),
                Some(Engagement::Scheduled(_)),
                "terminal {terminal:?} should schedule a re-attempt"
            );

            tokio::time::sleep(Duration::from_secs(6)).await;
            fx.pump_retries();

            assert_eq!(fx.transfer.operation_count(), 2);
            assert_matches!(
                fx.dispatcher.engagements.get(&PeerId::new("a")),
                Some(Engagement::InFlight(_))
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_out_the_recharge() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        fx.operation_for("a").emit(OperationEvent::Finished);
        fx.pump_signals();

        tokio::time::sleep(Duration::from_secs(3)).await;
        fx.pump_retries();
        assert_eq!(fx.transfer.operation_count(), 1, "retry fired early");

        tokio::time::sleep(Duration::from_secs(3)).await;
        fx.pump_retries();
        assert_eq!(fx.transfer.operation_count(), 2);
    }

    #[tokio::test]
    async fn test_reappearance_during_cooldown_does_not_double_start() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        fx.operation_for("a").emit(OperationEvent::Finished);
        fx.pump_signals();

        // Peer keeps showing up in snapshots while cooling down.
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        fx.dispatcher.handle_snapshot(vec![peer("a")]);

        assert_eq!(fx.transfer.operation_count(), 1);
        assert_eq!(fx.dispatcher.engagement_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanish_during_cooldown_cancels_retry() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);
        fx.operation_for("a").emit(OperationEvent::Finished);
        fx.pump_signals();
        assert_matches!(
            fx.dispatcher.engagements.get(&PeerId::new("a")),
            Some(Engagement::Scheduled(_))
        );

        // A vanishes mid-cooldown.
        fx.dispatcher.handle_snapshot(vec![peer("b")]);
        assert_eq!(fx.dispatcher.engagement_count(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        fx.pump_retries();

        // No re-attempt for A; B is untouched.
        assert_eq!(fx.transfer.operation_count(), 2);
        assert_eq!(fx.operation_for("b").resume_count(), 1);
        assert_eq!(fx.operation_for("b").cancel_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_cancel_echo_does_not_resurrect_peer() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a")]);
        let op = fx.operation_for("a");

        // Vanish: the controller cancels and forgets the operation.
        fx.dispatcher.handle_snapshot(vec![]);
        assert_eq!(op.cancel_count(), 1);

        // The transfer service still echoes the cancellation.
        op.emit(OperationEvent::Canceled);
        fx.pump_signals();

        assert_eq!(fx.dispatcher.engagement_count(), 0);
        assert_eq!(fx.transfer.operation_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drains_everything() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.handle_snapshot(vec![peer("a"), peer("b")]);
        fx.operation_for("b").emit(OperationEvent::Finished);
        fx.pump_signals();

        fx.dispatcher.stop();

        assert!(!fx.dispatcher.is_running());
        assert_eq!(fx.dispatcher.engagement_count(), 0);
        assert_eq!(fx.dispatcher.known_peer_count(), 0);
        assert_eq!(fx.discovery.subscription_count(), 0);
        // The in-flight operation was canceled exactly once.
        assert_eq!(fx.operation_for("a").cancel_count(), 1);

        // The pending retry was canceled too: nothing fires later.
        tokio::time::sleep(Duration::from_secs(10)).await;
        fx.pump_retries();
        assert_eq!(fx.transfer.operation_count(), 2);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher.start();
        assert_eq!(fx.discovery.subscription_count(), 1);

        fx.dispatcher.stop();
        fx.dispatcher.stop();
        assert!(!fx.dispatcher.is_running());

        fx.dispatcher.start();
        assert!(fx.dispatcher.is_running());
        assert_eq!(fx.discovery.subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_payload_override_skips_icon() {
        let mut fx = fixture(Duration::from_secs(5));
        fx.dispatcher
            .set_payload_override(|p| (p.id().as_str() == "a").then(|| "/custom/a.bin".into()));

        fx.dispatcher.handle_snapshot(vec![peer("a")]);

        let payload = fx.operation_for("a").payload().clone();
        assert_eq!(payload.items, vec![PathBuf::from("/custom/a.bin")]);
        assert!(payload.icon.is_none());
    }

    #[tokio::test]
    async fn test_default_payload_carries_icon_when_decodable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let discovery = MemoryDiscovery::new();
        let (signal_tx, signal_rx) = signal_channel();
        let transfer = MemoryTransfer::new(signal_tx);
        let config = DispatcherConfig::new(file.path());
        let mut dispatcher =
            Dispatcher::new(discovery.clone(), transfer.clone(), config, signal_rx);
        dispatcher.start();

        dispatcher.handle_snapshot(vec![peer("a")]);

        let payload = transfer.last_operation().unwrap().payload().clone();
        assert!(payload.icon.is_some());
    }

    #[tokio::test]
    async fn test_undecodable_payload_sends_without_icon() {
        let mut fx = fixture(Duration::from_secs(5));

        // The fixture payload path does not exist.
        fx.dispatcher.handle_snapshot(vec![peer("a")]);

        assert!(fx.operation_for("a").payload().icon.is_none());
        assert_eq!(fx.transfer.operation_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_end_to_end() {
        let discovery = MemoryDiscovery::new();
        let (signal_tx, signal_rx) = signal_channel();
        let transfer = MemoryTransfer::auto_completing(signal_tx, Duration::from_secs(1));
        let mut config = DispatcherConfig::new("/nonexistent/payload.jpg");
        config.recharge = Duration::from_secs(5);
        let mut dispatcher =
            Dispatcher::new(discovery.clone(), transfer.clone(), config, signal_rx);
        dispatcher.start();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let driver = async {
            discovery.announce(vec![peer("a"), peer("b")]);
            tokio::time::sleep(Duration::from_secs(3)).await;
            // A finished at t=1 and is cooling down; now it vanishes.
            discovery.announce(vec![peer("b")]);
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = stop_tx.send(());
        };

        tokio::join!(
            dispatcher.run(async {
                let _ = stop_rx.await;
            }),
            driver
        );

        let ops_for = |token: &str| {
            transfer
                .operations()
                .into_iter()
                .filter(|op| op.peer().as_str() == token)
                .count()
        };
        // A was approached once and never retried after vanishing.
        assert_eq!(ops_for("a"), 1);
        // B kept cycling through finish/recharge/retry.
        assert!(ops_for("b") >= 2);
        assert!(!dispatcher.is_running());
        assert_eq!(dispatcher.engagement_count(), 0);
    }
}
