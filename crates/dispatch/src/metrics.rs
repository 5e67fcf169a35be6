//! Dispatcher metrics.

use metrics::Counter;

/// Counters for the dispatcher's scheduling decisions.
#[derive(Clone, Debug)]
pub(crate) struct DispatcherMetrics {
    /// Number of send operations started.
    operations_started_total: Counter,
    /// Number of re-resumes issued in response to consent prompts.
    operation_resumes_total: Counter,
    /// Number of delayed re-attempts scheduled.
    retries_scheduled_total: Counter,
    /// Number of engagements canceled (vanished peers and controller stop).
    engagements_canceled_total: Counter,
}

impl Default for DispatcherMetrics {
    fn default() -> Self {
        Self {
            operations_started_total: metrics::counter!("dispatch.operations_started_total"),
            operation_resumes_total: metrics::counter!("dispatch.operation_resumes_total"),
            retries_scheduled_total: metrics::counter!("dispatch.retries_scheduled_total"),
            engagements_canceled_total: metrics::counter!("dispatch.engagements_canceled_total"),
        }
    }
}

impl DispatcherMetrics {
    pub(crate) fn inc_operations_started(&self) {
        self.operations_started_total.increment(1);
    }

    pub(crate) fn inc_operation_resumes(&self) {
        self.operation_resumes_total.increment(1);
    }

    pub(crate) fn inc_retries_scheduled(&self) {
        self.retries_scheduled_total.increment(1);
    }

    pub(crate) fn inc_engagements_canceled(&self, count: u64) {
        self.engagements_canceled_total.increment(count);
    }
}
