//! Prometheus metrics for the coordinator.
//!
//! All metrics follow the naming convention: `oc_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // AGREEMENT REGISTRY
    // =========================================================================

    /// Agreements stored
    pub static ref AGREEMENTS_REGISTERED: Counter = Counter::new(
        "oc_registry_agreements_registered_total",
        "Total number of service agreements stored"
    ).expect("metric creation failed");

    /// Agreements rejected
    pub static ref AGREEMENTS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("oc_registry_agreements_rejected_total", "Rejected service agreements"),
        &["category"]  // validation/authorization/state_conflict/accounting
    ).expect("metric creation failed");

    // =========================================================================
    // REQUEST LIFECYCLE
    // =========================================================================

    /// Requests opened
    pub static ref REQUESTS_OPENED: CounterVec = CounterVec::new(
        Opts::new("oc_lifecycle_requests_opened_total", "Oracle requests opened"),
        &["funding"]  // transfer/prepaid
    ).expect("metric creation failed");

    /// Reports accepted
    pub static ref REPORTS_ACCEPTED: Counter = Counter::new(
        "oc_lifecycle_reports_accepted_total",
        "Node reports accepted"
    ).expect("metric creation failed");

    /// Reports rejected
    pub static ref REPORTS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("oc_lifecycle_reports_rejected_total", "Node reports rejected"),
        &["reason"]  // error category
    ).expect("metric creation failed");

    /// Requests fulfilled
    pub static ref REQUESTS_FULFILLED: Counter = Counter::new(
        "oc_lifecycle_requests_fulfilled_total",
        "Oracle requests fulfilled"
    ).expect("metric creation failed");

    /// Time spent on the report critical section
    pub static ref FULFILLMENT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "oc_lifecycle_report_duration_seconds",
            "Time spent staging, settling and committing a report"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CALLBACKS
    // =========================================================================

    /// Consumer callbacks that did not complete
    pub static ref CALLBACK_FAILURES: CounterVec = CounterVec::new(
        Opts::new("oc_callback_failures_total", "Consumer callbacks that failed"),
        &["kind"]  // reverted/panicked/timed_out/missing
    ).expect("metric creation failed");

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Node payouts credited
    pub static ref PAYOUTS: Counter = Counter::new(
        "oc_settlement_payouts_total",
        "Node payouts credited to withdrawable balances"
    ).expect("metric creation failed");

    /// Withdrawals by outcome
    pub static ref WITHDRAWALS: CounterVec = CounterVec::new(
        Opts::new("oc_settlement_withdrawals_total", "Withdrawals attempted"),
        &["outcome"]  // success/rejected/failed/timed_out
    ).expect("metric creation failed");

    /// Inbound token transfers by instruction and outcome
    pub static ref INBOUND_TRANSFERS: CounterVec = CounterVec::new(
        Opts::new("oc_settlement_inbound_transfers_total", "Token transfers received"),
        &["instruction", "outcome"]  // request/deposit/invalid, accepted/rejected
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already-registered metrics are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Registry
        Box::new(AGREEMENTS_REGISTERED.clone()),
        Box::new(AGREEMENTS_REJECTED.clone()),
        // Lifecycle
        Box::new(REQUESTS_OPENED.clone()),
        Box::new(REPORTS_ACCEPTED.clone()),
        Box::new(REPORTS_REJECTED.clone()),
        Box::new(REQUESTS_FULFILLED.clone()),
        Box::new(FULFILLMENT_DURATION.clone()),
        // Callbacks
        Box::new(CALLBACK_FAILURES.clone()),
        // Settlement
        Box::new(PAYOUTS.clone()),
        Box::new(WITHDRAWALS.clone()),
        Box::new(INBOUND_TRANSFERS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
