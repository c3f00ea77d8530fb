//! Prometheus metrics for the vehicle-link core.
//!
//! All metrics follow the naming convention: `vl_<metric>_<unit>`
//!
//! - **Counter**: dispatch outcomes, malformed input, timeouts
//! - **Gauge**: requests currently awaiting a reply
//! - **Histogram**: time spent dispatching one inbound message

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use std::sync::{Arc, OnceLock};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Inbound messages by classified kind
    pub static ref MESSAGES_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("vl_messages_dispatched_total", "Inbound messages by kind"),
        &["kind"]  // request, notification, response, error_response
    ).expect("metric creation failed");

    /// Frames that did not decode into a message
    pub static ref MESSAGES_MALFORMED: IntCounter = IntCounter::new(
        "vl_messages_malformed_total",
        "Inbound frames rejected as malformed"
    ).expect("metric creation failed");

    /// Requests and notifications with no command and no owning module
    pub static ref UNKNOWN_FUNCTIONS: IntCounter = IntCounter::new(
        "vl_unknown_functions_total",
        "Messages naming a function nobody handles"
    ).expect("metric creation failed");

    /// Replies that matched no subscription
    pub static ref UNMATCHED_EVENTS: IntCounter = IntCounter::new(
        "vl_unmatched_events_total",
        "Replies raised with no matching subscriber"
    ).expect("metric creation failed");

    /// Requests expired by the sweeper
    pub static ref REQUEST_TIMEOUTS: IntCounter = IntCounter::new(
        "vl_request_timeouts_total",
        "Requests that reached their deadline without a reply"
    ).expect("metric creation failed");

    /// Outbound sends that failed
    pub static ref TRANSPORT_FAILURES: IntCounter = IntCounter::new(
        "vl_transport_failures_total",
        "Bus connections that failed to open or were lost"
    ).expect("metric creation failed");

    /// Requests currently awaiting a reply
    pub static ref PENDING_REQUESTS: IntGauge = IntGauge::new(
        "vl_pending_requests",
        "Requests registered with the request controller"
    ).expect("metric creation failed");

    /// Dispatch duration histogram
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "vl_dispatch_duration_seconds",
            "Time spent dispatching one inbound message"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("bucket layout"))
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Handle to the registry the metrics were registered into.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    /// Render every registered metric in Prometheus text format.
    pub fn render(&self) -> Result<String, TelemetryError> {
        encode_registry(&self.registry)
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; later calls return a handle to the same
/// registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let outcome = REGISTERED.get_or_init(|| {
        let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(MESSAGES_DISPATCHED.clone()),
            Box::new(MESSAGES_MALFORMED.clone()),
            Box::new(UNKNOWN_FUNCTIONS.clone()),
            Box::new(UNMATCHED_EVENTS.clone()),
            Box::new(REQUEST_TIMEOUTS.clone()),
            Box::new(TRANSPORT_FAILURES.clone()),
            Box::new(PENDING_REQUESTS.clone()),
            Box::new(DISPATCH_DURATION.clone()),
        ];
        for metric in metrics {
            REGISTRY.register(metric).map_err(|e| e.to_string())?;
        }
        Ok(())
    });

    outcome.clone().map_err(TelemetryError::MetricsInit)?;
    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    encode_registry(&REGISTRY)
}

fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
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
