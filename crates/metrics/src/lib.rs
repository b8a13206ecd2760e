//! Metrics and tracing setup for recordbase clients.
//!
//! Provides a global [`ClientMetrics`] singleton backed by the `prometheus`
//! crate. Callers that already run a Prometheus endpoint can merge
//! [`ClientMetrics::registry`] into theirs or scrape [`encode_metrics`].

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// ────────────────────────── Tracing ──────────────────────────

/// Initialize the tracing subscriber with env-filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

// ────────────────────────── Prometheus metrics ──────────────────────────

/// Global metrics instance.
static METRICS: OnceLock<ClientMetrics> = OnceLock::new();

/// Retrieve (or lazily create) the global metrics singleton.
pub fn metrics() -> &'static ClientMetrics {
    METRICS.get_or_init(ClientMetrics::new)
}

/// All Prometheus metrics for a recordbase client process.
pub struct ClientMetrics {
    pub registry: Registry,

    // ── RPC counters ──
    pub rpcs_sent: IntCounter,
    pub rpcs_sent_by_type: IntCounterVec,
    /// Failed calls, by `rpc_type` and failure `kind`.
    pub rpc_failures: IntCounterVec,

    /// Gets that found no record and returned an empty entry.
    pub not_found: IntCounter,

    // ── RPC latency ──
    pub rpc_latency_secs: HistogramVec,
}

// Manual Debug impl because prometheus types don't derive Debug.
impl std::fmt::Debug for ClientMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientMetrics").finish_non_exhaustive()
    }
}

/// Default histogram buckets (seconds) for RPC latency.
const LATENCY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

impl ClientMetrics {
    fn new() -> Self {
        let registry = Registry::new();

        let rpcs_sent = IntCounter::with_opts(Opts::new(
            "recordbase_rpcs_sent_total",
            "Total RPCs issued to the record store",
        ))
        .expect("rpcs_sent counter");

        let rpcs_sent_by_type = IntCounterVec::new(
            Opts::new(
                "recordbase_rpcs_sent_by_type_total",
                "RPCs issued to the record store, by type",
            ),
            &["rpc_type"],
        )
        .expect("rpcs_sent_by_type counter vec");

        let rpc_failures = IntCounterVec::new(
            Opts::new(
                "recordbase_rpc_failures_total",
                "Failed record store calls, by type and failure kind",
            ),
            &["rpc_type", "kind"],
        )
        .expect("rpc_failures counter vec");

        let not_found = IntCounter::with_opts(Opts::new(
            "recordbase_not_found_total",
            "Gets answered with an empty entry because the record does not exist",
        ))
        .expect("not_found counter");

        let rpc_latency_secs = HistogramVec::new(
            HistogramOpts::new("recordbase_rpc_latency_seconds", "RPC latency in seconds")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["rpc_type"],
        )
        .expect("rpc_latency_secs histogram");

        // Register all metrics
        registry
            .register(Box::new(rpcs_sent.clone()))
            .expect("register rpcs_sent");
        registry
            .register(Box::new(rpcs_sent_by_type.clone()))
            .expect("register rpcs_sent_by_type");
        registry
            .register(Box::new(rpc_failures.clone()))
            .expect("register rpc_failures");
        registry
            .register(Box::new(not_found.clone()))
            .expect("register not_found");
        registry
            .register(Box::new(rpc_latency_secs.clone()))
            .expect("register rpc_latency_secs");

        Self {
            registry,
            rpcs_sent,
            rpcs_sent_by_type,
            rpc_failures,
            not_found,
            rpc_latency_secs,
        }
    }
}

/// Encode all registered metrics in Prometheus text exposition format.
pub fn encode_metrics() -> String {
    let m = metrics();
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder
        .encode(&m.registry.gather(), &mut buf)
        .expect("prometheus text encoding");
    String::from_utf8(buf).expect("prometheus output is valid UTF-8")
}

/// Helper: count an outgoing RPC and start its latency timer. The
/// returned guard records elapsed time on drop.
pub fn start_rpc(rpc_type: &str) -> prometheus::HistogramTimer {
    let m = metrics();
    m.rpcs_sent.inc();
    m.rpcs_sent_by_type.with_label_values(&[rpc_type]).inc();
    m.rpc_latency_secs
        .with_label_values(&[rpc_type])
        .start_timer()
}

/// Helper: record a failed RPC.
pub fn record_failure(rpc_type: &str, kind: &str) {
    metrics()
        .rpc_failures
        .with_label_values(&[rpc_type, kind])
        .inc();
}

// ────────────────────────── Tests ──────────────────────────
