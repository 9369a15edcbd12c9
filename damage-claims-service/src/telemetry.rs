use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_LATENCY_MS: &str = "http_request_latency_ms";
pub const PREDICTION_REQUESTS_TOTAL: &str = "prediction_requests_total";
pub const PREDICTION_LATENCY_MS: &str = "prediction_latency_ms";
pub const ASSISTANT_REQUESTS_TOTAL: &str = "assistant_requests_total";
pub const ASSISTANT_FAILURES_TOTAL: &str = "assistant_failures_total";
pub const ASSISTANT_FALLBACK_TOTAL: &str = "assistant_fallback_total";
pub const ASSISTANT_LATENCY_MS: &str = "assistant_latency_ms";
pub const CIRCUIT_STATE: &str = "circuit_state";

/// Install the Prometheus recorder and describe the exported metric set.
/// The failure/fallback counters and the circuit gauge are emitted by the
/// claim-core gateway under the same names.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(HTTP_REQUEST_LATENCY_MS, "HTTP request latency in ms");
    describe_counter!(PREDICTION_REQUESTS_TOTAL, "Total prediction requests");
    describe_histogram!(PREDICTION_LATENCY_MS, "Prediction latency in ms");
    describe_counter!(ASSISTANT_REQUESTS_TOTAL, "Total assistant requests");
    describe_counter!(ASSISTANT_FAILURES_TOTAL, "Total assistant backend failures");
    describe_counter!(ASSISTANT_FALLBACK_TOTAL, "Total assistant fallback responses");
    describe_histogram!(ASSISTANT_LATENCY_MS, "Assistant response latency in ms");
    describe_gauge!(CIRCUIT_STATE, "Circuit breaker state (0=closed, 1=open)");

    Ok(handle)
}
