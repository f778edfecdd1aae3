use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("engine_metrics_reads_total").absolute(0);
    counter!("settlements_total", "outcome" => "success").absolute(0);
    counter!("settlements_total", "outcome" => "failure").absolute(0);

    gauge!("active_sessions").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("settlement_latency_seconds").record(0.0);

    handle
}

/// A handle backed by a recorder that is not installed globally. Lets tests
/// and embedders build an `AppState` without touching process-wide state.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
