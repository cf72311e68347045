use std::sync::OnceLock;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload. Safe to call more than once; the
/// recorder is installed on the first call only.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            // Pre-register counters so they appear even before the first increment.
            counter!("trades_created_total").absolute(0);
            counter!("trades_imported_total").absolute(0);
            counter!("import_issues_total").absolute(0);
            counter!("imports_failed_total").absolute(0);
            counter!("reasoning_requests_total").absolute(0);
            counter!("reasoning_failures_total").absolute(0);

            // Histogram is lazily created on first record; force creation.
            histogram!("reasoning_latency_seconds").record(0.0);

            handle
        })
        .clone()
}
