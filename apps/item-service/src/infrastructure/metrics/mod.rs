//! Prometheus Metrics Module
//!
//! Counts resource operations by name and outcome. Rendered at `/metrics`
//! on the HTTP router when a recorder has been installed.
//!
//! Recording before [`init_metrics`] is a no-op, so library code and tests
//! can call the `record_*` helpers unconditionally.

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Counter of resource operations.
pub const OPERATIONS_TOTAL: &str = "item_service_operations_total";

/// Install the Prometheus recorder.
///
/// Subsequent calls return the handle from the first successful install.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_counter!(
        OPERATIONS_TOTAL,
        "Resource operations by operation name and outcome"
    );

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

/// Record the outcome of one resource operation.
///
/// `outcome` is `"ok"` or an error reason such as `"NOT_FOUND"`.
pub fn record_operation(operation: &'static str, outcome: &'static str) {
    counter!(
        OPERATIONS_TOTAL,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
