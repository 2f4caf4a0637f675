//! Process-wide Prometheus registry for service operation counters.

use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static OPERATIONS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    let opts = Opts::new("erp_service_operations_total", "Service operations by entity and outcome");
    let counter = IntCounterVec::new(opts, &["entity", "operation", "outcome"]).ok()?;
    match REGISTRY.register(Box::new(counter.clone())) {
        Ok(()) => Some(counter),
        Err(e) => {
            warn!(error = %e, "failed to register operations counter");
            None
        }
    }
});

/// Count one service operation.
pub fn record_operation(entity: &str, operation: &str, ok: bool) {
    if let Some(counter) = OPERATIONS.as_ref() {
        let outcome = if ok { "ok" } else { "error" };
        counter.with_label_values(&[entity, operation, outcome]).inc();
    }
}

/// Current value of a counter, mostly for assertions.
pub fn operation_count(entity: &str, operation: &str, ok: bool) -> u64 {
    let outcome = if ok { "ok" } else { "error" };
    OPERATIONS
        .as_ref()
        .map(|c| c.with_label_values(&[entity, operation, outcome]).get())
        .unwrap_or(0)
}

/// Text exposition of the registry, shaped for `admin_http::spawn_admin_server`.
pub fn render() -> (StatusCode, String) {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
    match String::from_utf8(buf) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_rendered() {
        record_operation("widget", "create", true);
        record_operation("widget", "create", true);
        assert!(operation_count("widget", "create", true) >= 2);
        let (status, body) = render();
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("erp_service_operations_total"));
    }
}
