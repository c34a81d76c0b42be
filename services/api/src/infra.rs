use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Shared state for the operational endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) backend: BackendMode,
}

/// Which platform the portal routes are talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackendMode {
    Remote,
    InMemory,
}

impl BackendMode {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            BackendMode::Remote => "remote",
            BackendMode::InMemory => "in-memory",
        }
    }
}
