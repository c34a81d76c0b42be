use crate::cli::ServeArgs;
use crate::infra::{AppState, BackendMode};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use community_portal::backend::{InMemoryBackend, RestBackend};
use community_portal::community::Portal;
use community_portal::config::AppConfig;
use community_portal::error::AppError;
use community_portal::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (routes, mode) = match (&config.backend.url, &config.backend.anon_key) {
        (Some(url), Some(anon_key)) => {
            let backend = Arc::new(RestBackend::new(
                url.as_str(),
                anon_key.as_str(),
                config.backend.timeout,
            )?);
            let portal = Portal::new(backend, &config.portal);
            (with_portal_routes(&portal), BackendMode::Remote)
        }
        _ => {
            warn!("BACKEND_URL is not set; serving from the in-memory backend");
            let portal = Portal::new(Arc::new(InMemoryBackend::new()), &config.portal);
            (with_portal_routes(&portal), BackendMode::InMemory)
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        backend: mode,
    };

    let app = routes.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = mode.label(), "community portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
